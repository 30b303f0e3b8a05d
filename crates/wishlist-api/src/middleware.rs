use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

/// Header carrying the caller's opaque user id, as supplied by the front-end.
pub const USER_HEADER: &str = "x-wishlist-user";

/// The user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Extract the user id from `X-Wishlist-User`. No verification happens here:
/// the front-end is trusted to pass its own user's identifier.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    req.extensions_mut().insert(UserId(user));
    Ok(next.run(req).await)
}
