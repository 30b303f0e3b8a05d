pub mod bookings;
pub mod middleware;
pub mod relations;
pub mod sessions;
pub mod wishes;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, patch, post},
};
use tracing::error;
use wishlist_db::{DbError, DbResult, Registry};

use crate::middleware::require_user;
use crate::sessions::Sessions;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub registry: Registry,
    pub sessions: Sessions,
}

impl AppStateInner {
    pub fn new(registry: Registry) -> AppState {
        Arc::new(Self {
            registry,
            sessions: Sessions::default(),
        })
    }
}

/// Every route the front-end talks to. Routes acting for a user sit behind
/// `require_user`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/wishes", post(wishes::create_wish))
        .route("/wishes/{wish_id}", get(wishes::get_wish))
        .route("/creators/{creator}/wishes", get(wishes::list_wishes))
        .route("/creators/{creator}/wishes/booked", get(wishes::list_booked))
        .route("/creators/{creator}/wishes/available", get(wishes::list_available))
        .route("/presenters/{presenter}/bookings", get(bookings::list_for_presenter))
        .route("/relations", post(relations::add_relation))
        .with_state(state.clone());

    let user_routes = Router::new()
        .route("/wishes/{wish_id}/book", post(bookings::book))
        .route(
            "/session",
            post(sessions::start).get(sessions::current).delete(sessions::end),
        )
        .route("/session/draft", patch(sessions::update_draft))
        .route("/session/draft/submit", post(sessions::submit_draft))
        .route("/session/view", post(sessions::view))
        .route("/session/book", post(sessions::book_viewed))
        .layer(from_fn(require_user))
        .with_state(state);

    Router::new().merge(public_routes).merge(user_routes)
}

/// Run a repository call off the async runtime. The outer error is a join
/// failure; the inner result is handed back untouched so callers can tell
/// booking outcomes apart.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<DbResult<T>, StatusCode>
where
    F: FnOnce(&Registry) -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    let registry = state.registry.clone();
    tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

pub(crate) fn status_for(err: &DbError) -> StatusCode {
    match err {
        DbError::NotFound(_) => StatusCode::NOT_FOUND,
        DbError::AlreadyBooked(_) => StatusCode::CONFLICT,
        DbError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DbError::Sqlite(_) | DbError::InvalidStoredValue(_) | DbError::LockPoisoned(_) => {
            error!("storage error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
