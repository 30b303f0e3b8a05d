use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use wishlist_types::api::{CreateWishResponse, WishListResponse};
use wishlist_types::models::NewWish;

use crate::{AppState, run_blocking, status_for};

pub async fn create_wish(
    State(state): State<AppState>,
    Json(req): Json<NewWish>,
) -> Result<impl IntoResponse, StatusCode> {
    let wish_id = run_blocking(&state, move |r| r.wishes.create(&req))
        .await?
        .map_err(|e| status_for(&e))?;

    Ok((StatusCode::CREATED, Json(CreateWishResponse { wish_id })))
}

pub async fn get_wish(
    State(state): State<AppState>,
    Path(wish_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let wish = run_blocking(&state, move |r| r.wishes.get(wish_id))
        .await?
        .map_err(|e| status_for(&e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(wish))
}

/// Ranked wish ids for a creator.
pub async fn list_wishes(
    State(state): State<AppState>,
    Path(creator): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let ids = run_blocking(&state, move |r| r.wishes.list_by_creator(&creator))
        .await?
        .map_err(|e| status_for(&e))?;

    Ok(Json(ids))
}

pub async fn list_booked(
    State(state): State<AppState>,
    Path(creator): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    list_by_state(state, creator, true).await.map(Json)
}

pub async fn list_available(
    State(state): State<AppState>,
    Path(creator): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    list_by_state(state, creator, false).await.map(Json)
}

pub(crate) async fn list_by_state(
    state: AppState,
    creator: String,
    booked: bool,
) -> Result<WishListResponse, StatusCode> {
    let name = creator.clone();
    let wishes = run_blocking(&state, move |r| {
        r.wishes.list_by_creator_and_booking_state(&name, booked)
    })
    .await?
    .map_err(|e| status_for(&e))?;

    Ok(WishListResponse {
        creator_name: creator,
        wishes,
    })
}
