use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use wishlist_db::{DbError, DbResult};
use wishlist_types::api::{BookResponse, BookingRejection};
use wishlist_types::models::Booking;

use crate::middleware::UserId;
use crate::{AppState, run_blocking, status_for};

/// Book a wish for the calling user.
pub async fn book(
    State(state): State<AppState>,
    Path(wish_id): Path<i64>,
    Extension(UserId(presenter)): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let result = run_blocking(&state, move |r| r.bookings.book(wish_id, &presenter)).await?;
    booking_reply(wish_id, result)
}

pub async fn list_for_presenter(
    State(state): State<AppState>,
    Path(presenter): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let wishes = run_blocking(&state, move |r| r.wishes.list_booked_for_presenter(&presenter))
        .await?
        .map_err(|e| status_for(&e))?;

    Ok(Json(wishes))
}

/// Turn a booking outcome into a typed reply. Refusals are answers, not
/// failures, so they carry a body with the reason.
pub(crate) fn booking_reply(
    wish_id: i64,
    result: DbResult<Booking>,
) -> Result<(StatusCode, Json<BookResponse>), StatusCode> {
    match result {
        Ok(booking) => Ok((
            StatusCode::OK,
            Json(BookResponse::accepted(wish_id, booking.timestamp_ms)),
        )),
        Err(DbError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            Json(BookResponse::rejected(wish_id, BookingRejection::NotFound)),
        )),
        Err(DbError::AlreadyBooked(_)) => Ok((
            StatusCode::CONFLICT,
            Json(BookResponse::rejected(wish_id, BookingRejection::AlreadyBooked)),
        )),
        Err(e) if e.is_storage() => {
            error!(wish_id, "booking failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BookResponse::rejected(wish_id, BookingRejection::Storage)),
            ))
        }
        Err(e) => Err(status_for(&e)),
    }
}
