use serde::{Deserialize, Serialize};

use crate::models::{RelationType, Wish};

// -- Wishes --

#[derive(Debug, Serialize)]
pub struct CreateWishResponse {
    pub wish_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WishListResponse {
    pub creator_name: String,
    pub wishes: Vec<Wish>,
}

// -- Bookings --

/// Why a booking was refused. Serialized into `BookResponse::reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingRejection {
    NotFound,
    AlreadyBooked,
    NotOnViewedList,
    Storage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub wish_id: i64,
    pub booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BookingRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl BookResponse {
    pub fn accepted(wish_id: i64, timestamp_ms: i64) -> Self {
        Self {
            wish_id,
            booked: true,
            reason: None,
            timestamp_ms: Some(timestamp_ms),
        }
    }

    pub fn rejected(wish_id: i64, reason: BookingRejection) -> Self {
        Self {
            wish_id,
            booked: false,
            reason: Some(reason),
            timestamp_ms: None,
        }
    }
}

// -- Relations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddRelationRequest {
    pub creator_name: String,
    pub presenter_name: String,
    pub relation_type: RelationType,
}

#[derive(Debug, Serialize)]
pub struct AddRelationResponse {
    pub relation_id: i64,
}

// -- Sessions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewRequest {
    pub creator_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionBookRequest {
    pub wish_id: i64,
}
