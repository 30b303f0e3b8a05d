use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use wishlist_types::api::{AddRelationRequest, AddRelationResponse};

use crate::{AppState, run_blocking, status_for};

pub async fn add_relation(
    State(state): State<AppState>,
    Json(req): Json<AddRelationRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let relation_id = run_blocking(&state, move |r| {
        r.relations
            .add(&req.creator_name, &req.presenter_name, req.relation_type)
    })
    .await?
    .map_err(|e| status_for(&e))?;

    Ok((StatusCode::CREATED, Json(AddRelationResponse { relation_id })))
}
