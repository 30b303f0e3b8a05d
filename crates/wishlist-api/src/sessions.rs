//! Per-user conversation context: the wish being assembled and the list the
//! user last looked at. A session lives from `POST /session` until
//! `DELETE /session` (or a new `POST /session`, which replaces it).

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use wishlist_types::api::{
    BookResponse, BookingRejection, CreateWishResponse, SessionBookRequest, ViewRequest,
};
use wishlist_types::models::{DraftError, WishDraft};

use crate::bookings::booking_reply;
use crate::middleware::UserId;
use crate::wishes::list_by_state;
use crate::{AppState, run_blocking, status_for};

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: String,
    pub draft: Option<WishDraft>,
    pub last_viewed: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            draft: None,
            last_viewed: None,
            started_at: Utc::now(),
        }
    }
}

/// Live sessions keyed by user id.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl Sessions {
    /// Open a fresh session, discarding any earlier one for the same user.
    pub async fn start(&self, user: &str) -> Session {
        let session = Session::new(user);
        self.inner
            .write()
            .await
            .insert(user.to_string(), session.clone());
        session
    }

    pub async fn end(&self, user: &str) -> Option<Session> {
        self.inner.write().await.remove(user)
    }

    pub async fn get(&self, user: &str) -> Option<Session> {
        self.inner.read().await.get(user).cloned()
    }

    /// Merge `update` into the session's draft, starting one if needed.
    /// Returns `None` when the user has no session.
    pub async fn update_draft(&self, user: &str, update: WishDraft) -> Option<WishDraft> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(user)?;
        let draft = session.draft.get_or_insert_with(WishDraft::default);
        draft.merge(update);
        Some(draft.clone())
    }

    /// Remove and return the draft. `None` if there is no session or no draft.
    pub async fn take_draft(&self, user: &str) -> Option<WishDraft> {
        self.inner.write().await.get_mut(user)?.draft.take()
    }

    /// Put a draft back after a failed submit, unless the user has since
    /// started another one or ended the session.
    pub async fn restore_draft(&self, user: &str, draft: WishDraft) {
        if let Some(session) = self.inner.write().await.get_mut(user) {
            if session.draft.is_none() {
                session.draft = Some(draft);
            }
        }
    }

    /// Record which creator's list the user is looking at. False without a session.
    pub async fn set_last_viewed(&self, user: &str, creator: &str) -> bool {
        match self.inner.write().await.get_mut(user) {
            Some(session) => {
                session.last_viewed = Some(creator.to_string());
                true
            }
            None => false,
        }
    }
}

// -- Handlers --

pub async fn start(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> impl IntoResponse {
    let session = state.sessions.start(&user).await;
    info!(user = %user, "session started");
    (StatusCode::CREATED, Json(session))
}

pub async fn current(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let session = state.sessions.get(&user).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session))
}

pub async fn end(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> StatusCode {
    match state.sessions.end(&user).await {
        Some(_) => {
            info!(user = %user, "session ended");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

pub async fn update_draft(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Json(update): Json<WishDraft>,
) -> Result<impl IntoResponse, StatusCode> {
    let draft = state
        .sessions
        .update_draft(&user, update)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    debug!(user = %user, "draft updated");
    Ok(Json(draft))
}

/// Persist the session's draft as a wish owned by the session user.
pub async fn submit_draft(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let draft = state
        .sessions
        .take_draft(&user)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let new_wish = match draft.clone().into_new_wish(&user) {
        Ok(wish) => wish,
        Err(DraftError::MissingName) => {
            state.sessions.restore_draft(&user, draft).await;
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let created = run_blocking(&state, move |r| r.wishes.create(&new_wish)).await;
    match created {
        Ok(Ok(wish_id)) => {
            info!(user = %user, wish_id, "draft submitted");
            Ok((StatusCode::CREATED, Json(CreateWishResponse { wish_id })))
        }
        Ok(Err(e)) => {
            state.sessions.restore_draft(&user, draft).await;
            Err(status_for(&e))
        }
        Err(status) => {
            state.sessions.restore_draft(&user, draft).await;
            Err(status)
        }
    }
}

/// Show a creator's unbooked wishes and remember them as the viewed list.
pub async fn view(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Json(req): Json<ViewRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if !state.sessions.set_last_viewed(&user, &req.creator_name).await {
        return Err(StatusCode::NOT_FOUND);
    }
    debug!(user = %user, creator = %req.creator_name, "viewing wishlist");

    let list = list_by_state(state, req.creator_name, false).await?;
    Ok(Json(list))
}

/// Book a wish from the list the session last viewed.
pub async fn book_viewed(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Json(req): Json<SessionBookRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let session = state.sessions.get(&user).await.ok_or(StatusCode::NOT_FOUND)?;
    let wish_id = req.wish_id;

    let wish = run_blocking(&state, move |r| r.wishes.get(wish_id))
        .await?
        .map_err(|e| status_for(&e))?;

    match (wish, session.last_viewed) {
        (None, _) => Ok((
            StatusCode::NOT_FOUND,
            Json(BookResponse::rejected(wish_id, BookingRejection::NotFound)),
        )),
        (Some(wish), Some(viewed)) if wish.creator_name == viewed => {
            // Stale list: skip the transaction. The engine still has the final say.
            if !wish.state().is_bookable() {
                return Ok((
                    StatusCode::CONFLICT,
                    Json(BookResponse::rejected(wish_id, BookingRejection::AlreadyBooked)),
                ));
            }
            let result = run_blocking(&state, move |r| r.bookings.book(wish_id, &user)).await?;
            booking_reply(wish_id, result)
        }
        _ => Ok((
            StatusCode::CONFLICT,
            Json(BookResponse::rejected(wish_id, BookingRejection::NotOnViewedList)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_lifecycle() {
        let sessions = Sessions::default();
        assert!(sessions.get("alice").await.is_none());

        sessions.start("alice").await;
        assert!(sessions.get("alice").await.is_some());
        assert!(sessions.set_last_viewed("alice", "bob").await);

        // Starting again wipes the previous context.
        sessions.start("alice").await;
        let session = sessions.get("alice").await.unwrap();
        assert_eq!(session.last_viewed, None);
        assert_eq!(session.draft, None);

        assert!(sessions.end("alice").await.is_some());
        assert!(sessions.end("alice").await.is_none());
        assert!(sessions.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn draft_requires_a_session() {
        let sessions = Sessions::default();
        let update = WishDraft {
            name: Some("bike".into()),
            ..Default::default()
        };
        assert!(sessions.update_draft("alice", update).await.is_none());
        assert!(!sessions.set_last_viewed("alice", "bob").await);
    }

    #[tokio::test]
    async fn take_and_restore_draft() {
        let sessions = Sessions::default();
        sessions.start("alice").await;
        sessions
            .update_draft(
                "alice",
                WishDraft {
                    price: Some(10.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let draft = sessions.take_draft("alice").await.unwrap();
        assert!(sessions.take_draft("alice").await.is_none());

        sessions.restore_draft("alice", draft.clone()).await;
        assert_eq!(sessions.get("alice").await.unwrap().draft, Some(draft));
    }
}
