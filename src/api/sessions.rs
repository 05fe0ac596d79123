//! Voice session endpoints
//!
//! A session is started for a join code, observed either as a snapshot or as
//! a live SSE stream, and stopped with an explicit request that the session
//! dispatcher acknowledges.

use crate::api::sessions::schemas::StartSession;
use crate::core::traits::VoiceSessionService;
use crate::core::voice::{SessionState, SessionUpdate};
use crate::error::AppError;
use async_stream::stream;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use futures_util::Stream;
use log::warn;
use tokio::sync::broadcast;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", post(start_session))
        .route("/:id", get(get_session))
        .route("/:id/events", get(session_events))
        .route("/:id/stop", post(stop_session))
}

async fn start_session(
    Inject(session_service): Inject<dyn VoiceSessionService>,
    Json(request): Json<StartSession>,
) -> Result<(StatusCode, Json<schemas::Session>), AppError> {
    let session = session_service.start(&request.code).await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::Session {
            session_id: session.id,
            state: session.state().await,
            transcript: Vec::new(),
        }),
    ))
}

async fn get_session(
    Inject(session_service): Inject<dyn VoiceSessionService>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<schemas::Session>), AppError> {
    let session = session_service.session(session_id).await?;

    Ok((
        StatusCode::OK,
        Json(schemas::Session {
            session_id: session.id,
            state: session.state().await,
            transcript: session.transcript().await,
        }),
    ))
}

/// Live updates only; the transcript so far comes from `get_session`.
async fn session_events(
    Inject(session_service): Inject<dyn VoiceSessionService>,
    Path(session_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, &'static str>>>, AppError> {
    let session = session_service.session(session_id).await?;
    let mut updates = session.updates();
    let state = session.state().await;

    let stream = stream! {
        yield Ok(Event::default().event("state").json_data(state).unwrap());
        if state == SessionState::Ended {
            return;
        }

        loop {
            match updates.recv().await {
                Ok(SessionUpdate::Turn(turn)) => {
                    yield Ok(Event::default().event("turn").json_data(turn).unwrap());
                }
                Ok(SessionUpdate::State(state)) => {
                    yield Ok(Event::default().event("state").json_data(state).unwrap());
                    if state == SessionState::Ended {
                        break;
                    }
                }
                Ok(SessionUpdate::Notice(notice)) => {
                    yield Ok(Event::default().event("notice").data(notice));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("session {session_id} event stream lagged by {skipped}");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn stop_session(
    Inject(session_service): Inject<dyn VoiceSessionService>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<schemas::StopAcknowledged>), AppError> {
    session_service.stop(session_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(schemas::StopAcknowledged { session_id }),
    ))
}

pub mod schemas {
    use crate::core::voice::{SessionState, TranscriptTurn};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct StartSession {
        pub code: String,
    }

    #[derive(Serialize, Debug)]
    pub struct Session {
        pub session_id: Uuid,
        pub state: SessionState,
        pub transcript: Vec<TranscriptTurn>,
    }

    #[derive(Serialize, Debug)]
    pub struct StopAcknowledged {
        pub session_id: Uuid,
    }
}
