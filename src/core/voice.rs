//! Voice session state and transcript accumulation.
//!
//! One dispatcher task per session owns all state. Provider events and
//! UI-requested transitions (stop) both flow through it, so there is exactly
//! one writer of the session state and the transcript.

use crate::infrastructure::traits::{VoiceConnection, VoiceEvent};
use di::{inject, injectable};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// The provider reports `"ai"` for agent turns; everything else is the
    /// student.
    pub fn from_source(source: &str) -> TurnRole {
        if source == "ai" {
            TurnRole::Assistant
        } else {
            TurnRole::User
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Live update published by the dispatcher to streaming listeners.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    State(SessionState),
    Turn(TranscriptTurn),
    /// A provider error was surfaced; the session continues.
    Notice(String),
}

enum SessionCommand {
    Stop,
}

struct Snapshot {
    state: SessionState,
    transcript: Vec<TranscriptTurn>,
}

pub struct VoiceSession {
    pub id: Uuid,
    snapshot: RwLock<Snapshot>,
    updates: broadcast::Sender<SessionUpdate>,
    commands: mpsc::Sender<SessionCommand>,
}

impl VoiceSession {
    /// Spawns the dispatcher for an open provider connection. The returned
    /// handle is the only way to observe or stop the session.
    pub fn spawn(connection: VoiceConnection) -> Arc<VoiceSession> {
        let (command_tx, command_rx) = mpsc::channel(4);
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let session = Arc::new(VoiceSession {
            id: Uuid::new_v4(),
            snapshot: RwLock::new(Snapshot {
                state: SessionState::Connecting,
                transcript: Vec::new(),
            }),
            updates: update_tx,
            commands: command_tx,
        });

        tokio::spawn(dispatch(session.clone(), connection, command_rx));
        session
    }

    pub async fn state(&self) -> SessionState {
        self.snapshot.read().await.state
    }

    pub async fn transcript(&self) -> Vec<TranscriptTurn> {
        self.snapshot.read().await.transcript.clone()
    }

    pub fn updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Requests the dispatcher to end the session. Returns immediately; the
    /// `Ended` state is published once the dispatcher acknowledges.
    pub async fn request_stop(&self) {
        // A closed channel means the dispatcher already ended the session.
        let _ = self.commands.send(SessionCommand::Stop).await;
    }

    async fn set_state(&self, state: SessionState) {
        self.snapshot.write().await.state = state;
        let _ = self.updates.send(SessionUpdate::State(state));
    }

    async fn push_turn(&self, turn: TranscriptTurn) {
        self.snapshot.write().await.transcript.push(turn.clone());
        let _ = self.updates.send(SessionUpdate::Turn(turn));
    }
}

/// The sole writer of session state. Consumes provider events and stop
/// requests until the session ends; anything arriving later is dropped with
/// the channels.
async fn dispatch(
    session: Arc<VoiceSession>,
    mut connection: VoiceConnection,
    mut commands: mpsc::Receiver<SessionCommand>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Stop) | None => {
                    let _ = connection.close.send(()).await;
                    info!("session {} stopped", session.id);
                    session.set_state(SessionState::Ended).await;
                    break;
                }
            },
            event = connection.events.recv() => match event {
                Some(VoiceEvent::Connected) => {
                    session.set_state(SessionState::Active).await;
                }
                Some(VoiceEvent::Message { source, text }) => {
                    session.push_turn(TranscriptTurn {
                        role: TurnRole::from_source(&source),
                        content: text,
                    }).await;
                }
                Some(VoiceEvent::Error { message }) => {
                    error!("session {}: provider error: {message}", session.id);
                    let _ = session.updates.send(SessionUpdate::Notice(
                        "an error occurred during the conversation".to_owned(),
                    ));
                }
                Some(VoiceEvent::Disconnected) | None => {
                    session.set_state(SessionState::Ended).await;
                    break;
                }
            },
        }
    }
}

/// All live sessions, by id. Entries are removed on stop; the transcript
/// lives only as long as its session handle.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<VoiceSession>>>,
}

#[injectable]
impl SessionRegistry {
    #[inject]
    pub fn create() -> SessionRegistry {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionRegistry {
    pub async fn insert(&self, session: Arc<VoiceSession>) {
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<VoiceSession>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    pub async fn remove(&self, session_id: Uuid) -> Option<Arc<VoiceSession>> {
        self.sessions.write().await.remove(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_ai_source() {
        assert_eq!(TurnRole::from_source("ai"), TurnRole::Assistant);
    }

    #[test]
    fn test_role_from_other_sources() {
        assert_eq!(TurnRole::from_source("user"), TurnRole::User);
        assert_eq!(TurnRole::from_source(""), TurnRole::User);
        assert_eq!(TurnRole::from_source("AI"), TurnRole::User);
    }
}
