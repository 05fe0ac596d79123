//! Realtime websocket link to the conversation provider.

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::traits::{VoiceConnection, VoiceEvent, VoiceLink};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Wire events the provider pushes over the session socket. Everything else
/// (audio frames, interruptions) is ignored here.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    UserTranscript { text: String },
    AgentResponse { text: String },
    Error { message: String },
    Ping,
    #[serde(other)]
    Other,
}

pub struct WsVoiceLink {
    ws_url: String,
    api_key: String,
}

#[injectable(VoiceLink)]
impl WsVoiceLink {
    #[inject]
    pub fn create(config: Ref<Config>) -> Self {
        Self {
            ws_url: config.provider_ws_url.clone(),
            api_key: config.provider_api_key.clone(),
        }
    }
}

#[async_trait]
impl VoiceLink for WsVoiceLink {
    async fn open(&self, agent_id: &str) -> Result<VoiceConnection, AppError> {
        let url = format!(
            "{}?agent_id={agent_id}&api_key={}",
            self.ws_url, self.api_key
        );
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;
        info!("voice link opened for agent {agent_id}");

        let (mut write, mut read) = ws_stream.split();

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (close_tx, mut close_rx) = mpsc::channel::<()>(1);

        // Waits for the close request and tells the provider to hang up. The
        // read side sees the close frame echo and ends with Disconnected.
        tokio::spawn(async move {
            let _ = close_rx.recv().await;
            if let Err(e) = write.send(Message::Close(None)).await {
                debug!("close frame not sent: {e}");
            }
        });

        tokio::spawn(async move {
            if event_tx.send(VoiceEvent::Connected).await.is_err() {
                return;
            }

            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        error!("failed to read message: {e}");
                        break;
                    }
                };

                let event = match message {
                    Message::Text(text) => match serde_json::from_str::<WireEvent>(&text) {
                        Ok(WireEvent::UserTranscript { text }) => Some(VoiceEvent::Message {
                            source: "user".to_owned(),
                            text,
                        }),
                        Ok(WireEvent::AgentResponse { text }) => Some(VoiceEvent::Message {
                            source: "ai".to_owned(),
                            text,
                        }),
                        Ok(WireEvent::Error { message }) => Some(VoiceEvent::Error { message }),
                        Ok(WireEvent::Ping) | Ok(WireEvent::Other) => None,
                        Err(e) => {
                            warn!("unrecognized provider event: {e}");
                            None
                        }
                    },
                    Message::Binary(_) => None,
                    Message::Close(reason) => {
                        info!("voice link closed: {reason:?}");
                        break;
                    }
                    _ => None,
                };

                if let Some(event) = event {
                    if event_tx.send(event).await.is_err() {
                        // Listener is gone; nothing left to deliver to.
                        break;
                    }
                }
            }

            let _ = event_tx.send(VoiceEvent::Disconnected).await;
        });

        Ok(VoiceConnection {
            events: event_rx,
            close: close_tx,
        })
    }
}
