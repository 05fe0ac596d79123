//! Voice session state machine tests
//!
//! Drives the session dispatcher with scripted provider events and checks
//! the transcript and state transitions.

use duckcat_api::core::voice::{SessionState, SessionUpdate, TurnRole, VoiceSession};
use duckcat_api::infrastructure::traits::{VoiceConnection, VoiceEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

/// A scripted provider connection: the test feeds events in, and observes
/// close requests on the returned receiver.
fn scripted_connection() -> (
    mpsc::Sender<VoiceEvent>,
    mpsc::Receiver<()>,
    VoiceConnection,
) {
    let (event_tx, events) = mpsc::channel(32);
    let (close, close_rx) = mpsc::channel(1);
    (event_tx, close_rx, VoiceConnection { events, close })
}

async fn next_update(
    updates: &mut tokio::sync::broadcast::Receiver<SessionUpdate>,
) -> SessionUpdate {
    timeout(WAIT, updates.recv())
        .await
        .expect("timed out waiting for session update")
        .expect("update channel closed")
}

#[tokio::test]
async fn test_session_starts_connecting() {
    let (_events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);

    assert_eq!(session.state().await, SessionState::Connecting);
    assert!(session.transcript().await.is_empty());
}

#[tokio::test]
async fn test_connected_event_activates_session() {
    let (events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();

    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Active)
    ));
    assert_eq!(session.state().await, SessionState::Active);
}

#[tokio::test]
async fn test_transcript_preserves_arrival_order_and_roles() {
    let (events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();

    let script = [
        ("ai", "¿Qué te gustaría ordenar?"),
        ("user", "Un café, por favor"),
        ("ai", "¿Algo más?"),
        ("user", "No, gracias"),
    ];
    for (source, text) in script {
        events
            .send(VoiceEvent::Message {
                source: source.to_owned(),
                text: text.to_owned(),
            })
            .await
            .unwrap();
    }

    // One update per inbound message, in order.
    let mut seen = 0;
    while seen < script.len() {
        if let SessionUpdate::Turn(_) = next_update(&mut updates).await {
            seen += 1;
        }
    }

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), script.len());
    for (turn, (source, text)) in transcript.iter().zip(script) {
        let expected = if source == "ai" {
            TurnRole::Assistant
        } else {
            TurnRole::User
        };
        assert_eq!(turn.role, expected);
        assert_eq!(turn.content, text);
    }
}

#[tokio::test]
async fn test_provider_error_does_not_end_session() {
    let (events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();
    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Active)
    ));

    events
        .send(VoiceEvent::Error {
            message: "transport hiccup".to_owned(),
        })
        .await
        .unwrap();

    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::Notice(_)
    ));
    assert_eq!(session.state().await, SessionState::Active);

    // The session still accumulates turns afterwards.
    events
        .send(VoiceEvent::Message {
            source: "ai".to_owned(),
            text: "still here".to_owned(),
        })
        .await
        .unwrap();
    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::Turn(_)
    ));
}

#[tokio::test]
async fn test_stop_is_acknowledged_by_dispatcher() {
    let (events, mut close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();
    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Active)
    ));

    session.request_stop().await;

    // The dispatcher asks the provider to hang up and publishes Ended.
    timeout(WAIT, close_rx.recv())
        .await
        .expect("timed out waiting for close request")
        .expect("close channel dropped");
    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Ended)
    ));
    assert_eq!(session.state().await, SessionState::Ended);
}

#[tokio::test]
async fn test_provider_disconnect_ends_session() {
    let (events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();
    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Active)
    ));

    events.send(VoiceEvent::Disconnected).await.unwrap();

    assert!(matches!(
        next_update(&mut updates).await,
        SessionUpdate::State(SessionState::Ended)
    ));
}

#[tokio::test]
async fn test_events_after_end_are_discarded() {
    let (events, _close_rx, connection) = scripted_connection();
    let session = VoiceSession::spawn(connection);
    let mut updates = session.updates();

    events.send(VoiceEvent::Connected).await.unwrap();
    events
        .send(VoiceEvent::Message {
            source: "ai".to_owned(),
            text: "hello".to_owned(),
        })
        .await
        .unwrap();

    session.request_stop().await;

    // Drain updates until Ended.
    loop {
        if let SessionUpdate::State(SessionState::Ended) = next_update(&mut updates).await {
            break;
        }
    }

    // A late message never reaches the transcript.
    let _ = events
        .send(VoiceEvent::Message {
            source: "user".to_owned(),
            text: "too late".to_owned(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let transcript = session.transcript().await;
    assert!(transcript.iter().all(|turn| turn.content != "too late"));
    assert_eq!(session.state().await, SessionState::Ended);
}
