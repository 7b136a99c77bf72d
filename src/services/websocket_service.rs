//! Per-participant WebSocket lifecycle: identification via the `join`
//! message, inbound dispatch, and disconnect bookkeeping.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::{game_service, matchmaking_service},
    state::SharedState,
};

/// How long a fresh socket may idle before sending its `join` message.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle for an individual participant connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(JOIN_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket join timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let username = match ClientMessage::from_json_str(&initial_message) {
        Ok(ClientMessage::Join { username }) => username,
        Ok(_) => {
            warn!("first message was not a join");
            send_error(&outbound_tx, "Expected a join message first");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse or validate client message");
            send_error(&outbound_tx, &err.to_string());
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    info!(%username, "participant connected");
    if let matchmaking_service::JoinOutcome::Rejected =
        matchmaking_service::join(&state, &username, outbound_tx.clone()).await
    {
        // The identity is live on another transport; closing here must not
        // run disconnect bookkeeping against that session.
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(ClientMessage::Move { column }) => {
                    game_service::handle_move(&state, &username, column, &outbound_tx).await;
                }
                Ok(ClientMessage::Join { .. }) => {
                    warn!(%username, "ignoring duplicate join message");
                }
                Ok(ClientMessage::Unknown) => {
                    warn!(%username, payload = %text, "ignoring unknown message type");
                }
                Err(err) => {
                    warn!(%username, error = %err, "failed to parse or validate client message");
                    send_error(&outbound_tx, &err.to_string());
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%username, "participant closed the stream");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%username, error = %err, "websocket error");
                break;
            }
        }
    }

    game_service::handle_disconnect(&state, &username, &outbound_tx).await;
    info!(%username, "participant disconnected");

    finalize(writer_task, outbound_tx).await;
}

fn send_error(tx: &mpsc::UnboundedSender<Message>, message: &str) {
    game_service::send_message(
        tx,
        &ServerMessage::Error {
            message: message.to_string(),
        },
    );
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
