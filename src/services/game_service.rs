//! Move orchestration: applies moves under the session lock, pushes board
//! updates to both seats, schedules bot turns, and runs the disconnect
//! grace-period path.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::models::GameRecordEntity,
    dto::ws::ServerMessage,
    engine::{board::Side, bot},
    events::GameEventRecord,
    state::{
        SharedState,
        session::{MoveError, SessionHandle},
    },
};

/// Serialize a payload and push it onto a seat's writer channel.
///
/// A closed writer means the peer is gone; the disconnect path will notice
/// through the read side, so the failure is only logged.
pub(crate) fn send_message(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message");
            return;
        }
    };
    if tx.send(Message::Text(payload.into())).is_err() {
        warn!("writer channel closed; dropping outbound message");
    }
}

/// Route a move from `username` to their current session.
///
/// Rule violations and routing failures are reported back on `outbound_tx`
/// without mutating any state.
pub async fn handle_move(
    state: &SharedState,
    username: &str,
    column: i32,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) {
    let handle = resolve_session(state, username).await;
    let Some(handle) = handle else {
        warn!(%username, "move received without an active game");
        send_message(
            outbound_tx,
            &ServerMessage::Error {
                message: "Game not found".into(),
            },
        );
        return;
    };

    let side = {
        let session = handle.lock().await;
        session.side_of(username)
    };
    let Some(side) = side else {
        // Index invariant: at most one non-terminal session per identity, so
        // a resolved session always seats the mover. Tolerate anyway.
        warn!(%username, "participant index pointed at a foreign session");
        send_message(
            outbound_tx,
            &ServerMessage::Error {
                message: "Game not found".into(),
            },
        );
        return;
    };

    match apply_and_broadcast(state, &handle, side, column).await {
        Ok(bot_turn) => {
            if bot_turn {
                schedule_bot_move(state.clone(), handle);
            }
        }
        Err(err) => {
            info!(%username, column, error = %err, "rejected move");
            send_message(
                outbound_tx,
                &ServerMessage::Error {
                    message: err.to_string(),
                },
            );
        }
    }
}

/// Current session of `username`, going through the participant index.
async fn resolve_session(state: &SharedState, username: &str) -> Option<SessionHandle> {
    let game_id = {
        let mm = state.matchmaker().lock().await;
        mm.by_player.get(username).copied()
    }?;
    state.session(game_id)
}

/// Apply one move for `side` and fan out the resulting board state.
///
/// Holds the session lock only for the mutation; sends happen afterwards.
/// Returns whether the bot now holds the turn and needs scheduling.
pub(crate) async fn apply_and_broadcast(
    state: &SharedState,
    handle: &SessionHandle,
    side: Side,
    column: i32,
) -> Result<bool, MoveError> {
    let (message, recipients, finished, bot_turn) = {
        let mut session = handle.lock().await;
        let applied = session.apply_move(side, column)?;
        info!(
            game_id = %session.id,
            %side,
            column,
            row = applied.row,
            finished = applied.finished.is_some(),
            "move applied"
        );

        let message = if applied.finished.is_some() {
            ServerMessage::game_over(&session)
        } else {
            ServerMessage::move_snapshot(&session)
        };
        let recipients: Vec<_> = session
            .seats
            .iter()
            .filter_map(|seat| seat.tx.clone())
            .collect();
        let bot_turn =
            applied.finished.is_none() && session.vs_bot && session.current == Side::Yellow;
        (message, recipients, applied.finished.is_some(), bot_turn)
    };

    for tx in &recipients {
        send_message(tx, &message);
    }

    if finished {
        finalize(state, handle).await;
    }

    Ok(bot_turn)
}

/// Queue the bot's move after the thinking delay.
///
/// The delay is a real elapsed-time window, so the task re-checks under the
/// session lock that the game is still open and the bot still holds the turn
/// before acting.
pub(crate) fn schedule_bot_move(state: SharedState, handle: SessionHandle) {
    tokio::spawn(async move {
        sleep(state.config().bot_delay).await;

        let column = {
            let session = handle.lock().await;
            if session.is_finished() || session.current != Side::Yellow {
                return;
            }
            bot::choose_column(&session.board, Side::Yellow)
        };
        // A full board was already classified as a draw before the bot's turn
        // could arrive; nothing to do if no column is open.
        let Some(column) = column else { return };

        if let Err(err) = apply_and_broadcast(&state, &handle, Side::Yellow, column as i32).await {
            warn!(column, error = %err, "bot move rejected");
        }
    });
}

/// Transport-level disconnect path for `username`.
///
/// Removes any queued entry, marks the seat, notifies the opponent, and arms
/// the grace-period timer. No-op for identities without an active session.
///
/// `closing_tx` identifies the socket that actually closed. The identity may
/// have moved to a newer transport in the meantime, and a stale close must
/// not disturb queue entries or seats that newer transport now owns.
pub async fn handle_disconnect(
    state: &SharedState,
    username: &str,
    closing_tx: &mpsc::UnboundedSender<Message>,
) {
    {
        let mut mm = state.matchmaker().lock().await;
        if mm.remove_waiting_transport(username, closing_tx).is_some() {
            info!(%username, "removed disconnected participant from the waiting queue");
        }
    }

    let Some(handle) = resolve_session(state, username).await else {
        return;
    };

    let armed = {
        let mut session = handle.lock().await;
        let Some(side) = session.side_of(username) else {
            return;
        };
        let seat = session.seat_mut(side);
        match &seat.tx {
            Some(current) if current.same_channel(closing_tx) => {}
            _ => return,
        }
        seat.disconnected = true;
        seat.tx = None;
        seat.last_seen = std::time::SystemTime::now();
        info!(game_id = %session.id, %username, "seat disconnected");

        if session.is_finished() {
            None
        } else {
            Some((side, session.seat(side.other()).tx.clone()))
        }
    };

    let Some((side, opponent_tx)) = armed else {
        return;
    };

    if let Some(tx) = opponent_tx {
        send_message(&tx, &ServerMessage::OpponentDisconnected);
    }
    schedule_forfeit(state.clone(), handle, side);
}

/// Arm the grace-period timer for a disconnected seat.
///
/// At fire time the timer re-checks its condition: a reconnection or a
/// terminal result reached in the interim turns it into a no-op.
fn schedule_forfeit(state: SharedState, handle: SessionHandle, side: Side) {
    tokio::spawn(async move {
        sleep(state.config().grace_period).await;

        let notification = {
            let mut session = handle.lock().await;
            if session.is_finished() || !session.seat(side).disconnected {
                return;
            }
            session.forfeit(side);
            info!(game_id = %session.id, leaver = %side, "session forfeited after grace period");

            let message = ServerMessage::GameForfeited {
                winner: side.other(),
            };
            let recipients: Vec<_> = session
                .seats
                .iter()
                .filter_map(|seat| seat.tx.clone())
                .collect();
            (message, recipients)
        };

        let (message, recipients) = notification;
        for tx in &recipients {
            send_message(tx, &message);
        }
        finalize(&state, &handle).await;
    });
}

/// One-shot terminal bookkeeping: persist the record, emit the analytics
/// event, and drop the session from the registries.
///
/// Reached exactly once per session, by whichever path set the result under
/// the session lock.
async fn finalize(state: &SharedState, handle: &SessionHandle) {
    let (id, record, event) = {
        let session = handle.lock().await;
        (
            session.id,
            GameRecordEntity::from(&*session),
            GameEventRecord::game_end(&session),
        )
    };

    persist_game(state, record).await;
    emit_event(state, event).await;
    state.deregister_session(id).await;
}

/// Submit a finished-game record to the storage collaborator.
///
/// Storage being down degrades the leaderboard, never the game: failures are
/// logged and swallowed.
pub(crate) async fn persist_game(state: &SharedState, record: GameRecordEntity) {
    let Some(store) = state.game_store().await else {
        warn!(game_id = %record.id, "storage unavailable (degraded mode); game not persisted");
        return;
    };
    if let Err(err) = store.save_game(record).await {
        warn!(error = %err, "failed to persist finished game");
    }
}

/// Emit a fire-and-forget analytics event if a sink is installed.
pub(crate) async fn emit_event(state: &SharedState, event: GameEventRecord) {
    let Some(sink) = state.event_sink().await else {
        return;
    };
    if let Err(err) = sink.publish(event).await {
        warn!(error = %err, "failed to publish analytics event");
    }
}
