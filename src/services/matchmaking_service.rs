//! FIFO matchmaking: queueing, pairing, rejoin-by-identity, and the delayed
//! bot fallback for lone participants.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::info;

use crate::{
    dto::ws::ServerMessage,
    engine::board::Side,
    events::GameEventRecord,
    services::game_service::{emit_event, send_message},
    state::{
        SharedState, WaitingPlayer,
        session::{GameSession, Seat, SessionHandle},
    },
};

/// Where a `join` left the caller.
pub enum JoinOutcome {
    /// Seated in a session, either fresh or by reconnection.
    Seated(SessionHandle),
    /// Queued; the fallback timer is armed.
    Waiting,
    /// Identity already live on another transport; the caller should close.
    Rejected,
}

/// Admit `username` into matchmaking.
///
/// Resolution order: reattach to a non-terminal session holding a
/// disconnected seat under this identity, else pair with the queue head,
/// else enqueue and arm the fallback timer.
pub async fn join(
    state: &SharedState,
    username: &str,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinOutcome {
    let mut mm = state.matchmaker().lock().await;

    // Rejoin path: the participant index resolves identities to at most one
    // non-terminal session, so a hit here is either a reconnection or a
    // duplicate transport for a seat that is still live.
    if let Some(game_id) = mm.by_player.get(username).copied() {
        match state.session(game_id) {
            Some(handle) => {
                let snapshot = {
                    let mut session = handle.lock().await;
                    match session.side_of(username) {
                        Some(side) if session.seat(side).disconnected => {
                            let seat = session.seat_mut(side);
                            seat.tx = Some(tx.clone());
                            seat.disconnected = false;
                            info!(game_id = %session.id, %username, "seat reconnected");
                            Some(ServerMessage::move_snapshot(&session))
                        }
                        _ => None,
                    }
                };
                drop(mm);
                match snapshot {
                    Some(snapshot) => {
                        send_message(&tx, &snapshot);
                        return JoinOutcome::Seated(handle);
                    }
                    None => {
                        send_message(
                            &tx,
                            &ServerMessage::Error {
                                message: "Username already in use".into(),
                            },
                        );
                        return JoinOutcome::Rejected;
                    }
                }
            }
            None => {
                // Finalization races the index cleanup; treat a dangling
                // entry as no session.
                mm.by_player.remove(username);
            }
        }
    }

    // A queued identity joining again replaces its transport rather than
    // taking a second queue slot.
    if let Some(entry) = mm.waiting.iter_mut().find(|p| p.username == username) {
        entry.tx = tx.clone();
        drop(mm);
        send_message(&tx, &ServerMessage::Waiting);
        return JoinOutcome::Waiting;
    }

    if let Some(opponent) = mm.waiting.pop_front() {
        let red = Seat::human(opponent.username.clone(), Side::Red, opponent.tx.clone());
        let yellow = Seat::human(username.to_string(), Side::Yellow, tx.clone());
        let (handle, starts, event) = register_session(state, &mut mm, red, yellow, false);
        drop(mm);

        for (seat_tx, message) in &starts {
            send_message(seat_tx, message);
        }
        emit_event(state, event).await;
        return JoinOutcome::Seated(handle);
    }

    mm.waiting.push_back(WaitingPlayer {
        username: username.to_string(),
        tx: tx.clone(),
    });
    drop(mm);

    info!(%username, "queued for matchmaking");
    send_message(&tx, &ServerMessage::Waiting);
    schedule_fallback(state.clone(), username.to_string());
    JoinOutcome::Waiting
}

/// Arm the fallback timer for a queued participant.
///
/// If the identity is still queued when the delay elapses, it is removed and
/// seated against the heuristic opponent; a pairing in the interim makes the
/// timer a no-op.
fn schedule_fallback(state: SharedState, username: String) {
    tokio::spawn(async move {
        sleep(state.config().fallback_delay).await;

        let started = {
            let mut mm = state.matchmaker().lock().await;
            mm.remove_waiting(&username).map(|waiting| {
                info!(%username, "no opponent arrived; seating the bot");
                let red = Seat::human(waiting.username, Side::Red, waiting.tx);
                let yellow = Seat::bot(Side::Yellow);
                register_session(&state, &mut mm, red, yellow, true)
            })
        };

        if let Some((_, starts, event)) = started {
            for (seat_tx, message) in &starts {
                send_message(seat_tx, message);
            }
            emit_event(&state, event).await;
        }
    });
}

/// Create a session, wire it into the registries, and prepare the start
/// notifications. Caller holds the matchmaker lock.
fn register_session(
    state: &SharedState,
    mm: &mut crate::state::MatchmakerState,
    red: Seat,
    yellow: Seat,
    vs_bot: bool,
) -> (
    SessionHandle,
    Vec<(mpsc::UnboundedSender<Message>, ServerMessage)>,
    GameEventRecord,
) {
    let session = GameSession::new(red, yellow, vs_bot);
    let id = session.id;
    info!(
        game_id = %id,
        red = %session.seat(Side::Red).username,
        yellow = %session.seat(Side::Yellow).username,
        vs_bot,
        "session started"
    );

    let mut starts = Vec::with_capacity(2);
    for side in [Side::Red, Side::Yellow] {
        let seat = session.seat(side);
        if seat.username != crate::state::session::BOT_USERNAME {
            mm.by_player.insert(seat.username.clone(), id);
        }
        if let Some(tx) = &seat.tx {
            starts.push((
                tx.clone(),
                ServerMessage::GameStart {
                    color: side,
                    opponent: session.seat(side.other()).username.clone(),
                    current_player: session.current,
                    game_id: id,
                },
            ));
        }
    }
    let event = GameEventRecord::game_start(&session);
    let handle = std::sync::Arc::new(tokio::sync::Mutex::new(session));
    state.sessions().insert(id, handle.clone());
    (handle, starts, event)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{config::AppConfig, state::AppState};

    type Outbound = mpsc::UnboundedReceiver<Message>;

    async fn recv_json(rx: &mut Outbound) -> Value {
        let message = tokio::time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("writer channel closed");
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).expect("invalid json"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn the_first_joiner_waits_and_the_second_is_paired() {
        let state = AppState::new(AppConfig::default());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        assert!(matches!(
            join(&state, "alice", tx_a).await,
            JoinOutcome::Waiting
        ));
        let frame = recv_json(&mut rx_a).await;
        assert_eq!(frame["type"], "waiting");
        assert_eq!(state.waiting_players().await, 1);

        assert!(matches!(
            join(&state, "bob", tx_b).await,
            JoinOutcome::Seated(_)
        ));
        assert_eq!(state.waiting_players().await, 0);
        assert_eq!(state.active_games(), 1);

        // Queue head takes red and the opening turn; the newcomer is yellow.
        let start_a = recv_json(&mut rx_a).await;
        assert_eq!(start_a["type"], "game_start");
        assert_eq!(start_a["color"], "red");
        assert_eq!(start_a["opponent"], "bob");
        assert_eq!(start_a["current_player"], "red");

        let start_b = recv_json(&mut rx_b).await;
        assert_eq!(start_b["color"], "yellow");
        assert_eq!(start_b["opponent"], "alice");
        assert_eq!(start_b["current_player"], "red");
        assert_eq!(start_a["game_id"], start_b["game_id"]);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_order_decides_pairing_priority() {
        let state = AppState::new(AppConfig::default());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();

        join(&state, "alice", tx_a).await;
        // Bob pops the queue head, so alice is taken before carol arrives.
        join(&state, "bob", tx_b).await;
        join(&state, "carol", tx_c).await;

        recv_json(&mut rx_a).await; // waiting
        let start_a = recv_json(&mut rx_a).await;
        assert_eq!(start_a["opponent"], "bob");

        let start_b = recv_json(&mut rx_b).await;
        assert_eq!(start_b["opponent"], "alice");

        // Carol found an empty queue and is the one left waiting.
        let frame = recv_json(&mut rx_c).await;
        assert_eq!(frame["type"], "waiting");
        assert_eq!(state.waiting_players().await, 1);
        assert_eq!(state.active_games(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_lone_joiner_is_seated_against_the_bot_after_the_fallback_delay() {
        let state = AppState::new(AppConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        join(&state, "alice", tx).await;
        recv_json(&mut rx).await; // waiting

        let start = recv_json(&mut rx).await;
        assert_eq!(start["type"], "game_start");
        assert_eq!(start["color"], "red");
        assert_eq!(start["opponent"], "Bot");
        assert_eq!(state.waiting_players().await, 0);
        assert_eq!(state.active_games(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pairing_in_the_interim_makes_the_fallback_a_no_op() {
        let state = AppState::new(AppConfig::default());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();

        join(&state, "alice", tx_a).await;
        join(&state, "bob", tx_b).await;

        tokio::time::sleep(state.config().fallback_delay * 2).await;

        recv_json(&mut rx_a).await; // waiting
        let start = recv_json(&mut rx_a).await;
        assert_eq!(start["opponent"], "bob");
        // The fired timer found the queue empty and started nothing new.
        assert!(rx_a.try_recv().is_err());
        assert_eq!(state.active_games(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_queued_identity_joining_again_replaces_its_transport() {
        let state = AppState::new(AppConfig::default());
        let (tx_old, _rx_old) = mpsc::unbounded_channel();
        let (tx_new, mut rx_new) = mpsc::unbounded_channel();

        join(&state, "alice", tx_old).await;
        join(&state, "alice", tx_new).await;
        assert_eq!(state.waiting_players().await, 1);

        let frame = recv_json(&mut rx_new).await;
        assert_eq!(frame["type"], "waiting");
    }

    #[tokio::test(start_paused = true)]
    async fn a_replaced_socket_closing_keeps_the_live_entry_queued() {
        let state = AppState::new(AppConfig::default());
        let (tx_old, _rx_old) = mpsc::unbounded_channel();
        let (tx_new, mut rx_new) = mpsc::unbounded_channel();

        join(&state, "alice", tx_old.clone()).await;
        join(&state, "alice", tx_new).await;

        // The abandoned socket's read loop observes its close last; the
        // disconnect it reports must not evict the replacement entry.
        crate::services::game_service::handle_disconnect(&state, "alice", &tx_old).await;
        assert_eq!(state.waiting_players().await, 1);

        // The fallback timer still finds her queued and seats the bot.
        recv_json(&mut rx_new).await; // waiting
        let start = recv_json(&mut rx_new).await;
        assert_eq!(start["type"], "game_start");
        assert_eq!(start["opponent"], "Bot");
        assert_eq!(state.waiting_players().await, 0);
        assert_eq!(state.active_games(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_connected_identity_cannot_join_twice() {
        let state = AppState::new(AppConfig::default());
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let (tx_dup, mut rx_dup) = mpsc::unbounded_channel();

        join(&state, "alice", tx_a).await;
        join(&state, "bob", tx_b).await;

        assert!(matches!(
            join(&state, "alice", tx_dup).await,
            JoinOutcome::Rejected
        ));
        let reply = recv_json(&mut rx_dup).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["message"], "Username already in use");
        assert_eq!(state.active_games(), 1);
    }
}
