use crate::domain::PlayerId;
use crate::frameworks::config;
use crate::interface_adapters::net::hub::ConnectionHub;
use crate::interface_adapters::protocol::{ClientMessage, PlayerRefDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::{next_conn_id, next_player_id};
use crate::use_cases::{ArenaCommand, ClientAction};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    ArenaClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // Separate connection id for correlating logs before/after a player_id exists.
        let conn_id = next_conn_id();
        let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
        handle_socket(socket, state).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: "arena unavailable".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    tracing::Span::current().record("player_id", ctx.player_id.0);
    info!(player_id = %ctx.player_id, "client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub arena_tx: mpsc::Sender<ArenaCommand>,
    pub hub: Arc<ConnectionHub>,
    // Events addressed to this player, already serialized by the hub.
    pub outbound_rx: mpsc::Receiver<Utf8Bytes>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,
    pub rejected_input: u32,

    pub last_command_full_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    let player_id = next_player_id();

    // Attach before the arena learns about the player so no room event can be missed.
    let (outbound_tx, outbound_rx) = mpsc::channel(config::CONNECTION_QUEUE_CAPACITY);
    state.hub.attach(player_id, outbound_tx);

    // Tell the client "This is who you are".
    let identity_msg = ServerMessage::Identity(PlayerRefDto::from(player_id));
    let identity_bytes = match send_message(socket, &identity_msg).await {
        Ok(bytes) => bytes,
        Err(err) => {
            state.hub.detach(player_id);
            return Err(err);
        }
    };

    if state
        .arena_tx
        .send(ArenaCommand::Connect { player_id })
        .await
        .is_err()
    {
        state.hub.detach(player_id);
        return Err(NetError::ArenaClosed);
    }

    let now = throttle_start();
    Ok(ConnCtx {
        player_id,
        arena_tx: state.arena_tx.clone(),
        hub: state.hub.clone(),
        outbound_rx,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out: identity_bytes as u64,

        invalid_json: 0,
        rejected_input: 0,

        last_command_full_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

pub(crate) const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

/// A timestamp old enough that the first throttled warning is logged right away.
pub(crate) fn throttle_start() -> Instant {
    Instant::now()
        .checked_sub(LOG_THROTTLE)
        .unwrap_or_else(Instant::now)
}

pub(crate) fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Drops actions carrying NaN or infinite numbers before they reach the arena.
fn sanitize_action(action: ClientAction) -> Option<ClientAction> {
    let finite = match &action {
        ClientAction::Move { x, y } => x.is_finite() && y.is_finite(),
        ClientAction::Shoot { angle } => angle.is_finite(),
        ClientAction::UseAbility { target: Some(t) } => t.x.is_finite() && t.y.is_finite(),
        _ => true,
    };
    finite.then_some(action)
}

fn process_action(
    player_id: PlayerId,
    arena_tx: &mpsc::Sender<ArenaCommand>,
    action: ClientAction,
    rejected_input: &mut u32,
    last_command_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let Some(action) = sanitize_action(action) else {
        *rejected_input += 1;
        if should_log(last_invalid_input_log) {
            warn!(player_id = %player_id, "invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match arena_tx.try_send(ArenaCommand::Action { player_id, action }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_cmd)) => {
            if should_log(last_command_full_log) {
                warn!(player_id = %player_id, "arena command channel full; dropping action");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_cmd)) => Err(NetError::ArenaClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        arena_tx,
        hub,
        outbound_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        rejected_input,
        last_command_full_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    arena_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    rejected_input,
                    last_command_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing arena events
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(bytes) => match forward_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        debug!(player_id = %player_id, "outbound queue closed");
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        player_id,
        hub,
        arena_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *rejected_input,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    arena_tx: &mpsc::Sender<ArenaCommand>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    rejected_input: &mut u32,
    last_command_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => process_action(
                        player_id,
                        arena_tx,
                        message.into(),
                        rejected_input,
                        last_command_full_log,
                        last_invalid_input_log,
                    ),
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id = %player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id = %player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id = %player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send event");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    hub: &ConnectionHub,
    arena_tx: &mpsc::Sender<ArenaCommand>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    rejected_input: u32,
) -> Result<(), NetError> {
    // Stop queuing events first; the arena may still emit some while it processes the leave.
    hub.detach(player_id);

    arena_tx
        .send(ArenaCommand::Disconnect { player_id })
        .await
        .map_err(|_| NetError::ArenaClosed)?;

    debug!(
        player_id = %player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        rejected_input,
        "connection stats"
    );
    info!(player_id = %player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::types::TargetPoint;

    #[test]
    fn when_input_has_non_finite_numbers_then_it_is_dropped() {
        assert!(sanitize_action(ClientAction::Move { x: f32::NAN, y: 0.0 }).is_none());
        assert!(sanitize_action(ClientAction::Shoot { angle: f32::INFINITY }).is_none());
        assert!(
            sanitize_action(ClientAction::UseAbility {
                target: Some(TargetPoint {
                    x: 1.0,
                    y: f32::NEG_INFINITY
                })
            })
            .is_none()
        );
        assert_eq!(
            sanitize_action(ClientAction::Shoot { angle: 1.5 }),
            Some(ClientAction::Shoot { angle: 1.5 })
        );
    }

    #[tokio::test]
    async fn when_arena_queue_is_full_then_action_is_dropped_but_connection_stays() {
        let (tx, _rx) = mpsc::channel(1);
        let mut rejected = 0;
        let mut full_log = Instant::now();
        let mut invalid_log = Instant::now();

        for _ in 0..3 {
            let control = process_action(
                PlayerId(1),
                &tx,
                ClientAction::InteractWithCube,
                &mut rejected,
                &mut full_log,
                &mut invalid_log,
            )
            .expect("open channel");
            assert!(matches!(control, LoopControl::Continue));
        }
        assert_eq!(rejected, 0);
    }

    #[tokio::test]
    async fn when_arena_is_gone_then_action_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut rejected = 0;
        let mut full_log = Instant::now();
        let mut invalid_log = Instant::now();

        let result = process_action(
            PlayerId(1),
            &tx,
            ClientAction::RequestShopData,
            &mut rejected,
            &mut full_log,
            &mut invalid_log,
        );
        assert!(matches!(result, Err(NetError::ArenaClosed)));
    }

    #[test]
    fn when_throttle_starts_then_it_never_panics_and_suppresses_repeats() {
        let mut last = throttle_start();
        assert!(last <= Instant::now());
        let _ = should_log(&mut last);
        assert!(!should_log(&mut last));
    }
}
