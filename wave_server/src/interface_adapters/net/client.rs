use crate::domain::PlayerId;
use crate::interface_adapters::protocol::{ClientMessage, ReplayDto, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameEvent, ReplaySnapshot, WorldHandle, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use glam::Vec2;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };
                let _ = world_bytes_tx.send(Utf8Bytes::from(txt));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn replay_serializer(
    mut replay_rx: watch::Receiver<ReplaySnapshot>,
    replay_bytes_tx: watch::Sender<Utf8Bytes>,
) {
    // Keep the latest serialized replay around for joins and lag recovery.
    loop {
        let msg = {
            let snapshot = replay_rx.borrow_and_update();
            ServerMessage::Replay(ReplayDto::from(&*snapshot))
        };
        match serde_json::to_string(&msg) {
            Ok(txt) => {
                replay_bytes_tx.send_replace(Utf8Bytes::from(txt));
            }
            Err(e) => error!(error = ?e, "failed to serialize replay"),
        }

        if replay_rx.changed().await.is_err() {
            warn!("replay channel closed; serializer exiting");
            break;
        }
    }
}

pub fn spawn_world_serializers(world: &WorldHandle) {
    tokio::spawn(world_update_serializer(
        world.world_tx.subscribe(),
        world.world_bytes_tx.clone(),
    ));
    tokio::spawn(replay_serializer(
        world.replay_tx.subscribe(),
        world.replay_bytes_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = state.conn_ids.next_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    serve_connection(socket, state).instrument(span).await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id);
    info!(
        player_id = ctx.player_id,
        display_name = %ctx.display_name,
        "client connected"
    );

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
    pub display_name: String,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub replay_bytes_rx: watch::Receiver<Utf8Bytes>,
    // Count lag recovery replays sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
    msgs_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = state.world.world_bytes_tx.subscribe();
    let replay_bytes_rx = state.world.replay_bytes_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let player_id = state.player_ids.next_id();

    // Send Identity Packet
    // Tell the client "This is who you are".
    send_message(socket, &ServerMessage::Identity { player_id }).await?;

    // Join happens before the replay so the snapshot can include the new player once the world
    // has processed it; live updates cover anything newer.
    state
        .world
        .input_tx
        .send(GameEvent::Join { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    // Late joiners get every retained door, arc and cone before live updates.
    let replay = replay_bytes_rx.borrow().clone();
    if !replay.is_empty() {
        if let Err(e) = socket.send(Message::Text(replay)).await {
            // Compensate the Join so the world does not keep a ghost player.
            let _ = state
                .world
                .input_tx
                .send(GameEvent::Leave { player_id })
                .await;
            return Err(NetError::Ws(e));
        }
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        display_name: join.display_name,
        input_tx: state.world.input_tx.clone(),
        world_bytes_rx,
        replay_bytes_rx,
        lag_recovery_count: 0,

        msgs_in: join.msgs_in,
        msgs_out: 2,
        bytes_in: join.bytes_in,
        bytes_out: 0,

        invalid_json: 0,

        last_input_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 64;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let display_name: String = payload
                    .display_name
                    .trim()
                    .chars()
                    .take(MAX_DISPLAY_NAME_LEN)
                    .collect();

                return Ok(JoinHandshake {
                    display_name,
                    bytes_in,
                    msgs_in: 1,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn finite_point(v: Vec2) -> Option<Vec2> {
    v.is_finite().then_some(v)
}

/// Maps a post-join client message onto a world event. `None` means drop it.
fn to_game_event(player_id: PlayerId, msg: ClientMessage) -> Option<GameEvent> {
    match msg {
        ClientMessage::Join(_) => None,
        ClientMessage::Pose(p) => finite_point(p.into()).map(|position| GameEvent::Pose {
            player_id,
            position,
        }),
        ClientMessage::PushablePose(p) => {
            finite_point(Vec2::new(p.x, p.y)).map(|position| GameEvent::PushablePose {
                player_id,
                pushable_id: p.id,
                position,
            })
        }
        ClientMessage::EmitStart(start) => {
            finite_point(start.aim.into()).map(|aim| GameEvent::EmitStart {
                player_id,
                aim,
                mode: start.mode.into(),
            })
        }
        ClientMessage::EmitUpdateAim(update) => {
            finite_point(update.aim.into()).map(|aim| GameEvent::EmitUpdateAim { player_id, aim })
        }
        ClientMessage::EmitStop => Some(GameEvent::EmitStop { player_id }),
    }
}

fn process_client_message(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msg: ClientMessage,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    if matches!(msg, ClientMessage::Join(_)) {
        // Ignore repeated Join packets after bootstrap to keep the session stable.
        if should_log(last_invalid_input_log) {
            warn!(player_id, "duplicate join ignored");
        }
        return Ok(LoopControl::Continue);
    }

    let Some(event) = to_game_event(player_id, msg) else {
        if should_log(last_invalid_input_log) {
            warn!(player_id, "invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    // EmitStop must not be lost or the session keeps spending; everything else may drop.
    let is_stop = matches!(event, GameEvent::EmitStop { .. });
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, is_stop, "input channel full; dropping input");
            }
            if is_stop {
                let tx = input_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(evt).await;
                });
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        world_bytes_rx,
        replay_bytes_rx,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_world_lag_log,
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
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
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

            // Outgoing World Update
            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending replay");
                        }

                        // Resync strategy: retained state covers every missed door/arc/cone.
                        let latest = replay_bytes_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            let bytes_len = latest.len();
                            *lag_recovery_count += 1;
                            let outcome = forward_bytes(latest, socket, msgs_out, bytes_out).await;

                            if should_log(last_world_lag_log) {
                                debug!(
                                    player_id,
                                    bytes = bytes_len,
                                    count = *lag_recovery_count,
                                    "sent lag recovery replay"
                                );
                            }

                            match outcome {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
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
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *lag_recovery_count,
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
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => process_client_message(
                        player_id,
                        input_tx,
                        msg,
                        last_input_full_log,
                        last_invalid_input_log,
                    ),
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
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
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = msg.len();
    match socket.send(Message::Text(msg)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,
) -> Result<(), NetError> {
    // Leave releases plates, ownership and emitter sessions held by this player.
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
