//! Per-connection driving loop (§4.2): frames a raw TCP stream with
//! [`FrameCodec`], serializes handler execution (each inbound frame's
//! handler runs to completion before the next is read, per §5's ordering
//! guarantee), and answers the uniform heartbeat/unknown-opcode contract
//! before handing anything off to a role's [`Router`].

pub mod context;
pub mod router;

pub use context::SessionContext;
pub use router::{Handler, Router};

use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::protocol::{Dialect, Frame, FrameCodec};
use crate::state::AppState;

/// Drives one accepted connection until it closes or a fatal protocol error
/// occurs. `router` is the opcode table for whichever role owns this port;
/// Main additionally swaps its router mid-connection as the client moves
/// between NetworkMenu and Main opcodes, but each of those roles is bound to
/// its own TCP port in this design (§6), so a single router suffices here.
pub async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    dialect: Dialect,
    state: Arc<AppState>,
    router: Router,
) {
    let framed = Framed::new(stream, FrameCodec::default());
    let (mut sink, mut stream) = framed.split();

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Frame>();
    let ctx = Arc::new(SessionContext::new(peer_addr, dialect, outbox_tx));

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(next) = stream.next().await {
        let frame = match next {
            Ok(frame) => frame,
            Err(err) => {
                warn!("{peer_addr}: closing connection after frame error: {err}");
                break;
            }
        };

        if frame.opcode == crate::protocol::opcodes::HEARTBEAT {
            let _ = ctx.outbox.send(Frame::new(frame.opcode, frame.body.clone()));
            continue;
        }

        let response = match router.get(frame.opcode) {
            Some(handler) => handler.call(state.clone(), ctx.clone(), frame.body.clone()).await,
            None => {
                debug!("{peer_addr}: no handler for opcode {:#06x}", frame.opcode);
                Ok(Frame::empty_ok(frame.opcode.wrapping_add(1)))
            }
        };

        let (outgoing, should_close) = match response {
            Ok(frame) => (frame, false),
            Err(err) => {
                let close = err.closes_connection();
                match err.wire_code() {
                    Some(code) => (Frame::error(frame.opcode.wrapping_add(1), code), close),
                    None => {
                        warn!("{peer_addr}: fatal protocol error: {err}");
                        break;
                    }
                }
            }
        };

        if ctx.outbox.send(outgoing).is_err() || should_close {
            break;
        }
    }

    run_cancellation_sequence(&state, &ctx).await;

    drop(ctx);
    let _ = writer.await;
}

/// §5 "closing the transport is the only cancellation signal": runs the
/// four-step disconnect sequence for whatever role state this particular
/// connection actually populated — a News/Login connection has none of it,
/// a NetworkMenu connection has at most a lobby, a Main connection has at
/// most a room.
async fn run_cancellation_sequence(state: &Arc<AppState>, ctx: &SessionContext) {
    let placement = ctx.placement();

    if let (Some(lobby_id), Some(room_id)) = (placement.lobby_id, placement.room_id) {
        if let Some(lobby) = state.services.lobbies.get(lobby_id) {
            if let Some(profile) = ctx.profile() {
                crate::roles::main_role::handle_room_disconnect(state, &lobby, room_id, profile.profile_id).await;
            }
            crate::roles::main_role::leave_room(state, ctx);
        }
    }

    if placement.lobby_id.is_some() {
        crate::roles::network_menu::leave_lobby(state, ctx);
    }

    if let Some(identity) = ctx.identity() {
        state.services.sessions.mark_offline(&identity.hash);
    }
}
