//! News role (§4.3): the first socket a client connects to. Three opcodes,
//! none of which touch the database.

use bytes::{BufMut, Bytes};
use std::sync::Arc;

use crate::errors::ServerResult;
use crate::protocol::{opcodes, Dialect, Frame};
use crate::roles::{advertised_ip, login_port, main_port, peer_ipv4, role_tag, SERVER_VERSION};
use crate::session::{Router, SessionContext};
use crate::state::AppState;
use crate::utils::fixed::write_greeting;

pub fn router() -> Router {
    Router::new()
        .route(opcodes::NEWS_GREETING, greeting)
        .route(opcodes::NEWS_SERVER_LIST, server_list)
        .route(opcodes::NEWS_TIME, time)
}

async fn greeting(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let ip = peer_ipv4(&ctx);

    let body = if state.services.banned_list.is_banned(ip) {
        write_greeting(
            &format!("fiveserver v{SERVER_VERSION}"),
            "Your IP address has been banned from this server.",
        )
    } else {
        let capacity: u32 = state.config.lobbies.iter().map(|lobby| lobby.max_players).sum();
        let online = state.services.sessions.count() as u32;
        if online >= capacity {
            write_greeting(&format!("fiveserver v{SERVER_VERSION}"), "Server is full, please try again later.")
        } else {
            write_greeting(&format!("fiveserver v{SERVER_VERSION}"), "Welcome to fiveserver.")
        }
    };

    Ok(Frame::new(opcodes::NEWS_GREETING + 1, body))
}

/// dialect-A orders (Main, NetworkMenu, Login); dialect-B orders (Login,
/// Main, NetworkMenu) (§6).
async fn server_list(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let ip = advertised_ip(&state);
    let login = (login_port(&state, ctx.dialect), role_tag::LOGIN);
    let main = (main_port(&state, ctx.dialect), role_tag::MAIN);
    let menu = (state.config.ports.network_menu, role_tag::NETWORK_MENU);

    let ordered = match ctx.dialect {
        Dialect::A => [main, menu, login],
        Dialect::B => [login, main, menu],
    };

    let mut body = Vec::with_capacity(ordered.len() * 8);
    for (port, tag) in ordered {
        body.extend_from_slice(&ip.octets());
        body.extend_from_slice(&port.to_be_bytes());
        body.extend_from_slice(&tag.to_be_bytes());
    }

    Ok(Frame::new(opcodes::NEWS_SERVER_LIST + 1, body))
}

async fn time(_state: Arc<AppState>, _ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32;

    let mut body = Vec::with_capacity(4);
    body.put_u32(now);
    Ok(Frame::new(opcodes::NEWS_TIME + 1, body))
}
