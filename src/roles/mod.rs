//! The four connection roles (§4.3–§4.6): each is a [`Router`] built once
//! per accepted TCP connection and bound to a single physical port, the way
//! §6 describes the News 0x2005 response handing clients off between
//! dedicated News/Login/NetworkMenu/Main sockets rather than one socket
//! that renegotiates its role.

pub mod login;
pub mod main_role;
pub mod network_menu;
pub mod news;

use std::net::Ipv4Addr;

use crate::protocol::Dialect;
use crate::session::SessionContext;
use crate::state::AppState;

/// Reported in the News greeting title.
pub const SERVER_VERSION: &str = "1.0";

/// Role tags carried in the 0x2005 server-list response (§4.3, §6); values
/// are this server's own convention, not a wire format borrowed from a
/// specific client build.
pub mod role_tag {
    pub const LOGIN: u16 = 1;
    pub const MAIN: u16 = 2;
    pub const NETWORK_MENU: u16 = 3;
}

pub fn peer_ipv4(ctx: &SessionContext) -> Ipv4Addr {
    match ctx.peer_addr.ip() {
        std::net::IpAddr::V4(ip) => ip,
        std::net::IpAddr::V6(ip) => ip.to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
    }
}

/// The address this server advertises to clients for follow-up connections:
/// the probed WAN IP once known, else the configured bind host.
pub fn advertised_ip(state: &AppState) -> Ipv4Addr {
    if let Some(ip) = *state.services.wan_ip.server_ip.read() {
        return ip;
    }
    match state.config.host {
        std::net::IpAddr::V4(ip) => ip,
        std::net::IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    }
}

/// Dialect-A uses Login-A's port, dialect-B uses Login-B's.
pub fn login_port(state: &AppState, dialect: Dialect) -> u16 {
    match dialect {
        Dialect::A => state.config.ports.login_a,
        Dialect::B => state.config.ports.login_b,
    }
}

/// Dialect-A uses Main-A's port, dialect-B uses Main-B's.
pub fn main_port(state: &AppState, dialect: Dialect) -> u16 {
    match dialect {
        Dialect::A => state.config.ports.main_a,
        Dialect::B => state.config.ports.main_b,
    }
}
