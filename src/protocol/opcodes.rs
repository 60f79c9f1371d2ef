//! Named opcodes for the handlers described in §4.3–§4.6. Dialect-A and
//! dialect-B share most of the News/Login/NetworkMenu surface but diverge in
//! the Main (room & match) role, so opcodes that differ by dialect are
//! grouped under that dialect's own constant.

/// Heartbeat, handled identically by every role (§4.1).
pub const HEARTBEAT: u16 = 0x0005;
pub const DISCONNECT: u16 = 0x0003;

// --- News role (§4.3) ---
pub const NEWS_GREETING: u16 = 0x2008;
pub const NEWS_SERVER_LIST: u16 = 0x2005;
pub const NEWS_TIME: u16 = 0x2006;

// --- Login role (§4.4) ---
pub const LOGIN_AUTHENTICATE: u16 = 0x3003;
pub const LOGIN_GET_PROFILES: u16 = 0x3010;
pub const LOGIN_CREATE_PROFILE: u16 = 0x3020;
pub const LOGIN_DELETE_PROFILE: u16 = 0x3030;
pub const LOGIN_SELECT_PROFILE: u16 = 0x3040;
pub const LOGIN_SETTINGS_GET_1: u16 = 0x308a;
pub const LOGIN_MATCH_SERIES_EXIT: u16 = 0x3087;
pub const LOGIN_SETTINGS_GET_2: u16 = 0x3088;
pub const LOGIN_SETTINGS_SET: u16 = 0x3089;

// --- NetworkMenu role (§4.5) ---
pub const MENU_GET_LOBBIES: u16 = 0x4200;
pub const MENU_SELECT_LOBBY: u16 = 0x4202;
pub const MENU_GET_USER_LIST: u16 = 0x4210;
pub const MENU_GET_ROOM_LIST: u16 = 0x4300;
pub const MENU_FAVOURITE_TEAM: u16 = 0x4110;
pub const MENU_FAVOURITE_PLAYER: u16 = 0x4114;
pub const MENU_QUICK_MATCH_SEARCH: u16 = 0x4a00;

// --- Main role: room lifecycle (§4.6) ---
pub const MAIN_CREATE_ROOM: u16 = 0x4310;
pub const MAIN_EXIT_ROOM: u16 = 0x432a;
pub const MAIN_JOIN: u16 = 0x4320;
pub const MAIN_CHALLENGE_RESPONSE: u16 = 0x4323;
pub const MAIN_PEER_INFO: u16 = 0x4330;
pub const MAIN_PEER_INFO_ACK: u16 = 0x4347;
pub const MAIN_CHAT: u16 = 0x4400;
pub const MAIN_PING: u16 = 0x4b00;
pub const MAIN_ROOM_RENAME: u16 = 0x434d;
pub const MAIN_OWNER_CHANGE: u16 = 0x4349;
pub const MAIN_FORCED_CANCEL: u16 = 0x4380;

// --- Main role: dialect-A specific ---
pub const A_TOGGLE_READY: u16 = 0x4360;
pub const A_TEAM_SELECT: u16 = 0x4366;
pub const A_GOAL_SCORED: u16 = 0x4368;
pub const A_MATCH_EXIT: u16 = 0x4370;

// --- Main role: dialect-B specific ---
pub const B_TOGGLE_READY: u16 = 0x436f;
pub const B_TEAM_SELECT: u16 = 0x4373;
pub const B_GOAL_SCORED: u16 = 0x4375;
pub const B_MATCH_STATE: u16 = 0x4377;
pub const B_CLOCK: u16 = 0x4385;

/// Chat sub-type prefixes, the first two bytes of a 0x4400 body (§4.6).
pub mod chat_kind {
    pub const LOBBY_BROADCAST: [u8; 2] = [0x00, 0x01];
    pub const PRIVATE: [u8; 2] = [0x00, 0x02];
    pub const ROOM_A: [u8; 2] = [0x01, 0x02];
    pub const ROOM_B_MATCH: [u8; 2] = [0x01, 0x08];
    pub const ROOM_B_STADIUM: [u8; 2] = [0x01, 0x05];
    pub const ROOM_B_ALT: [u8; 2] = [0x01, 0x07];
}

/// Which legacy client dialect a connection belongs to. Decided per TCP
/// port at bind time (§6: dialect-A and dialect-B Login/Main ports differ).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    A,
    B,
}
