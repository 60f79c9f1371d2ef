//! Crate-wide error type. Unifies infrastructure failures (I/O, database,
//! HTTP) behind `#[from]` conversions and gives the wire-level taxonomy of
//! the protocol (§7) explicit variants carrying their fixed error code.

use thiserror::Error;

/// Error code returned to an unauthenticated-or-unknown user at login.
pub const WIRE_UNKNOWN_USER: u32 = 0xffffff10;
/// Error code returned when the same user is already logged in elsewhere.
pub const WIRE_ALREADY_ONLINE: u32 = 0xffffff11;
/// Error code returned when roster-hash enforcement rejects the client.
pub const WIRE_ROSTER_HASH_REJECTED: u32 = 0xffffff12;
/// Error code returned when a profile name is already taken.
pub const WIRE_PROFILE_NAME_TAKEN: u32 = 0xfffffefc;
/// Error code returned when a room name is already taken within a lobby.
pub const WIRE_ROOM_NAME_TAKEN: u32 = 0xffffff10;
/// Error code returned when a room's password does not match.
pub const WIRE_ROOM_PASSWORD_WRONG: u32 = 0xfffffdda;
/// Error code returned when a room is already at capacity.
pub const WIRE_ROOM_FULL: u32 = 0xfffffdb6;
/// Error code returned when a join/challenge deadline has already passed.
pub const WIRE_DEADLINE_PASSED: u32 = 0xfffffdbb;
/// Error code returned when a forced-cancellation cooldown is still active.
pub const WIRE_STILL_CANCELLED: u32 = 0xfffffe00;
/// Generic internal-error wire code for storage/network failures mid-session.
pub const WIRE_INTERNAL: u32 = 0xffffffff;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("bad checksum on inbound frame")]
    BadChecksum,

    #[error("malformed frame")]
    MalformedFrame,

    #[error("unknown user")]
    UnknownUser,

    #[error("user already online")]
    AlreadyOnline,

    #[error("roster hash rejected")]
    RosterHashRejected,

    #[error("profile name already taken")]
    ProfileNameTaken,

    #[error("room name already taken")]
    RoomNameTaken,

    #[error("room password incorrect")]
    RoomPasswordWrong,

    #[error("room is full")]
    RoomFull,

    #[error("deadline already passed")]
    DeadlinePassed,

    #[error("participation cancellation still active")]
    StillCancelled,
}

impl ServerError {
    /// Maps an error down to its fixed wire error code, or `None` if the
    /// error has no wire representation (e.g. `BadChecksum`, which always
    /// closes the connection instead).
    pub fn wire_code(&self) -> Option<u32> {
        match self {
            ServerError::UnknownUser => Some(WIRE_UNKNOWN_USER),
            ServerError::AlreadyOnline => Some(WIRE_ALREADY_ONLINE),
            ServerError::RosterHashRejected => Some(WIRE_ROSTER_HASH_REJECTED),
            ServerError::ProfileNameTaken => Some(WIRE_PROFILE_NAME_TAKEN),
            ServerError::RoomNameTaken => Some(WIRE_ROOM_NAME_TAKEN),
            ServerError::RoomPasswordWrong => Some(WIRE_ROOM_PASSWORD_WRONG),
            ServerError::RoomFull => Some(WIRE_ROOM_FULL),
            ServerError::DeadlinePassed => Some(WIRE_DEADLINE_PASSED),
            ServerError::StillCancelled => Some(WIRE_STILL_CANCELLED),
            ServerError::Database(_) | ServerError::Http(_) | ServerError::Io(_) => {
                Some(WIRE_INTERNAL)
            }
            ServerError::BadChecksum
            | ServerError::MalformedFrame
            | ServerError::Configuration(_) => None,
        }
    }

    /// Whether this error, once surfaced, should close the connection
    /// (per §7's taxonomy) rather than let the session continue.
    pub fn closes_connection(&self) -> bool {
        matches!(
            self,
            ServerError::BadChecksum
                | ServerError::MalformedFrame
                | ServerError::UnknownUser
                | ServerError::AlreadyOnline
                | ServerError::RosterHashRejected
        )
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
