//! Small type aliases used across the crate so signatures read as domain
//! concepts rather than bare integers.

pub type UserId = u32;
pub type ProfileId = u32;
pub type MatchId = u32;
pub type LobbyId = u32;
pub type RoomId = u32;

/// Wire opcode, as read straight off the frame header.
pub type Opcode = u16;
