pub mod frame;
pub mod opcodes;

pub use frame::{Frame, FrameCodec};
pub use opcodes::Dialect;
