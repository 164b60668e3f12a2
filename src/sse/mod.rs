//! Server-sent event wire handling: bytes to lines, lines to frames.

mod frame;
mod lines;

pub use frame::{parse_frames, Frame, FrameParser};
pub use lines::LineDecoder;
