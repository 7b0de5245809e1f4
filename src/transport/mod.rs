// src/transport/mod.rs

//! Outbound frame stream: wire format, the render/transport handoff, and the
//! thread that writes finished frames to a named pipe.

pub mod frame;
pub mod mailbox;
pub mod sink;
pub mod streamer;

pub use frame::{read_frame, write_frame, Frame, FrameHeader, FRAME_MAGIC};
pub use mailbox::FrameMailbox;
pub use sink::{FifoFrameSink, FrameSink};
pub use streamer::FrameStreamer;
