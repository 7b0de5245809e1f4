// src/input/mod.rs

//! Inbound control stream: injected pointer, key, resize and quit commands.

pub mod command;
pub mod source;

pub use command::{ControlCommand, LineSplitter};
pub use source::{CommandSource, FifoCommandSource};
