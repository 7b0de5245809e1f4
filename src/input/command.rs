// src/input/command.rs

//! Parsing of the ASCII control lines injected by the peer.

use crate::canvas::Point;
use crate::host::NavKey;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Resize { width: u32, height: u32 },
    Quit,
    Press(Point),
    Move(Point),
    Release(Point),
    Key(NavKey),
}

/// Parses `X-Y`, where both coordinates may carry a leading minus sign.
fn parse_point(args: &str) -> Option<Point> {
    // The separator is the first '-' that is not a sign of x.
    let split = args
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i)?;
    let x = args[..split].parse().ok()?;
    let y = args[split + 1..].parse().ok()?;
    Some(Point::new(x, y))
}

fn parse_size(args: &str) -> Option<(u32, u32)> {
    let (w, h) = args.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

impl ControlCommand {
    /// Parses one line (without its newline).
    ///
    /// Unknown verbs and malformed arguments yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, args) = match line.split_once('=') {
            Some((verb, args)) => (verb, Some(args)),
            None => (line, None),
        };

        let command = match (verb, args) {
            ("resize", Some(a)) => {
                parse_size(a).map(|(width, height)| Self::Resize { width, height })
            }
            ("press", Some(a)) => parse_point(a).map(Self::Press),
            ("move", Some(a)) => parse_point(a).map(Self::Move),
            ("release", Some(a)) => parse_point(a).map(Self::Release),
            ("quit", None) => Some(Self::Quit),
            ("left", None) => Some(Self::Key(NavKey::Left)),
            ("right", None) => Some(Self::Key(NavKey::Right)),
            ("up", None) => Some(Self::Key(NavKey::Up)),
            ("down", None) => Some(Self::Key(NavKey::Down)),
            ("zoomin", None) => Some(Self::Key(NavKey::ZoomIn)),
            ("zoomout", None) => Some(Self::Key(NavKey::ZoomOut)),
            _ => None,
        };
        if command.is_none() && !line.is_empty() {
            trace!("ControlCommand: ignoring {:?}", line);
        }
        command
    }
}

/// Splits a byte stream into lines across arbitrarily chunked reads.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Returns the unterminated tail, if any. Used when the writer closes.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}
