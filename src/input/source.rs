// src/input/source.rs

use super::command::LineSplitter;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use nix::sys::stat::Mode;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Supplier of raw control lines, polled from the host loop.
pub trait CommandSource {
    /// Returns every complete line available right now, without blocking.
    fn poll_lines(&mut self) -> Vec<String>;
}

/// Reads control lines from a named pipe opened non-blocking.
///
/// The pipe is created lazily on the first poll. A read error drops the
/// descriptor so the next poll recreates the node and reopens it.
#[derive(Debug)]
pub struct FifoCommandSource {
    path: PathBuf,
    file: Option<File>,
    lines: LineSplitter,
}

impl FifoCommandSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            lines: LineSplitter::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to unlink {}", self.path.display()))
            }
        }
        nix::unistd::mkfifo(&self.path, Mode::from_bits_truncate(0o666))
            .with_context(|| format!("failed to create FIFO {}", self.path.display()))?;
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
            .with_context(|| format!("failed to open FIFO {}", self.path.display()))?;
        info!("FifoCommandSource: listening on {}", self.path.display());
        self.file = Some(file);
        Ok(())
    }
}

impl CommandSource for FifoCommandSource {
    fn poll_lines(&mut self) -> Vec<String> {
        if self.file.is_none() {
            if let Err(e) = self.open() {
                warn!("FifoCommandSource: {:#}", e);
                return Vec::new();
            }
        }

        let mut out = Vec::new();
        let mut buf = [0u8; 128];
        while let Some(file) = self.file.as_mut() {
            match file.read(&mut buf) {
                Ok(0) => {
                    // No writer attached; a partial last line is complete now.
                    out.extend(self.lines.flush());
                    break;
                }
                Ok(n) => out.extend(self.lines.push(&buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("FifoCommandSource: read failed, reopening: {}", e);
                    self.file = None;
                }
            }
        }
        out
    }
}

impl Drop for FifoCommandSource {
    fn drop(&mut self) {
        if self.file.take().is_none() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    "FifoCommandSource: failed to unlink {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
        debug!("FifoCommandSource: closed {}", self.path.display());
    }
}
