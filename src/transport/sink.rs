// src/transport/sink.rs

use super::frame::Frame;
use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::stat::Mode;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::os::unix::io::{AsFd, AsRawFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Destination of finished frames, driven by the transport thread.
pub trait FrameSink: Send {
    /// Delivers one frame.
    ///
    /// Implementations may block while the consumer is away, but must give up
    /// once `shutdown` is set.
    fn send_frame(&mut self, frame: &Frame, shutdown: &AtomicBool);
}

/// Writes frames into a named pipe, recreating it whenever the peer goes away.
///
/// The node is (re)created with mode 0666. Opening for writing is retried
/// until a reader shows up, so no frame is written into the void; once
/// connected the descriptor is blocking and a slow reader stalls the
/// transport thread.
#[derive(Debug)]
pub struct FifoFrameSink {
    path: PathBuf,
    file: Option<File>,
    retry_interval: Duration,
}

/// Device and inode of a filesystem object.
fn identity(meta: &fs::Metadata) -> (u64, u64) {
    (meta.dev(), meta.ino())
}

fn make_fifo(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("failed to unlink {}", path.display())),
    }
    nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o666))
        .with_context(|| format!("failed to create FIFO {}", path.display()))
}

fn set_blocking(file: &File) -> io::Result<()> {
    let flags = fcntl(file.as_fd(), FcntlArg::F_GETFL)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.remove(OFlag::O_NONBLOCK);
    fcntl(file.as_fd(), FcntlArg::F_SETFL(flags))?;
    trace!("FifoFrameSink: fd {} now blocking", file.as_raw_fd());
    Ok(())
}

impl FifoFrameSink {
    /// Creates the FIFO node at `path`, replacing whatever was there.
    pub fn create(path: impl Into<PathBuf>, retry_interval: Duration) -> Result<Self> {
        let path = path.into();
        make_fifo(&path)?;
        info!("FifoFrameSink: created {}", path.display());
        Ok(Self {
            path,
            file: None,
            retry_interval,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    fn recreate(&mut self) {
        // Unlink before closing so nobody can open the old node afterwards.
        let result = make_fifo(&self.path);
        self.file = None;
        match result {
            Ok(()) => warn!("FifoFrameSink: recreated {}", self.path.display()),
            Err(e) => error!("FifoFrameSink: {:#}", e),
        }
    }

    /// One non-blocking open attempt. `Ok(false)` means no reader yet.
    fn try_open(&mut self) -> io::Result<bool> {
        let file = match OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.raw_os_error() == Some(libc::ENXIO) => return Ok(false),
            Err(e) => return Err(e),
        };
        set_blocking(&file)?;
        self.file = Some(file);
        Ok(true)
    }

    /// Waits for a reader. Returns `false` if shutdown was requested first.
    fn connect(&mut self, shutdown: &AtomicBool) -> bool {
        while !shutdown.load(Ordering::Acquire) {
            match self.try_open() {
                Ok(true) => {
                    debug!("FifoFrameSink: reader connected on {}", self.path.display());
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("FifoFrameSink: open {} failed: {}", self.path.display(), e);
                    self.recreate();
                }
            }
            thread::sleep(self.retry_interval);
        }
        false
    }

    /// Whether the open descriptor is still a FIFO reachable through `path`.
    fn endpoint_intact(&self) -> bool {
        let Some(file) = &self.file else {
            return true;
        };
        let Ok(ours) = file.metadata() else {
            return false;
        };
        if !ours.file_type().is_fifo() {
            return false;
        }
        match fs::symlink_metadata(&self.path) {
            Ok(on_disk) => identity(&on_disk) == identity(&ours),
            Err(_) => false,
        }
    }
}

impl FrameSink for FifoFrameSink {
    fn send_frame(&mut self, frame: &Frame, shutdown: &AtomicBool) {
        if !self.endpoint_intact() {
            warn!(
                "FifoFrameSink: {} no longer refers to our FIFO",
                self.path.display()
            );
            self.recreate();
        }

        let header = frame.header().to_bytes();
        loop {
            if self.file.is_none() && !self.connect(shutdown) {
                return;
            }
            let Some(file) = self.file.as_mut() else {
                continue;
            };
            match file.write_all(&header) {
                Ok(()) => break,
                Err(e) => {
                    warn!("FifoFrameSink: header write failed: {}", e);
                    self.recreate();
                }
            }
        }

        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = file.write_all(&frame.pixels) {
            // Not resent; the next frame supersedes it.
            warn!("FifoFrameSink: payload write failed: {}", e);
            if e.kind() == io::ErrorKind::BrokenPipe {
                self.recreate();
            } else {
                self.file = None;
            }
            return;
        }
        trace!(
            "FifoFrameSink: wrote {}x{} frame ({} bytes)",
            frame.width,
            frame.height,
            frame.pixels.len()
        );
    }
}

impl Drop for FifoFrameSink {
    fn drop(&mut self) {
        self.file = None;
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("FifoFrameSink: failed to unlink {}: {}", self.path.display(), e);
            }
        }
        debug!("FifoFrameSink: closed {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::frame::read_frame;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    fn frame(fill: u8) -> Frame {
        Frame {
            width: 2,
            height: 2,
            pixels: vec![fill; 16],
        }
    }

    /// Reads one frame, reopening until a live writer delivers it.
    fn read_one(path: PathBuf) -> thread::JoinHandle<Frame> {
        thread::spawn(move || loop {
            match File::open(&path) {
                Ok(mut f) => {
                    if let Ok(frame) = read_frame(&mut f) {
                        return frame;
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => panic!("open failed: {}", e),
            }
            thread::sleep(Duration::from_millis(2));
        })
    }

    #[test_log::test]
    fn test_create_replaces_existing_file_with_fifo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fifo");
        fs::write(&path, b"stale").unwrap();
        let sink = FifoFrameSink::create(&path, Duration::from_millis(1)).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(!sink.is_connected());
        assert!(fs::metadata(sink.path()).unwrap().file_type().is_fifo());
        drop(sink);
        assert!(!path.exists());
    }

    #[test_log::test]
    fn test_frame_reaches_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fifo");
        let mut sink = FifoFrameSink::create(&path, Duration::from_millis(1)).unwrap();
        let reader = read_one(path.clone());
        sink.send_frame(&frame(7), &AtomicBool::new(false));
        assert_eq!(reader.join().unwrap(), frame(7));
    }

    #[test_log::test]
    fn test_reconnects_after_reader_leaves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fifo");
        let mut sink = FifoFrameSink::create(&path, Duration::from_millis(1)).unwrap();
        let no_shutdown = AtomicBool::new(false);

        let first = read_one(path.clone());
        sink.send_frame(&frame(1), &no_shutdown);
        assert_eq!(first.join().unwrap(), frame(1));

        let second = read_one(path.clone());
        sink.send_frame(&frame(2), &no_shutdown);
        assert_eq!(second.join().unwrap(), frame(2));
    }

    #[test_log::test]
    fn test_replaced_node_is_recreated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fifo");
        let mut sink = FifoFrameSink::create(&path, Duration::from_millis(1)).unwrap();
        let no_shutdown = AtomicBool::new(false);

        let first = read_one(path.clone());
        sink.send_frame(&frame(1), &no_shutdown);
        first.join().unwrap();

        fs::remove_file(&path).unwrap();
        fs::write(&path, b"not a fifo").unwrap();
        assert!(!sink.endpoint_intact());

        let second = read_one(path.clone());
        sink.send_frame(&frame(3), &no_shutdown);
        assert_eq!(second.join().unwrap(), frame(3));
        assert!(fs::metadata(&path).unwrap().file_type().is_fifo());
    }

    #[test_log::test]
    fn test_shutdown_abandons_wait_for_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fifo");
        let mut sink = FifoFrameSink::create(&path, Duration::from_millis(1)).unwrap();
        sink.send_frame(&frame(0), &AtomicBool::new(true));
        assert!(!sink.is_connected());
    }
}
