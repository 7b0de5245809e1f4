// src/transport/streamer.rs

use super::mailbox::FrameMailbox;
use super::sink::FrameSink;
use anyhow::{Context, Result};
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background thread draining the mailbox into a [`FrameSink`].
pub struct FrameStreamer {
    mailbox: Arc<FrameMailbox>,
    kill: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FrameStreamer {
    /// Spawns the transport thread.
    ///
    /// `poll_interval` bounds how long the thread waits for a frame before
    /// re-checking its kill flag.
    pub fn spawn<S>(mut sink: S, mailbox: Arc<FrameMailbox>, poll_interval: Duration) -> Result<Self>
    where
        S: FrameSink + 'static,
    {
        let kill = Arc::new(AtomicBool::new(false));
        let thread_mailbox = Arc::clone(&mailbox);
        let thread_kill = Arc::clone(&kill);

        let thread_handle = thread::Builder::new()
            .name("frame-transport".to_string())
            .spawn(move || {
                info!("FrameStreamer: Started");
                let mut sent: u64 = 0;
                while !thread_kill.load(Ordering::Acquire) {
                    let Some(frame) = thread_mailbox.take(poll_interval) else {
                        if thread_mailbox.is_closed() {
                            break;
                        }
                        continue;
                    };
                    sink.send_frame(&frame, &thread_kill);
                    thread_mailbox.finish(frame);
                    sent += 1;
                }
                debug!("FrameStreamer: Thread exiting after {} frames", sent);
            })
            .context("Failed to spawn frame transport thread")?;

        info!("FrameStreamer spawned successfully");
        Ok(Self {
            mailbox,
            kill,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Raises the kill flag, wakes the thread and joins it.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        self.kill.store(true, Ordering::Release);
        self.mailbox.close();
        if let Err(e) = handle.join() {
            error!("FrameStreamer thread panicked: {:?}", e);
        }
        info!("FrameStreamer: Stopped");
    }
}

impl Drop for FrameStreamer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, PixelFormat};
    use crate::transport::frame::Frame;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Frame>>>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&mut self, frame: &Frame, _shutdown: &AtomicBool) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    #[test_log::test]
    fn test_every_published_frame_is_delivered_once() {
        let sink = RecordingSink::default();
        let mailbox = Arc::new(FrameMailbox::new());
        let mut streamer =
            FrameStreamer::spawn(sink.clone(), Arc::clone(&mailbox), Duration::from_millis(1))
                .unwrap();

        let canvas = Canvas::new(3, 1, PixelFormat::Rgba8888, false).unwrap();
        for _ in 0..5 {
            assert!(mailbox.publish(&canvas));
        }
        mailbox.wait_consumed();
        streamer.shutdown();

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.width == 3 && f.pixels.len() == 12));
    }

    #[test_log::test]
    fn test_shutdown_is_idempotent_and_closes_mailbox() {
        let mailbox = Arc::new(FrameMailbox::new());
        let mut streamer = FrameStreamer::spawn(
            RecordingSink::default(),
            Arc::clone(&mailbox),
            Duration::from_millis(1),
        )
        .unwrap();
        assert!(streamer.is_running());
        streamer.shutdown();
        streamer.shutdown();
        assert!(!streamer.is_running());
        assert!(mailbox.is_closed());
    }
}
