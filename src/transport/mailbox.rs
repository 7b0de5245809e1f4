// src/transport/mailbox.rs

//! Single-slot handoff between the render loop and the transport thread.
//!
//! The render loop stages a copy of the root canvas and marks it ready; the
//! transport thread takes it, writes it out and hands the buffer back. A new
//! frame cannot be staged until the previous one has been handed back, so at
//! most one frame is ever in flight and a slow consumer stalls the producer.

use super::frame::Frame;
use crate::canvas::Canvas;
use log::trace;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Slot {
    /// A staged frame exists that has not been handed back yet.
    ready: bool,
    /// The staged frame while it waits to be taken.
    frame: Option<Frame>,
    /// Pixel buffer returned by the consumer, reused for the next frame.
    spare: Vec<u8>,
    closed: bool,
    published: u64,
}

#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    cond: Condvar,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle<'a>(&self, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
        self.cond
            .wait_while(guard, |s| s.ready && !s.closed)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the previously published frame has been fully consumed.
    pub fn wait_consumed(&self) {
        drop(self.wait_idle(self.lock()));
    }

    /// Stages a copy of `canvas` as the next frame.
    ///
    /// Waits for the previous frame first. Returns `false` once the mailbox
    /// is closed.
    pub fn publish(&self, canvas: &Canvas) -> bool {
        let mut slot = self.wait_idle(self.lock());
        if slot.closed {
            return false;
        }
        let mut pixels = std::mem::take(&mut slot.spare);
        canvas.write_rgba8888(&mut pixels);
        slot.frame = Some(Frame {
            width: canvas.width(),
            height: canvas.height(),
            pixels,
        });
        slot.ready = true;
        slot.published += 1;
        trace!(
            "FrameMailbox: published frame #{} ({}x{})",
            slot.published,
            canvas.width(),
            canvas.height()
        );
        self.cond.notify_all();
        true
    }

    /// Takes the staged frame, waiting up to `timeout` for one.
    ///
    /// The frame stays "in flight" until passed back to [`finish`](Self::finish).
    pub fn take(&self, timeout: Duration) -> Option<Frame> {
        let (mut slot, _) = self
            .cond
            .wait_timeout_while(self.lock(), timeout, |s| s.frame.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            return None;
        }
        slot.frame.take()
    }

    /// Marks the in-flight frame consumed and recycles its buffer.
    pub fn finish(&self, frame: Frame) {
        let mut slot = self.lock();
        slot.spare = frame.pixels;
        slot.ready = false;
        self.cond.notify_all();
    }

    /// Wakes every waiter; later publishes are refused.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.frame = None;
        slot.ready = false;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether a frame is staged or in flight.
    pub fn is_pending(&self) -> bool {
        self.lock().ready
    }

    /// Number of frames staged so far.
    pub fn published(&self) -> u64 {
        self.lock().published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelFormat;
    use crate::color::Rgba;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn canvas() -> Canvas {
        let mut c = Canvas::new(2, 2, PixelFormat::Rgba8888, false).unwrap();
        let v = c.map_rgba(Rgba::WHITE);
        c.put_pixel(0, 0, v);
        c
    }

    #[test_log::test]
    fn test_take_times_out_when_nothing_published() {
        let mb = FrameMailbox::new();
        assert!(mb.take(Duration::from_millis(5)).is_none());
        assert!(!mb.is_pending());
    }

    #[test_log::test]
    fn test_publish_take_finish_cycle() {
        let mb = FrameMailbox::new();
        assert!(mb.publish(&canvas()));
        assert!(mb.is_pending());

        let frame = mb.take(Duration::from_millis(5)).unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(&frame.pixels[0..4], &[255, 255, 255, 255]);
        // Taken but not finished: still in flight.
        assert!(mb.is_pending());

        mb.finish(frame);
        assert!(!mb.is_pending());
        assert_eq!(mb.published(), 1);
    }

    #[test_log::test]
    fn test_second_publish_waits_for_consumer() {
        let mb = Arc::new(FrameMailbox::new());
        assert!(mb.publish(&canvas()));

        let second_done = Arc::new(AtomicBool::new(false));
        let producer = {
            let mb = Arc::clone(&mb);
            let done = Arc::clone(&second_done);
            thread::spawn(move || {
                mb.publish(&canvas());
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!second_done.load(Ordering::SeqCst));

        let frame = mb.take(Duration::from_millis(5)).unwrap();
        mb.finish(frame);
        producer.join().unwrap();
        assert!(second_done.load(Ordering::SeqCst));
        assert_eq!(mb.published(), 2);
    }

    #[test_log::test]
    fn test_close_releases_blocked_producer() {
        let mb = Arc::new(FrameMailbox::new());
        assert!(mb.publish(&canvas()));
        let producer = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || mb.publish(&canvas()))
        };
        thread::sleep(Duration::from_millis(10));
        mb.close();
        assert!(!producer.join().unwrap());
        assert!(mb.take(Duration::from_millis(1)).is_none());
    }
}
