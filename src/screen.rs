//! Host video surface.
//!
//! The core does not rasterize; a graphics collaborator fills the shared
//! frame buffer and the clock driver's pacer thread hands a snapshot of it
//! to the host once per frame.

use std::sync::{Arc, Mutex};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
/// Samples per frame: 8-bit grayscale, row-major, top row first.
pub const FRAME_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Receives one finished frame per pacer tick.
pub trait Screen {
    fn draw(&mut self, frame: &[u8; FRAME_SIZE]);
}

/// Adapts a plain video callback to the `Screen` trait.
pub struct CallbackScreen<F: FnMut(&[u8])> {
    callback: F,
}

impl<F: FnMut(&[u8])> CallbackScreen<F> {
    pub fn new(callback: F) -> Self {
        CallbackScreen { callback }
    }
}

impl<F: FnMut(&[u8])> Screen for CallbackScreen<F> {
    fn draw(&mut self, frame: &[u8; FRAME_SIZE]) {
        (self.callback)(frame);
    }
}

/// Shared frame storage. The producer publishes between CPU steps, the
/// pacer copies it out; the lock is held only for the memcpy either way.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: Arc<Mutex<Box<[u8; FRAME_SIZE]>>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: Arc::new(Mutex::new(Box::new([0; FRAME_SIZE]))),
        }
    }

    /// Replaces the published frame.
    pub fn publish(&self, frame: &[u8; FRAME_SIZE]) {
        let mut pixels = self.pixels.lock().expect("frame buffer poisoned");
        pixels.copy_from_slice(frame);
    }

    /// Copies the most recently published frame into `out`.
    pub fn snapshot(&self, out: &mut [u8; FRAME_SIZE]) {
        let pixels = self.pixels.lock().expect("frame buffer poisoned");
        out.copy_from_slice(&pixels[..]);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_sees_published_frame() {
        let buffer = FrameBuffer::new();
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = 0x11;
        frame[FRAME_SIZE - 1] = 0x22;
        buffer.publish(&frame);

        let mut out = [0u8; FRAME_SIZE];
        buffer.clone().snapshot(&mut out);
        assert_eq!(out[0], 0x11);
        assert_eq!(out[FRAME_SIZE - 1], 0x22);
    }

    #[test]
    fn callback_screen_forwards_frames() {
        let mut seen = 0usize;
        {
            let mut screen = CallbackScreen::new(|frame: &[u8]| {
                seen = frame.len();
            });
            screen.draw(&[0u8; FRAME_SIZE]);
        }
        assert_eq!(seen, FRAME_SIZE);
    }
}
