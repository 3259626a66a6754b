//! Host input line.
//!
//! The host delivers button state as an 8-bit mask (bits 0-3 directional:
//! right, left, up, down; bits 4-7 action: A, B, select, start) from its own
//! thread. The mask lands in the byte the bus serves at 0xFF00; a relaxed
//! atomic is enough because the CPU samples it only at opcode boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

pub const BUTTON_RIGHT: u8 = 1 << 0;
pub const BUTTON_LEFT: u8 = 1 << 1;
pub const BUTTON_UP: u8 = 1 << 2;
pub const BUTTON_DOWN: u8 = 1 << 3;
pub const BUTTON_A: u8 = 1 << 4;
pub const BUTTON_B: u8 = 1 << 5;
pub const BUTTON_SELECT: u8 = 1 << 6;
pub const BUTTON_START: u8 = 1 << 7;

/// Shared handle to the joypad register byte. Clones refer to the same
/// underlying byte; one side is held by the memory bus, the other by the
/// host-facing console.
#[derive(Debug, Clone, Default)]
pub struct JoypadPort {
    line: Arc<AtomicU8>,
}

impl JoypadPort {
    pub fn new() -> Self {
        JoypadPort {
            line: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Host side: publish the current button mask.
    #[inline(always)]
    pub fn set_mask(&self, mask: u8) {
        self.line.store(mask, Ordering::Relaxed);
    }

    /// Bus side: sample the byte served at 0xFF00.
    #[inline(always)]
    pub fn read(&self) -> u8 {
        self.line.load(Ordering::Relaxed)
    }

    /// Bus side: a program store to 0xFF00 lands in the same byte.
    #[inline(always)]
    pub fn write(&self, value: u8) {
        self.line.store(value, Ordering::Relaxed);
    }
}
