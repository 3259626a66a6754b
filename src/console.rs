//! Host-facing facade over the execution core.
//!
//! Lifecycle: `init` validates the ROM and wires the machine together,
//! `launch` starts the clock driver, `handle_input` publishes a button
//! mask, `stop` terminates and joins both threads.

use crate::cartridge::Cartridge;
use crate::clock::{ClockDriver, Machine};
use crate::cpu::Cpu;
use crate::joypad::JoypadPort;
use crate::memory_bus::MemoryBus;
use crate::screen::{CallbackScreen, FrameBuffer, Screen};

pub struct Console {
    driver: ClockDriver,
    joypad: JoypadPort,
}

impl Console {
    /// Builds a console from a raw ROM image and a screen implementation.
    /// Fails on a malformed ROM (too short or unsupported hardware byte).
    pub fn init<S: Screen + Send + 'static>(rom: Vec<u8>, screen: S) -> Result<Self, String> {
        let cartridge = Cartridge::load(rom)?;
        let joypad = JoypadPort::new();
        let bus = MemoryBus::builder()
            .cartridge(cartridge)
            .joypad(joypad.clone())
            .build()?;
        let machine = Machine::new(Cpu::new(), bus);
        Ok(Console {
            driver: ClockDriver::new(machine, Box::new(screen)),
            joypad,
        })
    }

    /// `init` with a plain per-frame video callback instead of a `Screen`.
    pub fn init_with_callback<F>(rom: Vec<u8>, video_callback: F) -> Result<Self, String>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        Console::init(rom, CallbackScreen::new(video_callback))
    }

    /// Starts emulation. Calling twice is a no-op.
    pub fn launch(&mut self) {
        self.driver.start();
    }

    /// Publishes the host's button mask (bits 0-3 directional, 4-7 action)
    /// to the joypad byte at 0xFF00. Safe from any thread.
    pub fn handle_input(&self, mask: u8) {
        self.joypad.set_mask(mask);
    }

    pub fn pause(&self) {
        self.driver.pause();
    }

    pub fn resume(&self) {
        self.driver.resume();
    }

    /// Terminates both threads and waits for them to exit.
    pub fn stop(&mut self) {
        self.driver.terminate();
        self.driver.join();
    }

    /// The CPU fault that ended emulation, if there was one.
    pub fn last_fault(&self) -> Option<&str> {
        self.driver.last_fault()
    }

    /// Handle for the graphics collaborator to publish frames through.
    pub fn frame_buffer(&self) -> FrameBuffer {
        self.driver.frame_buffer()
    }
}
