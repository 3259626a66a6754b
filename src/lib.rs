//! Execution core for a handheld console built around a Sharp LR35902
//! derivative: table-driven CPU interpreter, 64 KiB memory bus, interrupt
//! controller, and a two-thread clock driver. Video and input stay on the
//! host side of the fence; the host hands in a ROM image and a per-frame
//! video callback and injects button state as an 8-bit mask.

pub mod cartridge;
pub mod clock;
pub mod console;
pub mod cpu;
pub mod interrupts;
pub mod joypad;
pub mod memory_bus;
pub mod memory_map;
pub mod registers;
pub mod screen;

pub use cartridge::Cartridge;
pub use clock::ClockDriver;
pub use console::Console;
pub use cpu::Cpu;
pub use memory_bus::{BusBuilder, MemoryBus};
pub use registers::{Registers, Selector};
pub use screen::{CallbackScreen, Screen};
