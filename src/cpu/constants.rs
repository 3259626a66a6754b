// Flag masks live with the register file; re-exported here so the handler
// modules can pull everything through `super::constants::*`.
pub use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

// T-cycle costs outside the opcode tables
pub const INTERRUPT_DISPATCH_CYCLES: u16 = 20; // 5 machine cycles
pub const HALT_IDLE_CYCLES: u16 = 4; // One machine cycle per halted step

pub const CB_PREFIX: u8 = 0xCB;
