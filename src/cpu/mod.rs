//! The CPU interpreter: executor state, the fetch/decode/execute step,
//! interrupt dispatch, and the shared ALU/flag helpers the opcode handlers
//! build on.

use crate::memory_bus::MemoryBus;
use crate::registers::Registers;
use instruction::{CB_INSTRUCTIONS, INSTRUCTIONS, Instruction};
use std::sync::atomic::{AtomicBool, Ordering};

// Declare submodules
mod constants;
#[macro_use]
mod ops_macros;
mod instruction;
mod ops_alu;
mod ops_cb;
mod ops_control;
mod ops_load;
mod ops_rot_shift;
#[cfg(test)]
mod tests;

pub use constants::*;
pub use instruction::{CB_INSTRUCTIONS as CB_OPCODE_TABLE, INSTRUCTIONS as OPCODE_TABLE};

// Type alias for CPU operation results
pub type CpuResult<T> = Result<T, String>;

/// Executor state: the register file plus the latches that shape the step
/// loop (IME, the EI deferral shadow, halt, and the halt-bug carryover).
#[derive(Debug, Clone)]
pub struct Cpu {
    pub regs: Registers,

    // --- CPU State Flags ---
    ime: bool,           // Interrupt Master Enable latch
    ime_scheduled: bool, // IME will be enabled after the next instruction
    halted: bool,        // Waiting for an interrupt (HALT and STOP both land here)
    halt_bug: bool,      // HALT with IME=0 while IE&IF != 0: next fetch repeats a byte

    // --- Internal Timing/Execution State ---
    total_cycles: u64,   // Cumulative T-cycles since construction
    fetched_opcode: u8,  // Last opcode fetched, for fault reporting
    instruction_pc: u16, // PC at the start of the current instruction
}

impl Cpu {
    /// Creates a CPU in the post-boot-ROM state of the original hardware.
    pub fn new() -> Self {
        Cpu {
            regs: Registers::post_boot(),
            ime: false,
            ime_scheduled: false,
            halted: false,
            halt_bug: false,
            total_cycles: 0,
            fetched_opcode: 0,
            instruction_pc: 0,
        }
    }

    /// Executes one step: services an interrupt, idles in halt, or runs a
    /// single instruction. Returns the T-cycles consumed.
    pub fn step(&mut self, bus: &mut MemoryBus) -> CpuResult<u16> {
        // EI lands one instruction late: commit the scheduled enable here
        // and keep dispatch off for this one step.
        let mut ime_just_enabled = false;
        if self.ime_scheduled {
            self.ime = true;
            self.ime_scheduled = false;
            ime_just_enabled = true;
        }

        // An enabled-pending interrupt lifts halt even with IME clear.
        if self.halted {
            if bus.interrupts().pending() == 0 {
                self.total_cycles = self.total_cycles.wrapping_add(HALT_IDLE_CYCLES as u64);
                return Ok(HALT_IDLE_CYCLES);
            }
            self.halted = false;
        }

        if self.ime && !ime_just_enabled {
            if let Some(cycles) = self.service_interrupt(bus) {
                self.total_cycles = self.total_cycles.wrapping_add(cycles as u64);
                return Ok(cycles);
            }
        }

        // --- Fetch / Decode ---
        self.instruction_pc = self.regs.pc;
        let opcode = bus.read_byte(self.regs.pc);
        self.fetched_opcode = opcode;

        let instruction: &Instruction = if opcode == CB_PREFIX {
            let cb_opcode = bus.read_byte(self.regs.pc.wrapping_add(1));
            &CB_INSTRUCTIONS[cb_opcode as usize]
        } else {
            &INSTRUCTIONS[opcode as usize]
        };

        // --- Advance PC ---
        let mut advance = instruction.length as u16;
        if self.halt_bug {
            // The fetch after a buggy HALT reads its first byte twice; PC
            // lands one short of a normal advance.
            self.halt_bug = false;
            advance -= 1;
        }
        self.regs.pc = self.regs.pc.wrapping_add(advance);

        // --- Execute ---
        match (instruction.execute)(self, bus) {
            Ok(additional_cycles) => {
                let cycles = (instruction.cycles as u16).wrapping_add(additional_cycles);
                self.total_cycles = self.total_cycles.wrapping_add(cycles as u64);
                Ok(cycles)
            }
            Err(message) => {
                let fault = format!(
                    "CPU fault at PC={:#06X} ({}): {}",
                    self.instruction_pc,
                    self.opcode_description(bus),
                    message
                );
                log::error!("{}", fault);
                self.total_cycles = self.total_cycles.wrapping_add(instruction.cycles as u64);
                Err(fault)
            }
        }
    }

    /// Repeats `step` until `steps` instructions have run, an error occurs,
    /// or the terminate flag is raised. Returns the steps executed.
    pub fn run(
        &mut self,
        bus: &mut MemoryBus,
        steps: u64,
        terminate: &AtomicBool,
    ) -> CpuResult<u64> {
        let mut executed = 0;
        while executed < steps && !terminate.load(Ordering::Acquire) {
            self.step(bus)?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Services the highest-priority enabled-pending interrupt, if any:
    /// clears its IF bit and IME, pushes PC, jumps to the vector.
    fn service_interrupt(&mut self, bus: &mut MemoryBus) -> Option<u16> {
        let (bit, vector) = bus.interrupts().highest_priority()?;
        self.ime = false;
        self.ime_scheduled = false;
        bus.interrupts_mut().acknowledge(bit);
        self.push_word(self.regs.pc, bus);
        self.regs.pc = vector;
        Some(INTERRUPT_DISPATCH_CYCLES)
    }

    fn opcode_description(&self, bus: &MemoryBus) -> String {
        if self.fetched_opcode == CB_PREFIX {
            let cb_opcode = bus.read_byte(self.instruction_pc.wrapping_add(1));
            format!("opcode CB {:02X}", cb_opcode)
        } else {
            format!("opcode {:#04X}", self.fetched_opcode)
        }
    }

    // --- Memory Access Helpers ---
    #[inline(always)]
    fn read_d8(&self, bus: &MemoryBus) -> u8 {
        bus.read_byte(self.instruction_pc.wrapping_add(1))
    }
    #[inline(always)]
    fn read_d16(&self, bus: &MemoryBus) -> u16 {
        let lo = bus.read_byte(self.instruction_pc.wrapping_add(1));
        let hi = bus.read_byte(self.instruction_pc.wrapping_add(2));
        u16::from_le_bytes([lo, hi])
    }
    #[inline(always)]
    fn read_r8(&self, bus: &MemoryBus) -> i8 {
        bus.read_byte(self.instruction_pc.wrapping_add(1)) as i8
    }

    // --- Stack Operations ---
    #[inline(always)]
    fn push_word(&mut self, value: u16, bus: &mut MemoryBus) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, (value & 0xFF) as u8);
    }
    #[inline(always)]
    fn pop_word(&mut self, bus: &mut MemoryBus) -> u16 {
        let low = bus.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let high = bus.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (high << 8) | low
    }

    // --- ALU and Bit Operation Helpers ---
    fn inc_u8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N, false);
        self.regs.set_flag(FLAG_H, (value & 0x0F) == 0x0F);
        result
    }
    fn dec_u8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N, true);
        self.regs.set_flag(FLAG_H, (value & 0x0F) == 0x00);
        result
    }
    fn add_hl(&mut self, value: u16) {
        let hl = self.regs.get_hl();
        let (result, carry) = hl.overflowing_add(value);
        let half_carry = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
        self.regs.set_hl(result);
        self.regs.set_flag(FLAG_N, false);
        self.regs.set_flag(FLAG_H, half_carry);
        self.regs.set_flag(FLAG_C, carry);
    }
    /// Shared by ADD SP,e and LD HL,SP+e: H and C come from the unsigned
    /// add of SP's low byte with the displacement byte; Z and N clear.
    fn add_sp_signed(&mut self, offset: i8) -> u16 {
        let sp = self.regs.sp;
        let e = offset as i16 as u16;
        let half_carry = (sp & 0x000F) + (e & 0x000F) > 0x000F;
        let carry = (sp & 0x00FF) + (e & 0x00FF) > 0x00FF;
        self.regs.set_flag(FLAG_Z | FLAG_N, false);
        self.regs.set_flag(FLAG_H, half_carry);
        self.regs.set_flag(FLAG_C, carry);
        sp.wrapping_add(e)
    }
    fn add_a(&mut self, value: u8, use_carry: bool) {
        let carry_in = if use_carry && self.regs.get_flag(FLAG_C) {
            1
        } else {
            0
        };
        let a = self.regs.a;
        let (res1, c1) = a.overflowing_add(value);
        let (result, c2) = res1.overflowing_add(carry_in);
        let carry_out = c1 || c2;
        let half_carry = (a & 0x0F) + (value & 0x0F) + carry_in > 0x0F;
        self.regs.a = result;
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N, false);
        self.regs.set_flag(FLAG_H, half_carry);
        self.regs.set_flag(FLAG_C, carry_out);
    }
    fn sub_a(&mut self, value: u8, use_carry: bool) {
        let carry_in = if use_carry && self.regs.get_flag(FLAG_C) {
            1
        } else {
            0
        };
        let a = self.regs.a;
        let (res1, b1) = a.overflowing_sub(value);
        let (result, b2) = res1.overflowing_sub(carry_in);
        let borrow_out = b1 || b2;
        let half_borrow = (a & 0x0F) < (value & 0x0F) + carry_in;
        self.regs.a = result;
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N, true);
        self.regs.set_flag(FLAG_H, half_borrow);
        self.regs.set_flag(FLAG_C, borrow_out);
    }
    fn and_a(&mut self, value: u8, _use_carry: bool) {
        self.regs.a &= value;
        self.regs.set_flag(FLAG_Z, self.regs.a == 0);
        self.regs.set_flag(FLAG_N, false);
        self.regs.set_flag(FLAG_H, true);
        self.regs.set_flag(FLAG_C, false);
    }
    fn xor_a(&mut self, value: u8, _use_carry: bool) {
        self.regs.a ^= value;
        self.regs.set_flag(FLAG_Z, self.regs.a == 0);
        self.regs.set_flag(FLAG_N | FLAG_H | FLAG_C, false);
    }
    fn or_a(&mut self, value: u8, _use_carry: bool) {
        self.regs.a |= value;
        self.regs.set_flag(FLAG_Z, self.regs.a == 0);
        self.regs.set_flag(FLAG_N | FLAG_H | FLAG_C, false);
    }
    fn cp_a(&mut self, value: u8, _use_carry: bool) {
        let saved_a = self.regs.a;
        self.sub_a(value, false);
        self.regs.a = saved_a;
    }
    fn rlc(&mut self, value: u8) -> u8 {
        let carry = (value >> 7) & 1;
        let result = value.rotate_left(1);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, carry != 0);
        result
    }
    fn rrc(&mut self, value: u8) -> u8 {
        let carry = value & 1;
        let result = value.rotate_right(1);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, carry != 0);
        result
    }
    fn rl(&mut self, value: u8) -> u8 {
        let old_carry = self.regs.get_flag(FLAG_C) as u8;
        let new_carry = (value >> 7) & 1;
        let result = (value << 1) | old_carry;
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, new_carry != 0);
        result
    }
    fn rr(&mut self, value: u8) -> u8 {
        let old_carry = self.regs.get_flag(FLAG_C) as u8;
        let new_carry = value & 1;
        let result = (value >> 1) | (old_carry << 7);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, new_carry != 0);
        result
    }
    fn sla(&mut self, value: u8) -> u8 {
        let carry = (value >> 7) & 1;
        let result = value << 1;
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, carry != 0);
        result
    }
    fn sra(&mut self, value: u8) -> u8 {
        let carry = value & 1;
        let result = (value >> 1) | (value & 0x80);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, carry != 0);
        result
    }
    fn swap(&mut self, value: u8) -> u8 {
        let result = value.rotate_left(4);
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H | FLAG_C, false);
        result
    }
    fn srl(&mut self, value: u8) -> u8 {
        let carry = value & 1;
        let result = value >> 1;
        self.regs.set_flag(FLAG_Z, result == 0);
        self.regs.set_flag(FLAG_N | FLAG_H, false);
        self.regs.set_flag(FLAG_C, carry != 0);
        result
    }
    fn test_bit(&mut self, bit: u8, value: u8) {
        self.regs.set_flag(FLAG_Z, (value >> bit) & 1 == 0);
        self.regs.set_flag(FLAG_N, false);
        self.regs.set_flag(FLAG_H, true);
    }
    /// BCD correction of A after an add or subtract, driven by N, H, C.
    fn daa(&mut self) {
        let mut adjustment = 0u8;
        let mut set_carry = false;
        let n_flag = self.regs.get_flag(FLAG_N);
        let h_flag = self.regs.get_flag(FLAG_H);
        let c_flag = self.regs.get_flag(FLAG_C);
        if !n_flag {
            if c_flag || self.regs.a > 0x99 {
                adjustment |= 0x60;
                set_carry = true;
            }
            if h_flag || (self.regs.a & 0x0F) > 0x09 {
                adjustment |= 0x06;
            }
            self.regs.a = self.regs.a.wrapping_add(adjustment);
        } else {
            if c_flag {
                adjustment |= 0x60;
                set_carry = true;
            }
            if h_flag {
                adjustment |= 0x06;
            }
            self.regs.a = self.regs.a.wrapping_sub(adjustment);
        }
        self.regs.set_flag(FLAG_Z, self.regs.a == 0);
        self.regs.set_flag(FLAG_H, false);
        self.regs.set_flag(FLAG_C, set_carry);
    }

    // --- Public accessors ---
    #[inline(always)]
    pub fn ime(&self) -> bool {
        self.ime
    }
    #[inline(always)]
    pub fn halted(&self) -> bool {
        self.halted
    }
    #[inline(always)]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}
