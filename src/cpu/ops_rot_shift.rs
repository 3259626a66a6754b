use super::{Cpu, CpuResult, constants::*};
use crate::memory_bus::MemoryBus;

// --- Rotate/Shift Implementations (Non-CB prefixed) ---
// The four A-register rotates always clear Z, unlike their CB twins.
impl Cpu {
    pub fn op_rlca(&mut self, _bus: &mut MemoryBus) -> CpuResult<u16> {
        self.regs.a = self.rlc(self.regs.a);
        self.regs.set_flag(FLAG_Z, false);
        Ok(0)
    }
    pub fn op_rla(&mut self, _bus: &mut MemoryBus) -> CpuResult<u16> {
        self.regs.a = self.rl(self.regs.a);
        self.regs.set_flag(FLAG_Z, false);
        Ok(0)
    }
    pub fn op_rrca(&mut self, _bus: &mut MemoryBus) -> CpuResult<u16> {
        self.regs.a = self.rrc(self.regs.a);
        self.regs.set_flag(FLAG_Z, false);
        Ok(0)
    }
    pub fn op_rra(&mut self, _bus: &mut MemoryBus) -> CpuResult<u16> {
        self.regs.a = self.rr(self.regs.a);
        self.regs.set_flag(FLAG_Z, false);
        Ok(0)
    }
}
