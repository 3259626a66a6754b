// --- LD Macros ---
macro_rules! ld_r_r {
    ($name:ident, $r1:ident, $r2:ident) => {
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.regs.$r1 = self.regs.$r2;
            Ok(0)
        }
    };
}
macro_rules! ld_r_hlp {
    ($name:ident, $r1:ident) => {
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.regs.$r1 = bus.read_byte(self.regs.get_hl());
            Ok(0)
        }
    };
}
macro_rules! ld_hlp_r {
    ($name:ident, $r2:ident) => {
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            bus.write_byte(self.regs.get_hl(), self.regs.$r2);
            Ok(0)
        }
    };
}

// --- ALU Macros ---
macro_rules! alu_a_r {
    ($name:ident, $op:ident, $r2:ident) => { // No carry version
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.$op(self.regs.$r2, false);
            Ok(0)
        }
    };
    ($name:ident, $op:ident, $r2:ident, carry) => { // With carry version
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.$op(self.regs.$r2, true);
            Ok(0)
        }
    };
}
macro_rules! alu_a_hlp {
    ($name:ident, $op:ident) => { // No carry version
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let val = bus.read_byte(self.regs.get_hl());
            self.$op(val, false);
            Ok(0)
        }
    };
    ($name:ident, $op:ident, carry) => { // With carry version
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let val = bus.read_byte(self.regs.get_hl());
            self.$op(val, true);
            Ok(0)
        }
    };
}

// --- CB Prefix Macros ---
macro_rules! cb_reg_op {
    ($name:ident, $op:ident, $reg:ident) => { // Rotate/shift/swap op
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.regs.$reg = self.$op(self.regs.$reg);
            Ok(0)
        }
    };
    ($name:ident, bit, $bit:expr, $reg:ident) => { // BIT op
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.test_bit($bit, self.regs.$reg);
            Ok(0)
        }
    };
    ($name:ident, res, $bit:expr, $reg:ident) => { // RES op
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.regs.$reg &= !(1 << $bit);
            Ok(0)
        }
    };
    ($name:ident, set, $bit:expr, $reg:ident) => { // SET op
        #[inline(always)]
        pub fn $name(&mut self, _bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            self.regs.$reg |= 1 << $bit;
            Ok(0)
        }
    };
}
macro_rules! cb_hlp_op {
    ($name:ident, $op:ident) => { // Rotate/shift/swap on (HL)
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let addr = self.regs.get_hl();
            let value = bus.read_byte(addr);
            let result = self.$op(value);
            bus.write_byte(addr, result);
            Ok(0)
        }
    };
    ($name:ident, bit, $bit:expr) => { // BIT on (HL)
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let value = bus.read_byte(self.regs.get_hl());
            self.test_bit($bit, value);
            Ok(0)
        }
    };
    ($name:ident, res, $bit:expr) => { // RES on (HL)
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let addr = self.regs.get_hl();
            let value = bus.read_byte(addr);
            bus.write_byte(addr, value & !(1 << $bit));
            Ok(0)
        }
    };
    ($name:ident, set, $bit:expr) => { // SET on (HL)
        pub fn $name(&mut self, bus: &mut crate::memory_bus::MemoryBus) -> super::CpuResult<u16> {
            let addr = self.regs.get_hl();
            let value = bus.read_byte(addr);
            bus.write_byte(addr, value | (1 << $bit));
            Ok(0)
        }
    };
}
