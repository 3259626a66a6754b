//! The 64 KiB memory bus.
//!
//! Every address resolves; there is no fault path. Each region owns its own
//! storage and the bus routes accesses by range: cartridge ROM (writes
//! ignored), VRAM, external RAM, work RAM, the echo mirror (address rewrite
//! before dispatch), OAM, the reserved gap (reads 0xFF), I/O bytes, HRAM,
//! and the two interrupt registers, which the interrupt controller owns
//! directly. 16-bit accesses are exactly two byte accesses, low byte first.

use crate::cartridge::Cartridge;
use crate::interrupts::InterruptController;
use crate::joypad::JoypadPort;
use crate::memory_map::*;
use std::fmt;

pub struct MemoryBus {
    rom: Cartridge,
    vram: Box<[u8; VRAM_SIZE]>,
    ext_ram: Box<[u8; EXT_RAM_SIZE]>,
    wram: Box<[u8; WRAM_SIZE]>,
    oam: Box<[u8; OAM_SIZE]>,
    io_registers: Box<[u8; IO_REGISTERS_SIZE]>,
    hram: Box<[u8; HRAM_SIZE]>,
    interrupts: InterruptController,
    joypad: JoypadPort,
}

/// Assembles a bus from its modules. Registration happens up front; nothing
/// is attached after `build`.
pub struct BusBuilder {
    rom: Option<Cartridge>,
    joypad: Option<JoypadPort>,
}

impl BusBuilder {
    pub fn new() -> Self {
        BusBuilder {
            rom: None,
            joypad: None,
        }
    }

    pub fn cartridge(mut self, cartridge: Cartridge) -> Self {
        self.rom = Some(cartridge);
        self
    }

    pub fn joypad(mut self, port: JoypadPort) -> Self {
        self.joypad = Some(port);
        self
    }

    pub fn build(self) -> Result<MemoryBus, String> {
        let rom = self.rom.ok_or("memory bus needs a cartridge")?;
        Ok(MemoryBus {
            rom,
            vram: Box::new([0; VRAM_SIZE]),
            ext_ram: Box::new([0; EXT_RAM_SIZE]),
            wram: Box::new([0; WRAM_SIZE]),
            oam: Box::new([0; OAM_SIZE]),
            io_registers: Box::new([0; IO_REGISTERS_SIZE]),
            hram: Box::new([0; HRAM_SIZE]),
            interrupts: InterruptController::new(),
            joypad: self.joypad.unwrap_or_default(),
        })
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        BusBuilder::new()
    }
}

impl MemoryBus {
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            ROM_START..=ROM_END => self.rom.read(addr),
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize],
            EXT_RAM_START..=EXT_RAM_END => self.ext_ram[(addr - EXT_RAM_START) as usize],
            WRAM_START..=WRAM_END => self.wram[(addr - WRAM_START) as usize],
            // Echo RAM forwards to the mirrored work-RAM address
            ECHO_RAM_START..=ECHO_RAM_END => self.read_byte(addr - 0x2000),
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize],
            NOT_USABLE_START..=NOT_USABLE_END => 0xFF,
            P1_JOYP_ADDR => self.joypad.read(),
            IF_ADDR => self.interrupts.read_flag(),
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_registers[(addr - IO_REGISTERS_START) as usize]
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize],
            INTERRUPT_ENABLE_REGISTER => self.interrupts.read_enable(),
        }
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            // Bank switching is out of scope; stores into ROM fall away.
            ROM_START..=ROM_END => {}
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize] = value,
            EXT_RAM_START..=EXT_RAM_END => self.ext_ram[(addr - EXT_RAM_START) as usize] = value,
            WRAM_START..=WRAM_END => self.wram[(addr - WRAM_START) as usize] = value,
            ECHO_RAM_START..=ECHO_RAM_END => self.write_byte(addr - 0x2000, value),
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize] = value,
            NOT_USABLE_START..=NOT_USABLE_END => {}
            P1_JOYP_ADDR => self.joypad.write(value),
            IF_ADDR => self.interrupts.write_flag(value),
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_registers[(addr - IO_REGISTERS_START) as usize] = value
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize] = value,
            INTERRUPT_ENABLE_REGISTER => self.interrupts.write_enable(value),
        }
    }

    /// Reads a 16-bit word (Little Endian).
    pub fn read_word(&self, addr: u16) -> u16 {
        let low = self.read_byte(addr) as u16;
        let high = self.read_byte(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Writes a 16-bit word (Little Endian).
    pub fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, (value & 0xFF) as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Sets the corresponding interrupt flag bit (0-4) in the IF register.
    pub fn request_interrupt(&mut self, bit: u8) {
        self.interrupts.request(bit);
    }

    #[inline(always)]
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    #[inline(always)]
    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    /// Snapshot of video RAM, taken between CPU steps for the raster side.
    pub fn vram_snapshot(&self) -> Box<[u8; VRAM_SIZE]> {
        self.vram.clone()
    }
}

impl fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBus")
            .field("rom_len", &self.rom.len())
            .field("IE", &format_args!("{:#04X}", self.interrupts.read_enable()))
            .field("IF", &format_args!("{:#04X}", self.interrupts.read_flag()))
            .finish_non_exhaustive()
    }
}
