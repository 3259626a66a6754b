//! Cartridge ROM image validation.
//!
//! This core supports plain 32 KiB "ROM only" cartridges — no bank
//! controller, no cartridge RAM, no RTC. Anything else in the hardware byte
//! is rejected at load time rather than misbehaving later.

use crate::memory_map::{HEADER_CARTRIDGE_TYPE, HEADER_END, ROM_SIZE};

/// Cartridge hardware selected by header byte 0x0147.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeType {
    RomOnly,
}

impl CartridgeType {
    pub fn from_header(code: u8) -> Result<Self, String> {
        match code {
            0x00 => Ok(CartridgeType::RomOnly),
            _ => Err(format!(
                "unsupported cartridge type {:#04X} (only ROM-only cartridges are handled)",
                code
            )),
        }
    }
}

/// A validated ROM image ready to be mapped at 0x0000-0x7FFF.
#[derive(Debug, Clone)]
pub struct Cartridge {
    data: Vec<u8>,
    cartridge_type: CartridgeType,
}

impl Cartridge {
    /// Validates a raw byte stream against the header rules: at least 0x150
    /// bytes, and a known hardware byte at 0x0147.
    pub fn load(data: Vec<u8>) -> Result<Self, String> {
        if data.len() < HEADER_END {
            return Err(format!(
                "ROM image is {} bytes; the header alone needs {:#05X}",
                data.len(),
                HEADER_END
            ));
        }
        let cartridge_type = CartridgeType::from_header(data[HEADER_CARTRIDGE_TYPE])?;
        if data.len() > ROM_SIZE {
            log::warn!(
                "ROM image is {} bytes; only the first {} are addressable without banking",
                data.len(),
                ROM_SIZE
            );
        }
        log::info!(
            "loaded ROM: {} bytes, type {:?}",
            data.len(),
            cartridge_type
        );
        Ok(Cartridge {
            data,
            cartridge_type,
        })
    }

    #[inline(always)]
    pub fn cartridge_type(&self) -> CartridgeType {
        self.cartridge_type
    }

    /// Byte at a ROM offset; beyond the image it reads as open bus (0xFF).
    #[inline(always)]
    pub fn read(&self, offset: u16) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0xFF)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
