//! CPU executor and opcode handler tests: seed register/memory state,
//! execute instruction bytes, check registers, memory, flags, and cycles.

use super::instruction::{CB_INSTRUCTIONS, INSTRUCTIONS};
use super::*;
use crate::cartridge::Cartridge;
use crate::memory_bus::MemoryBus;
use crate::memory_map::{HEADER_CARTRIDGE_TYPE, IF_ADDR, INTERRUPT_ENABLE_REGISTER, ROM_SIZE};
use crate::registers::Registers;
use std::sync::atomic::AtomicBool;

// ========== Test Helpers ==========

fn bus_with_rom(rom: Vec<u8>) -> MemoryBus {
    MemoryBus::builder()
        .cartridge(Cartridge::load(rom).unwrap())
        .build()
        .unwrap()
}

/// CPU with zeroed registers at PC 0 and the program bytes mapped at the
/// bottom of ROM.
fn seeded(program: &[u8]) -> (Cpu, MemoryBus) {
    let mut rom = vec![0u8; ROM_SIZE];
    rom[HEADER_CARTRIDGE_TYPE] = 0x00;
    rom[..program.len()].copy_from_slice(program);
    let mut cpu = Cpu::new();
    cpu.regs = Registers {
        a: 0,
        f: 0,
        b: 0,
        c: 0,
        d: 0,
        e: 0,
        h: 0,
        l: 0,
        sp: 0xFFFE,
        pc: 0x0000,
    };
    (cpu, bus_with_rom(rom))
}

fn assert_flags(cpu: &Cpu, z: bool, n: bool, h: bool, c: bool) {
    assert_eq!(cpu.regs.get_flag(FLAG_Z), z, "Z flag");
    assert_eq!(cpu.regs.get_flag(FLAG_N), n, "N flag");
    assert_eq!(cpu.regs.get_flag(FLAG_H), h, "H flag");
    assert_eq!(cpu.regs.get_flag(FLAG_C), c, "C flag");
}

// ========== 8-bit loads ==========

#[test]
fn ld_b_immediate() {
    let (mut cpu, mut bus) = seeded(&[0x06, 0x01]);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.b, 0x01);
    assert_eq!(cpu.regs.pc, 0x0002);
    assert_eq!(cycles, 8);
}

#[test]
fn ld_register_to_register_round_trip() {
    // LD B, C then LD C, B is the identity when the values started equal
    let (mut cpu, mut bus) = seeded(&[0x41, 0x48]);
    cpu.regs.b = 0x01;
    cpu.regs.c = 0xDE;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.b, 0xDE);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.b, 0xDE);
    assert_eq!(cpu.regs.c, 0xDE);
}

#[test]
fn ld_a_through_hl() {
    let (mut cpu, mut bus) = seeded(&[0x7E, 0x77]);
    cpu.regs.set_hl(0xC015);
    bus.write_byte(0xC015, 35);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 35);

    cpu.regs.a = 0x99;
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xC015), 0x99);
}

#[test]
fn ld_indirect_bc_de() {
    let (mut cpu, mut bus) = seeded(&[0x02, 0x1A]);
    cpu.regs.a = 0x7B;
    cpu.regs.set_bc(0xC100);
    cpu.regs.set_de(0xC200);
    bus.write_byte(0xC200, 0x3C);
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xC100), 0x7B);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x3C);
}

#[test]
fn ldi_and_ldd_post_modify_hl() {
    let (mut cpu, mut bus) = seeded(&[0x22, 0x32, 0x2A, 0x3A]);
    cpu.regs.a = 0x11;
    cpu.regs.set_hl(0xC000);
    cpu.step(&mut bus).unwrap(); // LD (HL+), A
    assert_eq!(bus.read_byte(0xC000), 0x11);
    assert_eq!(cpu.regs.get_hl(), 0xC001);

    cpu.step(&mut bus).unwrap(); // LD (HL-), A
    assert_eq!(bus.read_byte(0xC001), 0x11);
    assert_eq!(cpu.regs.get_hl(), 0xC000);

    bus.write_byte(0xC000, 0x22);
    cpu.step(&mut bus).unwrap(); // LD A, (HL+)
    assert_eq!(cpu.regs.a, 0x22);
    assert_eq!(cpu.regs.get_hl(), 0xC001);

    bus.write_byte(0xC001, 0x33);
    cpu.step(&mut bus).unwrap(); // LD A, (HL-)
    assert_eq!(cpu.regs.a, 0x33);
    assert_eq!(cpu.regs.get_hl(), 0xC000);
}

#[test]
fn ldh_page_accesses() {
    // LDH (0x90), A ; LDH A, (0x91) ; LD (C), A ; LD A, (C)
    let (mut cpu, mut bus) = seeded(&[0xE0, 0x90, 0xF0, 0x91, 0xE2, 0xF2]);
    cpu.regs.a = 0x5C;
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xFF90), 0x5C);

    bus.write_byte(0xFF91, 0x7D);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x7D);

    cpu.regs.c = 0x92;
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xFF92), 0x7D);

    bus.write_byte(0xFF92, 0x3E);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x3E);
}

#[test]
fn ld_absolute_a() {
    let (mut cpu, mut bus) = seeded(&[0xEA, 0x34, 0xC2, 0xFA, 0x34, 0xC2]);
    cpu.regs.a = 0x66;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(bus.read_byte(0xC234), 0x66);

    cpu.regs.a = 0x00;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x66);
    assert_eq!(cpu.regs.pc, 0x0006);
}

// ========== 16-bit loads and the stack ==========

#[test]
fn ld_pair_immediates() {
    let (mut cpu, mut bus) = seeded(&[0x01, 0x34, 0x12, 0x31, 0xCD, 0xAB]);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_bc(), 0x1234);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.sp, 0xABCD);
}

#[test]
fn ld_a16_sp_stores_little_endian() {
    let (mut cpu, mut bus) = seeded(&[0x08, 0x00, 0xC0]);
    cpu.regs.sp = 0xABCD;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 20);
    assert_eq!(bus.read_byte(0xC000), 0xCD);
    assert_eq!(bus.read_byte(0xC001), 0xAB);
}

#[test]
fn ld_sp_hl() {
    let (mut cpu, mut bus) = seeded(&[0xF9]);
    cpu.regs.set_hl(0xD123);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.sp, 0xD123);
}

#[test]
fn ld_hl_sp_plus_offset_flags() {
    let (mut cpu, mut bus) = seeded(&[0xF8, 0x02]);
    cpu.regs.sp = 0xFFF8;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_hl(), 0xFFFA);
    assert_flags(&cpu, false, false, false, false);
}

#[test]
fn push_pop_round_trip() {
    // PUSH BC / POP DE
    let (mut cpu, mut bus) = seeded(&[0xC5, 0xD1]);
    cpu.regs.set_bc(0x1234);
    let sp_before = cpu.regs.sp;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.sp, sp_before.wrapping_sub(2));
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.sp, sp_before);
    assert_eq!(cpu.regs.get_de(), 0x1234);
}

#[test]
fn push_af_pop_af_masks_flag_nibble() {
    let (mut cpu, mut bus) = seeded(&[0xF5, 0xF1]);
    cpu.regs.a = 0x5A;
    cpu.regs.set_flag(FLAG_Z | FLAG_C, true);
    let af_before = cpu.regs.get_af();
    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_af(), af_before);

    // A popped value with a dirty low nibble still lands masked
    cpu.regs.sp = 0xC080;
    bus.write_word(0xC080, 0xABCD);
    cpu.op_pop_af(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0xAB);
    assert_eq!(cpu.regs.f, 0xC0);
}

#[test]
fn push_writes_high_byte_at_higher_address() {
    let (mut cpu, mut bus) = seeded(&[0xC5]);
    cpu.regs.set_bc(0x1234);
    cpu.regs.sp = 0xFFFE;
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xFFFD), 0x12);
    assert_eq!(bus.read_byte(0xFFFC), 0x34);
}

// ========== 8-bit arithmetic and logic ==========

#[test]
fn add_a_c_sets_carry_half_and_zero() {
    let (mut cpu, mut bus) = seeded(&[0x81]);
    cpu.regs.a = 0xFF;
    cpu.regs.c = 0x01;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x00);
    assert_flags(&cpu, true, false, true, true);
    assert_eq!(cycles, 4);
}

#[test]
fn adc_includes_carry_in() {
    let (mut cpu, mut bus) = seeded(&[0x89]);
    cpu.regs.a = 0x0F;
    cpu.regs.c = 0x00;
    cpu.regs.set_flag(FLAG_C, true);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x10);
    assert_flags(&cpu, false, false, true, false);
}

#[test]
fn sub_and_sbc_borrow() {
    let (mut cpu, mut bus) = seeded(&[0x90, 0x99]);
    cpu.regs.a = 0x10;
    cpu.regs.b = 0x20;
    cpu.regs.c = 0x00;
    cpu.step(&mut bus).unwrap(); // SUB B: 0x10 - 0x20
    assert_eq!(cpu.regs.a, 0xF0);
    assert_flags(&cpu, false, true, false, true);

    cpu.step(&mut bus).unwrap(); // SBC C: 0xF0 - 0 - carry
    assert_eq!(cpu.regs.a, 0xEF);
    assert!(cpu.regs.get_flag(FLAG_N));
}

#[test]
fn and_or_flag_rules() {
    let (mut cpu, mut bus) = seeded(&[0xA0, 0xB1]);
    cpu.regs.a = 0xF0;
    cpu.regs.b = 0x0F;
    cpu.regs.c = 0x0F;
    cpu.step(&mut bus).unwrap(); // AND B -> 0
    assert_eq!(cpu.regs.a, 0x00);
    assert_flags(&cpu, true, false, true, false);

    cpu.step(&mut bus).unwrap(); // OR C -> 0x0F
    assert_eq!(cpu.regs.a, 0x0F);
    assert_flags(&cpu, false, false, false, false);
}

#[test]
fn xor_a_zeroes_the_accumulator() {
    let (mut cpu, mut bus) = seeded(&[0xAF]);
    cpu.regs.a = 0x5A;
    cpu.regs.set_flag(FLAG_N | FLAG_H | FLAG_C, true);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x00);
    assert_flags(&cpu, true, false, false, false);
}

#[test]
fn cp_matches_sub_flags_but_keeps_a() {
    // CP d8 then, from the same seed, SUB d8
    let (mut cpu, mut bus) = seeded(&[0xFE, 0x42]);
    cpu.regs.a = 0x40;
    cpu.step(&mut bus).unwrap();
    let flags_after_cp = cpu.regs.f;
    assert_eq!(cpu.regs.a, 0x40);

    let (mut cpu2, mut bus2) = seeded(&[0xD6, 0x42]);
    cpu2.regs.a = 0x40;
    cpu2.step(&mut bus2).unwrap();
    assert_eq!(cpu2.regs.a, 0xFE);
    assert_eq!(flags_after_cp, cpu2.regs.f);
}

#[test]
fn inc_dec_half_carry_edges() {
    let (mut cpu, mut bus) = seeded(&[0x04, 0x05, 0x3D]);
    cpu.regs.b = 0x0F;
    cpu.regs.set_flag(FLAG_C, true);
    cpu.step(&mut bus).unwrap(); // INC B: 0x0F -> 0x10
    assert_eq!(cpu.regs.b, 0x10);
    assert_flags(&cpu, false, false, true, true); // C untouched

    cpu.step(&mut bus).unwrap(); // DEC B: 0x10 -> 0x0F, borrow from bit 4
    assert_eq!(cpu.regs.b, 0x0F);
    assert_flags(&cpu, false, true, true, true);

    cpu.regs.a = 0x01;
    cpu.step(&mut bus).unwrap(); // DEC A -> 0
    assert_flags(&cpu, true, true, false, true);
}

#[test]
fn inc_dec_through_hl_memory() {
    let (mut cpu, mut bus) = seeded(&[0x34, 0x35]);
    cpu.regs.set_hl(0xC040);
    bus.write_byte(0xC040, 0xFF);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(bus.read_byte(0xC040), 0x00);
    assert!(cpu.regs.get_flag(FLAG_Z));

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xC040), 0xFF);
    assert!(cpu.regs.get_flag(FLAG_N));
}

#[test]
fn daa_after_addition() {
    // 0x19 + 0x19 leaves H set; DAA corrects to the BCD sum 0x38
    let (mut cpu, mut bus) = seeded(&[0x80, 0x27]);
    cpu.regs.a = 0x19;
    cpu.regs.b = 0x19;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x32);
    assert!(cpu.regs.get_flag(FLAG_H));
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x38);
    assert!(!cpu.regs.get_flag(FLAG_H));
    assert!(!cpu.regs.get_flag(FLAG_C));
}

#[test]
fn daa_after_subtraction() {
    // 0x42 - 0x09 borrows from bit 4; DAA corrects to the BCD result 0x33
    let (mut cpu, mut bus) = seeded(&[0x90, 0x27]);
    cpu.regs.a = 0x42;
    cpu.regs.b = 0x09;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x39);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x33);
    assert!(cpu.regs.get_flag(FLAG_N));
}

#[test]
fn daa_sets_carry_above_99() {
    // 0x90 + 0x20 wraps past 0x99; DAA adds 0x60 and reports carry
    let (mut cpu, mut bus) = seeded(&[0x80, 0x27]);
    cpu.regs.a = 0x90;
    cpu.regs.b = 0x20;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0xB0);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x10);
    assert!(cpu.regs.get_flag(FLAG_C));
}

#[test]
fn cpl_complements_a() {
    let (mut cpu, mut bus) = seeded(&[0x2F]);
    cpu.regs.a = 0x44;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0xBB);
    assert!(cpu.regs.get_flag(FLAG_N));
    assert!(cpu.regs.get_flag(FLAG_H));
    assert_eq!(cycles, 4);
}

#[test]
fn scf_and_ccf() {
    let (mut cpu, mut bus) = seeded(&[0x37, 0x3F, 0x3F]);
    cpu.regs.set_flag(FLAG_N | FLAG_H, true);
    cpu.step(&mut bus).unwrap(); // SCF
    assert_flags(&cpu, false, false, false, true);
    cpu.step(&mut bus).unwrap(); // CCF
    assert!(!cpu.regs.get_flag(FLAG_C));
    cpu.step(&mut bus).unwrap(); // CCF
    assert!(cpu.regs.get_flag(FLAG_C));
}

// ========== 16-bit arithmetic ==========

#[test]
fn add_hl_carries_from_bit_11_and_15() {
    let (mut cpu, mut bus) = seeded(&[0x09, 0x19]);
    cpu.regs.set_hl(0x0FFF);
    cpu.regs.set_bc(0x0001);
    cpu.regs.set_flag(FLAG_Z, true);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_hl(), 0x1000);
    assert_flags(&cpu, true, false, true, false); // Z untouched

    cpu.regs.set_hl(0xFFFF);
    cpu.regs.set_de(0x0001);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_hl(), 0x0000);
    assert!(cpu.regs.get_flag(FLAG_C));
}

#[test]
fn add_sp_signed_offsets() {
    let (mut cpu, mut bus) = seeded(&[0xE8, 0x08, 0xE8, 0xFE]);
    cpu.regs.sp = 0xFFF8;
    let cycles = cpu.step(&mut bus).unwrap(); // ADD SP, +8
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.sp, 0x0000);
    assert_flags(&cpu, false, false, true, true);

    cpu.regs.sp = 0x0005;
    cpu.step(&mut bus).unwrap(); // ADD SP, -2
    assert_eq!(cpu.regs.sp, 0x0003);
}

#[test]
fn inc_dec_pairs_leave_flags_alone() {
    let (mut cpu, mut bus) = seeded(&[0x03, 0x0B]);
    cpu.regs.set_bc(0xFFFF);
    cpu.regs.set_flag(FLAG_Z | FLAG_C, true);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_bc(), 0x0000);
    assert_flags(&cpu, true, false, false, true);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.get_bc(), 0xFFFF);
    assert_flags(&cpu, true, false, false, true);
}

// ========== Rotates, shifts, bit operations ==========

#[test]
fn accumulator_rotates_clear_z() {
    let (mut cpu, mut bus) = seeded(&[0x07, 0x17, 0x0F, 0x1F]);
    cpu.regs.a = 0x00;
    cpu.regs.set_flag(FLAG_Z, true);
    cpu.step(&mut bus).unwrap(); // RLCA on zero still clears Z
    assert!(!cpu.regs.get_flag(FLAG_Z));

    cpu.regs.a = 0x80;
    cpu.regs.set_flag(FLAG_C, false);
    cpu.step(&mut bus).unwrap(); // RLA: bit 7 out, carry-in 0
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.get_flag(FLAG_C));
    assert!(!cpu.regs.get_flag(FLAG_Z));

    cpu.regs.a = 0x01;
    cpu.step(&mut bus).unwrap(); // RRCA
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.get_flag(FLAG_C));

    cpu.regs.a = 0x02;
    cpu.regs.set_flag(FLAG_C, true);
    cpu.step(&mut bus).unwrap(); // RRA: carry rotates into bit 7
    assert_eq!(cpu.regs.a, 0x81);
    assert!(!cpu.regs.get_flag(FLAG_C));
}

#[test]
fn rlc_on_hl_memory() {
    let (mut cpu, mut bus) = seeded(&[0xCB, 0x06]);
    cpu.regs.set_hl(0xC015);
    bus.write_byte(0xC015, 0b1001_0101);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(bus.read_byte(0xC015), 0b0010_1011);
    assert!(cpu.regs.get_flag(FLAG_C));
    assert!(!cpu.regs.get_flag(FLAG_Z));
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn cb_rotate_and_shift_register_ops() {
    // RLC B, RL B, SRA B, SRL B, SWAP B
    let (mut cpu, mut bus) = seeded(&[0xCB, 0x00, 0xCB, 0x10, 0xCB, 0x28, 0xCB, 0x38, 0xCB, 0x30]);
    cpu.regs.b = 0x00;
    let cycles = cpu.step(&mut bus).unwrap(); // RLC B on zero sets Z
    assert_eq!(cycles, 8);
    assert!(cpu.regs.get_flag(FLAG_Z));

    cpu.regs.b = 0x80;
    cpu.regs.set_flag(FLAG_C, true);
    cpu.step(&mut bus).unwrap(); // RL B: carry in, bit 7 out
    assert_eq!(cpu.regs.b, 0x01);
    assert!(cpu.regs.get_flag(FLAG_C));

    cpu.regs.b = 0x82;
    cpu.step(&mut bus).unwrap(); // SRA B keeps the sign bit
    assert_eq!(cpu.regs.b, 0xC1);
    assert!(!cpu.regs.get_flag(FLAG_C));

    cpu.regs.b = 0x01;
    cpu.step(&mut bus).unwrap(); // SRL B shifts zero in
    assert_eq!(cpu.regs.b, 0x00);
    assert!(cpu.regs.get_flag(FLAG_Z));
    assert!(cpu.regs.get_flag(FLAG_C));

    cpu.regs.b = 0xA5;
    cpu.step(&mut bus).unwrap(); // SWAP B
    assert_eq!(cpu.regs.b, 0x5A);
    assert!(!cpu.regs.get_flag(FLAG_C));
}

#[test]
fn bit_test_set_and_reset() {
    let (mut cpu, mut bus) = seeded(&[0xCB, 0x7C, 0xCB, 0xFC, 0xCB, 0xBC]);
    cpu.regs.h = 0x00;
    cpu.regs.set_flag(FLAG_C, true);
    let cycles = cpu.step(&mut bus).unwrap(); // BIT 7, H
    assert_eq!(cycles, 8);
    assert_flags(&cpu, true, false, true, true); // C untouched

    cpu.step(&mut bus).unwrap(); // SET 7, H
    assert_eq!(cpu.regs.h, 0x80);
    assert_flags(&cpu, true, false, true, true); // flags untouched

    cpu.step(&mut bus).unwrap(); // RES 7, H
    assert_eq!(cpu.regs.h, 0x00);
}

#[test]
fn bit_on_hl_memory_costs_12() {
    let (mut cpu, mut bus) = seeded(&[0xCB, 0x46]);
    cpu.regs.set_hl(0xC020);
    bus.write_byte(0xC020, 0x01);
    let cycles = cpu.step(&mut bus).unwrap(); // BIT 0, (HL)
    assert_eq!(cycles, 12);
    assert!(!cpu.regs.get_flag(FLAG_Z));
}

// ========== Control flow ==========

#[test]
fn jp_absolute_and_jp_hl() {
    let (mut cpu, mut bus) = seeded(&[0xC3, 0x00, 0xC0]);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.pc, 0xC000);

    bus.write_byte(0xC000, 0xE9); // JP HL
    cpu.regs.set_hl(0x0150);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.pc, 0x0150);
}

#[test]
fn jr_takes_signed_offsets() {
    // NOP; JR -3 jumps back to address 0
    let (mut cpu, mut bus) = seeded(&[0x00, 0x18, 0xFD]);
    cpu.step(&mut bus).unwrap();
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(cpu.regs.pc, 0x0000);
}

#[test]
fn conditional_jr_cycle_split() {
    let (mut cpu, mut bus) = seeded(&[0x20, 0x02, 0x20, 0x02]);
    cpu.regs.set_flag(FLAG_Z, true);
    let not_taken = cpu.step(&mut bus).unwrap();
    assert_eq!(not_taken, 8);
    assert_eq!(cpu.regs.pc, 0x0002);

    cpu.regs.set_flag(FLAG_Z, false);
    let taken = cpu.step(&mut bus).unwrap();
    assert_eq!(taken, 12);
    assert_eq!(cpu.regs.pc, 0x0006);
}

#[test]
fn call_pushes_the_return_address() {
    let mut rom = vec![0u8; ROM_SIZE];
    rom[HEADER_CARTRIDGE_TYPE] = 0x00;
    rom[0x1234] = 0xCD;
    rom[0x1235] = 0x23;
    rom[0x1236] = 0x45;
    let mut bus = bus_with_rom(rom);
    let mut cpu = Cpu::new();
    cpu.regs.pc = 0x1234;
    cpu.regs.sp = 0xFFFE;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 24);
    assert_eq!(cpu.regs.pc, 0x4523);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(bus.read_byte(0xFFFD), 0x12);
    assert_eq!(bus.read_byte(0xFFFC), 0x37);
}

#[test]
fn call_and_ret_round_trip() {
    // CALL 0xC000; target holds RET
    let (mut cpu, mut bus) = seeded(&[0xCD, 0x00, 0xC0]);
    bus.write_byte(0xC000, 0xC9);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.pc, 0xC000);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.pc, 0x0003);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn conditional_ret_and_call_cycle_split() {
    let (mut cpu, mut bus) = seeded(&[0xC4, 0x00, 0xC0, 0xC0]);
    cpu.regs.set_flag(FLAG_Z, true);
    let call_not_taken = cpu.step(&mut bus).unwrap(); // CALL NZ skipped
    assert_eq!(call_not_taken, 12);
    assert_eq!(cpu.regs.pc, 0x0003);

    let ret_not_taken = cpu.step(&mut bus).unwrap(); // RET NZ skipped too
    assert_eq!(ret_not_taken, 8);
    assert_eq!(cpu.regs.pc, 0x0004);
}

#[test]
fn rst_jumps_to_fixed_vector() {
    let (mut cpu, mut bus) = seeded(&[0xCF]);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.pc, 0x0008);
    assert_eq!(bus.read_word(cpu.regs.sp), 0x0001);
}

#[test]
fn taken_branch_costs_match_the_table() {
    for opcode in [0x20usize, 0x28, 0x30, 0x38, 0xC0, 0xC2, 0xC4, 0xC8] {
        let entry = &INSTRUCTIONS[opcode];
        assert!(entry.extra_cycles > 0, "opcode {:#04X}", opcode);
    }
    // JR NZ: taken = base + extra
    let entry = &INSTRUCTIONS[0x20];
    assert_eq!(entry.cycles + entry.extra_cycles, 12);
    // CALL NZ
    let entry = &INSTRUCTIONS[0xC4];
    assert_eq!(entry.cycles + entry.extra_cycles, 24);
    // RET NZ
    let entry = &INSTRUCTIONS[0xC0];
    assert_eq!(entry.cycles + entry.extra_cycles, 20);
}

// ========== Interrupts, HALT, IME ==========

fn arm_interrupt(bus: &mut MemoryBus, enable: u8, flag: u8) {
    bus.write_byte(INTERRUPT_ENABLE_REGISTER, enable);
    bus.write_byte(IF_ADDR, flag);
}

#[test]
fn interrupt_dispatch_vectors_and_cost() {
    let (mut cpu, mut bus) = seeded(&[]);
    cpu.regs.pc = 0x0100;
    cpu.regs.sp = 0xFFFE;
    cpu.ime = true;
    arm_interrupt(&mut bus, 0x1F, 0x01);
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 20);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(bus.read_byte(IF_ADDR) & 0x01, 0x00);
    assert_eq!(bus.read_word(0xFFFC), 0x0100);
    assert!(!cpu.ime);
}

#[test]
fn interrupt_priority_picks_lowest_bit() {
    let (mut cpu, mut bus) = seeded(&[]);
    cpu.ime = true;
    arm_interrupt(&mut bus, 0x1F, 0b0001_0010); // LCD-STAT and joypad
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.pc, 0x0048);
    // Joypad stays pending
    assert_eq!(bus.read_byte(IF_ADDR) & 0x1F, 0b0001_0000);
}

#[test]
fn ei_enables_after_one_instruction() {
    // EI; NOP; interrupt pending the whole time
    let (mut cpu, mut bus) = seeded(&[0xFB, 0x00]);
    arm_interrupt(&mut bus, 0x01, 0x01);
    cpu.step(&mut bus).unwrap(); // EI
    assert!(!cpu.ime);
    cpu.step(&mut bus).unwrap(); // NOP executes, no dispatch yet
    assert!(cpu.ime);
    assert_eq!(cpu.regs.pc, 0x0002);
    let cycles = cpu.step(&mut bus).unwrap(); // now the dispatch lands
    assert_eq!(cycles, 20);
    assert_eq!(cpu.regs.pc, 0x0040);
}

#[test]
fn di_cancels_a_pending_ei() {
    let (mut cpu, mut bus) = seeded(&[0xFB, 0xF3, 0x00]);
    arm_interrupt(&mut bus, 0x01, 0x01);
    cpu.step(&mut bus).unwrap(); // EI
    cpu.step(&mut bus).unwrap(); // DI lands before the enable can dispatch
    assert!(!cpu.ime);
    cpu.step(&mut bus).unwrap(); // NOP, not a vector
    assert_eq!(cpu.regs.pc, 0x0003);
}

#[test]
fn reti_pops_and_restores_ime() {
    // RETI sitting at the V-blank vector
    let mut rom = vec![0u8; ROM_SIZE];
    rom[HEADER_CARTRIDGE_TYPE] = 0x00;
    rom[0x0040] = 0xD9;
    let mut bus = bus_with_rom(rom);
    bus.write_word(0xC0F0, 0x0234);
    let mut cpu = Cpu::new();
    cpu.regs.pc = 0x0040;
    cpu.regs.sp = 0xC0F0;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(cpu.regs.pc, 0x0234);
    assert_eq!(cpu.regs.sp, 0xC0F2);
    assert!(cpu.ime);
}

#[test]
fn halt_idles_until_an_interrupt_pends() {
    let (mut cpu, mut bus) = seeded(&[0x76, 0x00]);
    cpu.step(&mut bus).unwrap(); // HALT
    assert!(cpu.halted);
    let cycles = cpu.step(&mut bus).unwrap(); // idle
    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.pc, 0x0001);

    // Enabled-pending interrupt wakes the CPU even with IME clear
    arm_interrupt(&mut bus, 0x01, 0x01);
    cpu.step(&mut bus).unwrap(); // wakes and runs the NOP after HALT
    assert!(!cpu.halted);
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn halt_bug_replays_the_following_byte() {
    // HALT with IME=0 and IE&IF != 0: INC B after it runs twice
    let (mut cpu, mut bus) = seeded(&[0x76, 0x04, 0x00]);
    arm_interrupt(&mut bus, 0x01, 0x01);
    cpu.step(&mut bus).unwrap(); // HALT does not halt, arms the bug
    assert!(!cpu.halted);
    cpu.step(&mut bus).unwrap(); // INC B, PC stuck at 0x0001
    assert_eq!(cpu.regs.b, 1);
    assert_eq!(cpu.regs.pc, 0x0001);
    cpu.step(&mut bus).unwrap(); // INC B again, PC moves on
    assert_eq!(cpu.regs.b, 2);
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn stop_parks_like_halt() {
    let (mut cpu, mut bus) = seeded(&[0x10, 0x00]);
    cpu.step(&mut bus).unwrap();
    assert!(cpu.halted);
    assert_eq!(cpu.regs.pc, 0x0002);
}

// ========== Executor bookkeeping ==========

#[test]
fn pc_advances_by_instruction_length() {
    // One case per operand width, plus the CB page
    let cases: &[(&[u8], u16)] = &[
        (&[0x00], 1),             // NOP
        (&[0x06, 0x44], 2),       // LD B, d8
        (&[0x01, 0x22, 0x11], 3), // LD BC, d16
        (&[0xCB, 0x37], 2),       // SWAP A
    ];
    for (program, expected) in cases {
        let (mut cpu, mut bus) = seeded(program);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, *expected, "program {:02X?}", program);
    }
}

#[test]
fn every_table_entry_costs_cycles() {
    for (index, entry) in INSTRUCTIONS.iter().enumerate() {
        assert!(entry.cycles > 0, "opcode {:#04X}", index);
        assert!(entry.length >= 1, "opcode {:#04X}", index);
    }
    for (index, entry) in CB_INSTRUCTIONS.iter().enumerate() {
        assert!(entry.cycles > 0, "CB opcode {:#04X}", index);
        assert_eq!(entry.length, 2, "CB opcode {:#04X}", index);
    }
}

#[test]
fn unknown_opcode_is_a_fault_not_a_noop() {
    let (mut cpu, mut bus) = seeded(&[0xD3]);
    let error = cpu.step(&mut bus).unwrap_err();
    assert!(error.contains("0xD3"), "message: {}", error);
    assert!(error.contains("PC=0x0000"), "message: {}", error);
}

#[test]
fn total_cycles_accumulate() {
    let (mut cpu, mut bus) = seeded(&[0x00, 0x06, 0x01, 0xC3, 0x00, 0xC0]);
    cpu.step(&mut bus).unwrap(); // 4
    cpu.step(&mut bus).unwrap(); // 8
    cpu.step(&mut bus).unwrap(); // 16
    assert_eq!(cpu.total_cycles(), 28);
}

#[test]
fn run_executes_up_to_n_steps_and_honors_terminate() {
    let (mut cpu, mut bus) = seeded(&[0x18, 0xFE]); // JR -2 forever
    let terminate = AtomicBool::new(false);
    let executed = cpu.run(&mut bus, 100, &terminate).unwrap();
    assert_eq!(executed, 100);

    terminate.store(true, std::sync::atomic::Ordering::Release);
    let executed = cpu.run(&mut bus, 100, &terminate).unwrap();
    assert_eq!(executed, 0);
}

#[test]
fn post_boot_state_matches_hardware_handoff() {
    let cpu = Cpu::new();
    assert_eq!(cpu.regs.pc, 0x0100);
    assert_eq!(cpu.regs.sp, 0xFFFE);
    assert_eq!(cpu.regs.get_af(), 0x01B0);
    assert_eq!(cpu.regs.get_bc(), 0x0013);
    assert_eq!(cpu.regs.get_de(), 0x00D8);
    assert_eq!(cpu.regs.get_hl(), 0x014D);
    assert!(!cpu.ime());
    assert!(!cpu.halted());
}

#[test]
fn f_low_nibble_stays_clear_across_execution() {
    // A mix of flag-heavy instructions; the invariant holds throughout
    let (mut cpu, mut bus) = seeded(&[0x81, 0x27, 0x37, 0x3F, 0xF5, 0xF1]);
    cpu.regs.a = 0xFF;
    cpu.regs.c = 0x01;
    for _ in 0..6 {
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.f & 0x0F, 0);
    }
}
