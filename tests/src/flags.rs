use crate::helpers::*;
use common::asm::Reg;
use common::constants::PC_START;
use emu_lib::Cond;

// Load an arbitrary word into r0 and report the resulting flags.
fn flags_after(val: u16) -> Cond {
    let prog = [
        ld(Reg::R0, 1), // 0x3000: r0 = data
        halt(),         // 0x3001
        val,            // 0x3002
    ];
    let emu = run(&prog);
    assert_eq!(emu.reg_read(Reg::R0), val);
    emu.cond()
}

#[test]
fn zero_sets_zro() {
    assert_eq!(flags_after(0), Cond::Zro);
}

#[test]
fn high_bit_sets_neg() {
    assert_eq!(flags_after(0x8000), Cond::Neg);
    assert_eq!(flags_after(0xffff), Cond::Neg);
}

#[test]
fn positive_sets_pos() {
    assert_eq!(flags_after(1), Cond::Pos);
    assert_eq!(flags_after(0x7fff), Cond::Pos);
}

// Each register write leaves exactly one flag, consistent with the value
// just written.
#[test]
fn every_writer_updates_flags() {
    let prog = [
        add_imm(Reg::R0, Reg::R0, -1), // 0x3000: r0 = 0xffff
        not(Reg::R1, Reg::R0),         // 0x3001: r1 = 0
        lea(Reg::R2, 0),               // 0x3002: r2 = 0x3003
        halt(),                        // 0x3003
    ];
    let (mut emu, _console) = emu_with(&prog);
    assert_eq!(emu.cond(), Cond::Zro);

    emu.step().unwrap();
    assert_eq!(emu.cond(), Cond::Neg);

    emu.step().unwrap();
    assert_eq!(emu.cond(), Cond::Zro);

    emu.step().unwrap();
    assert_eq!(emu.cond(), Cond::Pos);

    emu.run_at(emu.pc()).unwrap();
    assert_eq!(emu.pc(), PC_START + 4);
}
