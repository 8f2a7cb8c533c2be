use crate::helpers::*;
use common::asm::Reg;
use emu_lib::Cond;

#[test]
fn st_writes_pc_relative() {
    let prog = [
        add_imm(Reg::R0, Reg::R0, 7), // 0x3000
        st(Reg::R0, 1),               // 0x3001: writes 0x3003
        halt(),                       // 0x3002
        0,                            // 0x3003
    ];
    let emu = run(&prog);
    assert_eq!(emu.get_state().mem_read(0x3003), 7);
}

#[test]
fn sti_writes_through_pointer() {
    let prog = [
        add_imm(Reg::R0, Reg::R0, 5), // 0x3000
        sti(Reg::R0, 1),              // 0x3001: pointer at 0x3003
        halt(),                       // 0x3002
        0x4000,                       // 0x3003
    ];
    let emu = run(&prog);
    assert_eq!(emu.get_state().mem_read(0x4000), 5);
    assert_eq!(emu.get_state().mem_read(0x3003), 0x4000);
}

#[test]
fn str_writes_base_plus_offset() {
    let prog = [
        add_imm(Reg::R0, Reg::R0, 3), // 0x3000
        lea(Reg::R1, 2),              // 0x3001: r1 = 0x3004
        str_(Reg::R0, Reg::R1, 1),    // 0x3002: writes 0x3005
        halt(),                       // 0x3003
        0,                            // 0x3004
        0,                            // 0x3005
    ];
    let emu = run(&prog);
    assert_eq!(emu.get_state().mem_read(0x3005), 3);
    assert_eq!(emu.get_state().mem_read(0x3004), 0);
}

// Stores never touch the flags.
#[test]
fn stores_leave_flags_alone() {
    let prog = [
        add_imm(Reg::R0, Reg::R0, -3), // 0x3000: Neg
        st(Reg::R0, 1),                // 0x3001
        halt(),                        // 0x3002
        0,                             // 0x3003
    ];
    let emu = run(&prog);
    assert_eq!(emu.cond(), Cond::Neg);
}
