use crate::helpers::*;
use common::asm::Reg;

#[test]
fn jmp_sets_pc_from_base() {
    let prog = [
        lea(Reg::R1, 2),               // 0x3000: r1 = 0x3003
        jmp(Reg::R1),                  // 0x3001
        add_imm(Reg::R0, Reg::R0, 1),  // 0x3002: jumped over
        halt(),                        // 0x3003
    ];
    let emu = run(&prog);
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(emu.pc(), 0x3004);
}

// JMP through R7 is the subroutine return.
#[test]
fn jmp_through_r7_returns() {
    let prog = [
        jsr(1),                        // 0x3000: r7 = 0x3001
        halt(),                        // 0x3001: return lands here
        add_imm(Reg::R2, Reg::R2, 7),  // 0x3002: subroutine body
        ret(),                         // 0x3003
    ];
    let emu = run(&prog);
    assert_eq!(emu.reg_read(Reg::R2), 7);
    assert_eq!(emu.pc(), 0x3002);
}
