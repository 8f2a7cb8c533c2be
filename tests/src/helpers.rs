use common::asm::*;
use common::constants::PC_START;
use emu_lib::Emulator;
use emu_lib::io::PipeConsole;

use std::sync::Arc;

pub fn add_reg(dr: Reg, sr1: Reg, sr2: Reg) -> u16 {
    Ins::Operate(OperateIns {
        op: OperateOpcode::Add,
        dr,
        sr1,
        src2: Src2::Reg(sr2),
    })
    .encode()
}

pub fn add_imm(dr: Reg, sr1: Reg, imm: i16) -> u16 {
    Ins::Operate(OperateIns {
        op: OperateOpcode::Add,
        dr,
        sr1,
        src2: Src2::Imm(imm as u16),
    })
    .encode()
}

pub fn and_reg(dr: Reg, sr1: Reg, sr2: Reg) -> u16 {
    Ins::Operate(OperateIns {
        op: OperateOpcode::And,
        dr,
        sr1,
        src2: Src2::Reg(sr2),
    })
    .encode()
}

pub fn and_imm(dr: Reg, sr1: Reg, imm: i16) -> u16 {
    Ins::Operate(OperateIns {
        op: OperateOpcode::And,
        dr,
        sr1,
        src2: Src2::Imm(imm as u16),
    })
    .encode()
}

pub fn not(dr: Reg, sr: Reg) -> u16 {
    Ins::Not(NotIns { dr, sr }).encode()
}

pub fn br(n: bool, z: bool, p: bool, offset: i16) -> u16 {
    Ins::Branch(BranchIns {
        n,
        z,
        p,
        offset: offset as u16,
    })
    .encode()
}

pub fn jmp(base: Reg) -> u16 {
    Ins::Jmp(JmpIns { base }).encode()
}

pub fn ret() -> u16 {
    jmp(Reg::R7)
}

pub fn jsr(offset: i16) -> u16 {
    Ins::Jsr(JsrIns {
        target: JsrTarget::Offset(offset as u16),
    })
    .encode()
}

pub fn jsrr(base: Reg) -> u16 {
    Ins::Jsr(JsrIns {
        target: JsrTarget::Reg(base),
    })
    .encode()
}

fn pc_rel(op: PcRelOpcode, reg: Reg, offset: i16) -> u16 {
    Ins::PcRel(PcRelIns {
        op,
        reg,
        offset: offset as u16,
    })
    .encode()
}

pub fn ld(dr: Reg, offset: i16) -> u16 {
    pc_rel(PcRelOpcode::Ld, dr, offset)
}

pub fn ldi(dr: Reg, offset: i16) -> u16 {
    pc_rel(PcRelOpcode::Ldi, dr, offset)
}

pub fn lea(dr: Reg, offset: i16) -> u16 {
    pc_rel(PcRelOpcode::Lea, dr, offset)
}

pub fn st(sr: Reg, offset: i16) -> u16 {
    pc_rel(PcRelOpcode::St, sr, offset)
}

pub fn sti(sr: Reg, offset: i16) -> u16 {
    pc_rel(PcRelOpcode::Sti, sr, offset)
}

pub fn ldr(dr: Reg, base: Reg, offset: i16) -> u16 {
    Ins::BaseOffset(BaseOffsetIns {
        op: BaseOffsetOpcode::Ldr,
        reg: dr,
        base,
        offset: offset as u16,
    })
    .encode()
}

pub fn str_(sr: Reg, base: Reg, offset: i16) -> u16 {
    Ins::BaseOffset(BaseOffsetIns {
        op: BaseOffsetOpcode::Str,
        reg: sr,
        base,
        offset: offset as u16,
    })
    .encode()
}

pub fn trap(vector: u8) -> u16 {
    Ins::Trap(TrapIns { vector }).encode()
}

pub fn getc() -> u16 {
    trap(0x20)
}

pub fn out() -> u16 {
    trap(0x21)
}

pub fn puts() -> u16 {
    trap(0x22)
}

pub fn in_() -> u16 {
    trap(0x23)
}

pub fn putsp() -> u16 {
    trap(0x24)
}

pub fn halt() -> u16 {
    trap(0x25)
}

////////////////////////////////////////////////////////////////////////////////

// Build an emulator on a pipe console with the program loaded at PC_START.
pub fn emu_with(words: &[u16]) -> (Emulator, Arc<PipeConsole>) {
    let console = Arc::new(PipeConsole::default());
    let mut emu = Emulator::with_console(console.clone());
    emu.load_words(words, PC_START);
    (emu, console)
}

// Run a program that ends in a proper halt.
pub fn run(words: &[u16]) -> Emulator {
    let (mut emu, _console) = emu_with(words);
    emu.run_at(PC_START).unwrap();
    emu
}
