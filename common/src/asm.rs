
use crate::bits::{bit, field, sign_extend};

use std::fmt;

use delegate::delegate;
use derive_more::{IsVariant, Unwrap};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

// The 4-bit opcode space. Rti and Res are reserved: they decode to no
// instruction and halt the machine if fetched.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Opcode {
    Br = 0,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    Res,
    Lea,
    Trap,
}

impl Opcode {
    pub const NUM_BITS: u16 = 4;
    pub const SHIFT: u16 = 16 - Self::NUM_BITS;

    pub fn of(word: u16) -> Opcode {
        // The 4-bit field is total over the enum.
        Opcode::from_u16(field(word, Self::SHIFT, Self::NUM_BITS)).unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

pub const NUM_REGS: usize = 8;

impl Reg {
    pub const NUM_BITS: u16 = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    fn decode(word: u16, lsb: u16) -> Reg {
        Reg::from_u16(field(word, lsb, Self::NUM_BITS)).unwrap()
    }

    fn encode(self, lsb: u16) -> u16 {
        self.to_u16().unwrap() << lsb
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

////////////////////////////////////////////////////////////////////////////////

// Second operand of ADD/AND: a register, or a sign-extended 5-bit immediate,
// selected by bit 5 of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum Src2 {
    Reg(Reg),
    Imm(u16),
}

impl fmt::Display for Src2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Src2::Reg(reg) => write!(f, "{reg}"),
            Src2::Imm(imm) => write!(f, "#{}", *imm as i16),
        }
    }
}

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum OperateOpcode {
    Add = 1,
    And = 5,
}

impl fmt::Display for OperateOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperateIns {
    pub op: OperateOpcode,
    pub dr: Reg,
    pub sr1: Reg,
    pub src2: Src2,
}

impl OperateIns {
    const IMM_FLAG_IDX: u16 = 5;
    const IMM_NUM_BITS: u16 = 5;
    const IMM_MASK: u16 = (1u16 << Self::IMM_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        let op = OperateOpcode::from_u16(Opcode::of(word).to_u16().unwrap()).unwrap();
        let dr = Reg::decode(word, 9);
        let sr1 = Reg::decode(word, 6);
        let src2 = if bit(word, Self::IMM_FLAG_IDX) == 1 {
            let imm = field(word, 0, Self::IMM_NUM_BITS);
            Src2::Imm(sign_extend(imm, Self::IMM_NUM_BITS))
        } else {
            Src2::Reg(Reg::decode(word, 0))
        };
        Ins::Operate(OperateIns { op, dr, sr1, src2 })
    }

    pub fn encode(&self) -> u16 {
        let word = (self.op.to_u16().unwrap() << Opcode::SHIFT)
            | self.dr.encode(9)
            | self.sr1.encode(6);
        match self.src2 {
            Src2::Reg(sr2) => word | sr2.encode(0),
            Src2::Imm(imm) => word | (1u16 << Self::IMM_FLAG_IDX) | (imm & Self::IMM_MASK),
        }
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, _pc: u16) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for OperateIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}, {}, {}", self.op, self.dr, self.sr1, self.src2)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotIns {
    pub dr: Reg,
    pub sr: Reg,
}

impl NotIns {
    // Bits 5..0 are all ones in the defined encoding.
    const LOW_BITS: u16 = 0x3f;

    fn decode(word: u16) -> Ins {
        Ins::Not(NotIns {
            dr: Reg::decode(word, 9),
            sr: Reg::decode(word, 6),
        })
    }

    pub fn encode(&self) -> u16 {
        (Opcode::Not.to_u16().unwrap() << Opcode::SHIFT)
            | self.dr.encode(9)
            | self.sr.encode(6)
            | Self::LOW_BITS
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, _pc: u16) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for NotIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "not\t{}, {}", self.dr, self.sr)
    }
}

////////////////////////////////////////////////////////////////////////////////

// The offset is kept sign-extended; execution adds it to the incremented PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchIns {
    pub n: bool,
    pub z: bool,
    pub p: bool,
    pub offset: u16,
}

impl BranchIns {
    pub const OFFSET_NUM_BITS: u16 = 9;
    const OFFSET_MASK: u16 = (1u16 << Self::OFFSET_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        Ins::Branch(BranchIns {
            n: bit(word, 11) == 1,
            z: bit(word, 10) == 1,
            p: bit(word, 9) == 1,
            offset: sign_extend(field(word, 0, Self::OFFSET_NUM_BITS), Self::OFFSET_NUM_BITS),
        })
    }

    pub fn encode(&self) -> u16 {
        (Opcode::Br.to_u16().unwrap() << Opcode::SHIFT)
            | ((self.n as u16) << 11)
            | ((self.z as u16) << 10)
            | ((self.p as u16) << 9)
            | (self.offset & Self::OFFSET_MASK)
    }

    fn fmt_mnemonic(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "br")?;
        if self.n {
            write!(f, "n")?;
        }
        if self.z {
            write!(f, "z")?;
        }
        if self.p {
            write!(f, "p")?;
        }
        Ok(())
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result {
        self.fmt_mnemonic(f)?;
        write!(f, "\tx{:04x}", pc.wrapping_add(self.offset))
    }
}

impl fmt::Display for BranchIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_mnemonic(f)?;
        write!(f, "\t#{}", self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JmpIns {
    pub base: Reg,
}

impl JmpIns {
    fn decode(word: u16) -> Ins {
        Ins::Jmp(JmpIns {
            base: Reg::decode(word, 6),
        })
    }

    pub fn encode(&self) -> u16 {
        (Opcode::Jmp.to_u16().unwrap() << Opcode::SHIFT) | self.base.encode(6)
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, _pc: u16) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for JmpIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // JMP through the link register is the subroutine return.
        if self.base == Reg::R7 {
            write!(f, "ret")
        } else {
            write!(f, "jmp\t{}", self.base)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// Subroutine target: PC-relative (JSR, bit 11 set) or through a base
// register (JSRR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum JsrTarget {
    Offset(u16),
    Reg(Reg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsrIns {
    pub target: JsrTarget,
}

impl JsrIns {
    const MODE_IDX: u16 = 11;
    pub const OFFSET_NUM_BITS: u16 = 11;
    const OFFSET_MASK: u16 = (1u16 << Self::OFFSET_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        let target = if bit(word, Self::MODE_IDX) == 1 {
            let offset = field(word, 0, Self::OFFSET_NUM_BITS);
            JsrTarget::Offset(sign_extend(offset, Self::OFFSET_NUM_BITS))
        } else {
            JsrTarget::Reg(Reg::decode(word, 6))
        };
        Ins::Jsr(JsrIns { target })
    }

    pub fn encode(&self) -> u16 {
        let word = Opcode::Jsr.to_u16().unwrap() << Opcode::SHIFT;
        match self.target {
            JsrTarget::Offset(offset) => {
                word | (1u16 << Self::MODE_IDX) | (offset & Self::OFFSET_MASK)
            }
            JsrTarget::Reg(base) => word | base.encode(6),
        }
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result {
        match self.target {
            JsrTarget::Offset(offset) => write!(f, "jsr\tx{:04x}", pc.wrapping_add(offset)),
            JsrTarget::Reg(base) => write!(f, "jsrr\t{base}"),
        }
    }
}

impl fmt::Display for JsrIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.target {
            JsrTarget::Offset(offset) => write!(f, "jsr\t#{}", offset as i16),
            JsrTarget::Reg(base) => write!(f, "jsrr\t{base}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// LD/LDI/LEA/ST/STI share one layout: opcode, a register, and a 9-bit
// PC-relative offset. `reg` is the destination for the loads and the source
// for the stores.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum PcRelOpcode {
    Ld = 2,
    St = 3,
    Ldi = 10,
    Sti = 11,
    Lea = 14,
}

impl fmt::Display for PcRelOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcRelIns {
    pub op: PcRelOpcode,
    pub reg: Reg,
    pub offset: u16,
}

impl PcRelIns {
    pub const OFFSET_NUM_BITS: u16 = 9;
    const OFFSET_MASK: u16 = (1u16 << Self::OFFSET_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        let op = PcRelOpcode::from_u16(Opcode::of(word).to_u16().unwrap()).unwrap();
        Ins::PcRel(PcRelIns {
            op,
            reg: Reg::decode(word, 9),
            offset: sign_extend(field(word, 0, Self::OFFSET_NUM_BITS), Self::OFFSET_NUM_BITS),
        })
    }

    pub fn encode(&self) -> u16 {
        (self.op.to_u16().unwrap() << Opcode::SHIFT)
            | self.reg.encode(9)
            | (self.offset & Self::OFFSET_MASK)
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result {
        write!(
            f,
            "{}\t{}, x{:04x}",
            self.op,
            self.reg,
            pc.wrapping_add(self.offset)
        )
    }
}

impl fmt::Display for PcRelIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}, #{}", self.op, self.reg, self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

// LDR/STR: a register, a base register, and a 6-bit offset.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum BaseOffsetOpcode {
    Ldr = 6,
    Str = 7,
}

impl fmt::Display for BaseOffsetOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseOffsetIns {
    pub op: BaseOffsetOpcode,
    pub reg: Reg,
    pub base: Reg,
    pub offset: u16,
}

impl BaseOffsetIns {
    pub const OFFSET_NUM_BITS: u16 = 6;
    const OFFSET_MASK: u16 = (1u16 << Self::OFFSET_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        let op = BaseOffsetOpcode::from_u16(Opcode::of(word).to_u16().unwrap()).unwrap();
        Ins::BaseOffset(BaseOffsetIns {
            op,
            reg: Reg::decode(word, 9),
            base: Reg::decode(word, 6),
            offset: sign_extend(field(word, 0, Self::OFFSET_NUM_BITS), Self::OFFSET_NUM_BITS),
        })
    }

    pub fn encode(&self) -> u16 {
        (self.op.to_u16().unwrap() << Opcode::SHIFT)
            | self.reg.encode(9)
            | self.base.encode(6)
            | (self.offset & Self::OFFSET_MASK)
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, _pc: u16) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for BaseOffsetIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}, {}, #{}",
            self.op,
            self.reg,
            self.base,
            self.offset as i16
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum TrapVector {
    Getc = 0x20,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

impl fmt::Display for TrapVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapIns {
    pub vector: u8,
}

impl TrapIns {
    pub const VECTOR_NUM_BITS: u16 = 8;
    const VECTOR_MASK: u16 = (1u16 << Self::VECTOR_NUM_BITS) - 1;

    fn decode(word: u16) -> Ins {
        Ins::Trap(TrapIns {
            vector: field(word, 0, Self::VECTOR_NUM_BITS) as u8,
        })
    }

    pub fn encode(&self) -> u16 {
        (Opcode::Trap.to_u16().unwrap() << Opcode::SHIFT) | (self.vector as u16 & Self::VECTOR_MASK)
    }

    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, _pc: u16) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for TrapIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match TrapVector::from_u8(self.vector) {
            Some(vector) => write!(f, "{vector}"),
            None => write!(f, "trap\tx{:02x}", self.vector),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Operate(OperateIns),
    Not(NotIns),
    Branch(BranchIns),
    Jmp(JmpIns),
    Jsr(JsrIns),
    PcRel(PcRelIns),
    BaseOffset(BaseOffsetIns),
    Trap(TrapIns),
}

impl Ins {
    delegate! {
        to match self {
            Ins::Operate(x) => x,
            Ins::Not(x) => x,
            Ins::Branch(x) => x,
            Ins::Jmp(x) => x,
            Ins::Jsr(x) => x,
            Ins::PcRel(x) => x,
            Ins::BaseOffset(x) => x,
            Ins::Trap(x) => x,
        } {
            pub fn encode(&self) -> u16;
            pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result;
        }
    }

    pub fn display_with_pc(&self, pc: u16) -> InsWithPc {
        InsWithPc(self, pc)
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ins::Operate(ins) => write!(f, "{ins}"),
            Ins::Not(ins) => write!(f, "{ins}"),
            Ins::Branch(ins) => write!(f, "{ins}"),
            Ins::Jmp(ins) => write!(f, "{ins}"),
            Ins::Jsr(ins) => write!(f, "{ins}"),
            Ins::PcRel(ins) => write!(f, "{ins}"),
            Ins::BaseOffset(ins) => write!(f, "{ins}"),
            Ins::Trap(ins) => write!(f, "{ins}"),
        }
    }
}

// Just for formatting, like Path::display(). The PC is the incremented
// value, so PC-relative targets resolve the way the hardware computes them.
pub struct InsWithPc<'a>(&'a Ins, u16);

impl<'a> fmt::Display for InsWithPc<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_with_pc(f, self.1)
    }
}

// Decode one instruction word. The two reserved opcodes yield None; the
// caller decides how fatal that is.
pub fn decode(word: u16) -> Option<Ins> {
    let ins = match Opcode::of(word) {
        Opcode::Add | Opcode::And => OperateIns::decode(word),
        Opcode::Not => NotIns::decode(word),
        Opcode::Br => BranchIns::decode(word),
        Opcode::Jmp => JmpIns::decode(word),
        Opcode::Jsr => JsrIns::decode(word),
        Opcode::Ld | Opcode::St | Opcode::Ldi | Opcode::Sti | Opcode::Lea => PcRelIns::decode(word),
        Opcode::Ldr | Opcode::Str => BaseOffsetIns::decode(word),
        Opcode::Trap => TrapIns::decode(word),
        Opcode::Rti | Opcode::Res => return None,
    };
    Some(ins)
}
