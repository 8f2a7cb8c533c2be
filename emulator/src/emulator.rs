
use crate::EmulatorState;
use crate::emulator_state::Cond;
use crate::io::keyboard::Keyboard;
use crate::io::{Console, MMIOHandler, StdConsole};

use common::asm::*;
use common::constants::MMIO_START;

use obj::Image;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use delegate::delegate;
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRet {
    Ok,
    Halt,
}

/// A fault that stops the machine with no resumption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmuError {
    #[error("invalid opcode: word {word:#06x} fetched from {addr:#06x}")]
    InvalidOpcode { word: u16, addr: u16 },
    #[error("unknown trap vector x{vector:02x} at {addr:#06x}")]
    UnknownTrap { vector: u8, addr: u16 },
}

pub struct Emulator {
    pub(crate) state: EmulatorState,
    mmio_handlers: HashMap<u16, Arc<Mutex<dyn MMIOHandler>>>,
    pub(crate) console: Arc<dyn Console>,
}

impl Emulator {
    pub fn new() -> Emulator {
        Self::with_console(Arc::new(StdConsole::default()))
    }

    /// The keyboard device and the trap services share `console`.
    pub fn with_console(console: Arc<dyn Console>) -> Emulator {
        let mut emu = Emulator {
            state: EmulatorState::new(),
            mmio_handlers: HashMap::new(),
            console: console.clone(),
        };
        emu.set_mmio_handler(Keyboard::new(console));
        emu
    }

    // Run until a halt.
    pub fn run(&mut self) -> Result<(), EmuError> {
        while self.step()? != ExecRet::Halt {}
        Ok(())
    }

    pub fn run_at(&mut self, pc: u16) -> Result<(), EmuError> {
        self.state.set_pc(pc);
        self.run()
    }

    // Fetch, decode and execute a single instruction.
    pub fn step(&mut self) -> Result<ExecRet, EmuError> {
        let fetch_pc = self.state.pc();
        let word = self.mem_read(fetch_pc);
        // Increment before executing: every PC-relative offset below is
        // taken against the address of the following instruction.
        self.state.set_pc(fetch_pc.wrapping_add(1));

        let Some(ins) = decode(word) else {
            return Err(EmuError::InvalidOpcode {
                word,
                addr: fetch_pc,
            });
        };
        debug!(
            "PC {fetch_pc:#06x}: {}",
            ins.display_with_pc(self.state.pc())
        );

        self.exec(&ins)
    }

    pub fn load_image(&mut self, image: &Image) {
        self.load_words(&image.words, image.origin);
    }

    // Loading truncates silently at the end of the address space.
    pub fn load_words(&mut self, words: &[u16], origin: u16) {
        for (word, addr) in words.iter().zip(origin..=u16::MAX) {
            self.state.mem_write(addr, *word);
        }
    }

    pub fn set_mmio_handler(&mut self, handler: impl MMIOHandler + 'static) {
        let handler = Arc::new(Mutex::new(handler));
        for addr in handler.lock().unwrap().default_addrs() {
            self.register_handler(handler.clone(), *addr);
        }
    }

    pub fn set_mmio_handler_for<M, I>(&mut self, handler: M, addrs: I)
    where
        M: MMIOHandler + 'static,
        I: IntoIterator<Item = u16>,
    {
        let handler = Arc::new(Mutex::new(handler));
        for addr in addrs.into_iter() {
            self.register_handler(handler.clone(), addr);
        }
    }

    fn register_handler(&mut self, handler: Arc<Mutex<dyn MMIOHandler>>, addr: u16) {
        assert!(addr >= MMIO_START, "MMIO register {addr:#06x} below device space");
        let prev = self.mmio_handlers.insert(addr, handler);
        assert!(prev.is_none(), "Duplicate MMIOHandler for {addr:#06x}");
    }

    ///////////////////////////////////////////////////////////////////////////

    pub fn mem_read(&mut self, addr: u16) -> u16 {
        if let Some(handler) = self.mmio_handlers.get_mut(&addr) {
            return handler.lock().unwrap().read(&mut self.state, addr);
        }
        self.state.mem_read(addr)
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        if let Some(handler) = self.mmio_handlers.get_mut(&addr) {
            handler.lock().unwrap().write(&mut self.state, addr, val);
            return;
        }
        self.state.mem_write(addr, val)
    }

    pub fn get_state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    delegate! {
        to self.state {
            pub fn reg_read(&self, reg: Reg) -> u16;
            pub fn reg_write(&mut self, reg: Reg, val: u16);
            pub fn pc(&self) -> u16;
            pub fn cond(&self) -> Cond;
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute
    ///////////////////////////////////////////////////////////////////////////

    fn exec(&mut self, ins: &Ins) -> Result<ExecRet, EmuError> {
        match ins {
            Ins::Operate(ins) => self.exec_operate_ins(ins),
            Ins::Not(ins) => self.exec_not_ins(ins),
            Ins::Branch(ins) => self.exec_branch_ins(ins),
            Ins::Jmp(ins) => self.exec_jmp_ins(ins),
            Ins::Jsr(ins) => self.exec_jsr_ins(ins),
            Ins::PcRel(ins) => self.exec_pc_rel_ins(ins),
            Ins::BaseOffset(ins) => self.exec_base_offset_ins(ins),
            Ins::Trap(ins) => return self.exec_trap_ins(ins),
        }

        Ok(ExecRet::Ok)
    }

    fn exec_operate_ins(&mut self, ins: &OperateIns) {
        let lhs = self.state.reg_read(ins.sr1);
        let rhs = match ins.src2 {
            Src2::Reg(sr2) => self.state.reg_read(sr2),
            Src2::Imm(imm) => imm,
        };
        let val = match ins.op {
            OperateOpcode::Add => lhs.wrapping_add(rhs),
            OperateOpcode::And => lhs & rhs,
        };
        self.state.reg_write(ins.dr, val);
        self.state.update_flags(ins.dr);
    }

    fn exec_not_ins(&mut self, ins: &NotIns) {
        let val = !self.state.reg_read(ins.sr);
        self.state.reg_write(ins.dr, val);
        self.state.update_flags(ins.dr);
    }

    fn exec_branch_ins(&mut self, ins: &BranchIns) {
        let cond = self.state.cond();
        let taken = (ins.n && cond == Cond::Neg)
            || (ins.z && cond == Cond::Zro)
            || (ins.p && cond == Cond::Pos);
        if taken {
            let pc = self.state.pc().wrapping_add(ins.offset);
            self.state.set_pc(pc);
        }
    }

    fn exec_jmp_ins(&mut self, ins: &JmpIns) {
        self.state.set_pc(self.state.reg_read(ins.base));
    }

    fn exec_jsr_ins(&mut self, ins: &JsrIns) {
        // R7 is the link register: it receives the address of the
        // instruction after the JSR, captured before PC moves.
        let ret = self.state.pc();
        self.state.reg_write(Reg::R7, ret);
        let target = match ins.target {
            JsrTarget::Offset(offset) => ret.wrapping_add(offset),
            JsrTarget::Reg(base) => self.state.reg_read(base),
        };
        self.state.set_pc(target);
    }

    fn exec_pc_rel_ins(&mut self, ins: &PcRelIns) {
        let addr = self.state.pc().wrapping_add(ins.offset);
        match ins.op {
            PcRelOpcode::Ld => {
                let val = self.mem_read(addr);
                self.state.reg_write(ins.reg, val);
                self.state.update_flags(ins.reg);
            }
            PcRelOpcode::Ldi => {
                let indirect = self.mem_read(addr);
                let val = self.mem_read(indirect);
                self.state.reg_write(ins.reg, val);
                self.state.update_flags(ins.reg);
            }
            PcRelOpcode::Lea => {
                self.state.reg_write(ins.reg, addr);
                self.state.update_flags(ins.reg);
            }
            PcRelOpcode::St => {
                self.mem_write(addr, self.state.reg_read(ins.reg));
            }
            PcRelOpcode::Sti => {
                let indirect = self.mem_read(addr);
                self.mem_write(indirect, self.state.reg_read(ins.reg));
            }
        }
    }

    fn exec_base_offset_ins(&mut self, ins: &BaseOffsetIns) {
        let addr = self.state.reg_read(ins.base).wrapping_add(ins.offset);
        match ins.op {
            BaseOffsetOpcode::Ldr => {
                let val = self.mem_read(addr);
                self.state.reg_write(ins.reg, val);
                self.state.update_flags(ins.reg);
            }
            BaseOffsetOpcode::Str => {
                self.mem_write(addr, self.state.reg_read(ins.reg));
            }
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
