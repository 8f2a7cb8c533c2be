
use crate::emulator::{EmuError, Emulator, ExecRet};

use common::asm::{Reg, TrapIns, TrapVector};

use num_traits::FromPrimitive;

const IN_PROMPT: &[u8] = b"Enter a single character: ";
const HALT_NOTICE: &[u8] = b"Execution halted\n";

impl Emulator {
    pub(crate) fn exec_trap_ins(&mut self, ins: &TrapIns) -> Result<ExecRet, EmuError> {
        // Like a subroutine call: R7 receives the address of the
        // instruction after the TRAP.
        self.state.reg_write(Reg::R7, self.state.pc());

        let Some(vector) = TrapVector::from_u8(ins.vector) else {
            return Err(EmuError::UnknownTrap {
                vector: ins.vector,
                addr: self.state.pc().wrapping_sub(1),
            });
        };

        match vector {
            TrapVector::Getc => self.trap_getc(),
            TrapVector::Out => self.trap_out(),
            TrapVector::Puts => self.trap_puts(),
            TrapVector::In => self.trap_in(),
            TrapVector::Putsp => self.trap_putsp(),
            TrapVector::Halt => return Ok(self.trap_halt()),
        }

        Ok(ExecRet::Ok)
    }

    // One character from the keyboard, no echo.
    fn trap_getc(&mut self) {
        let ch = self.console.read();
        self.state.reg_write(Reg::R0, ch as u16);
        self.state.update_flags(Reg::R0);
    }

    fn trap_out(&mut self) {
        self.console.write(self.state.reg_read(Reg::R0) as u8);
        self.console.flush();
    }

    // One character per cell in its low byte, starting at the address in
    // R0; a zero cell terminates.
    fn trap_puts(&mut self) {
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.state.mem_read(addr);
            if word == 0 {
                break;
            }
            self.console.write(word as u8);
            addr = addr.wrapping_add(1);
        }
        self.console.flush();
    }

    fn trap_in(&mut self) {
        for val in IN_PROMPT {
            self.console.write(*val);
        }
        self.console.flush();

        let ch = self.console.read();
        self.console.write(ch);
        self.console.flush();
        self.state.reg_write(Reg::R0, ch as u16);
        self.state.update_flags(Reg::R0);
    }

    // Two characters per cell, low byte then high byte; the first zero
    // byte in either half ends the string.
    fn trap_putsp(&mut self) {
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.state.mem_read(addr);
            if word == 0 {
                break;
            }
            self.console.write(word as u8);

            let high = (word >> 8) as u8;
            if high == 0 {
                break;
            }
            self.console.write(high);
            addr = addr.wrapping_add(1);
        }
        self.console.flush();
    }

    fn trap_halt(&mut self) -> ExecRet {
        for val in HALT_NOTICE {
            self.console.write(*val);
        }
        self.console.flush();
        ExecRet::Halt
    }
}
