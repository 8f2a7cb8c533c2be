pub mod keyboard;

use std::collections::VecDeque;
use std::io::{self, Write, stdout};
use std::sync::Mutex;
use std::time::Duration;

use crate::EmulatorState;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// A bank of memory-mapped device registers.
pub trait MMIOHandler: Send {
    fn default_addrs(&self) -> &[u16] {
        &[]
    }

    fn read(&mut self, state: &mut EmulatorState, addr: u16) -> u16;
    fn write(&mut self, state: &mut EmulatorState, addr: u16, val: u16);
}

////////////////////////////////////////////////////////////////////////////////

/// The console device: raw bytes in and out, no line buffering, no echo.
pub trait Console: Send + Sync {
    fn write(&self, val: u8);
    fn flush(&self);

    /// Non-blocking, zero-timeout check for a pending key.
    fn poll(&self) -> Option<u8>;

    /// Block until the next key arrives.
    fn read(&self) -> u8;
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Default, Clone, Copy)]
pub struct StdConsole();

impl StdConsole {
    fn key_byte(code: KeyCode) -> Option<u8> {
        match code {
            KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
            KeyCode::Enter => Some(b'\n'),
            KeyCode::Tab => Some(b'\t'),
            KeyCode::Backspace => Some(0x08),
            KeyCode::Esc => Some(0x1b),
            _ => None,
        }
    }

    fn accept(key: KeyEvent) -> Option<u8> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        // Raw mode swallows SIGINT; honor the interrupt ourselves, with the
        // terminal restored.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            let _ = terminal::disable_raw_mode();
            std::process::exit(130);
        }
        Self::key_byte(key.code)
    }
}

impl Console for StdConsole {
    fn write(&self, val: u8) {
        stdout().lock().write_all(&[val]).unwrap();
    }

    fn flush(&self) {
        stdout().lock().flush().unwrap();
    }

    fn poll(&self) -> Option<u8> {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(val) = Self::accept(key) {
                    return Some(val);
                }
            }
        }
        None
    }

    fn read(&self) -> u8 {
        loop {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(val) = Self::accept(key) {
                    return val;
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// An in-memory console for tests: input is queued up front, output is
/// captured for inspection.
#[derive(Default)]
pub struct PipeConsole {
    out_buf: Mutex<VecDeque<u8>>,
    in_buf: Mutex<VecDeque<u8>>,
}

impl PipeConsole {
    pub fn take_output(&self) -> VecDeque<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap())
    }

    pub fn output_string(&self) -> String {
        let buf = Vec::from(self.take_output());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn is_out_empty(&self) -> bool {
        self.out_buf.lock().unwrap().is_empty()
    }

    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap().push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        for val in vals.iter() {
            self.push_input(*val);
        }
    }
}

impl Console for PipeConsole {
    fn write(&self, val: u8) {
        self.out_buf.lock().unwrap().push_back(val);
    }

    fn flush(&self) {}

    fn poll(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }

    fn read(&self) -> u8 {
        self.poll()
            .expect("PipeConsole: blocking read with no input queued")
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Scoped raw-mode acquisition: construction puts the terminal in
/// unbuffered, non-echoing mode; drop restores it on every exit path,
/// including unwinding.
pub struct RawMode(());

impl RawMode {
    pub fn enable() -> io::Result<RawMode> {
        terminal::enable_raw_mode()?;
        Ok(RawMode(()))
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
