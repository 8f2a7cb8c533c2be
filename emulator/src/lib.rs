pub mod emulator;
pub mod emulator_state;
pub mod io;
pub mod traps;

pub use emulator::{EmuError, Emulator, ExecRet};
pub use emulator_state::{Cond, EmulatorState};
pub use io::MMIOHandler;
