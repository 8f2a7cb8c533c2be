
use emu_lib::Emulator;
use emu_lib::io::RawMode;

use common::constants::PC_START;
use obj::{Image, ImageError};

use clap::Parser;
use crossterm::terminal;

use std::fs::File;
use std::process::ExitCode;

/// LC-3 Emulator
#[derive(Parser)]
struct Args {
    /// Program image to execute
    image: String,

    /// Address at which to start executing.
    #[arg(long, default_value_t = PC_START)]
    start: u16,
}

fn load(path: &str) -> Result<Image, ImageError> {
    let mut file = File::open(path)?;
    Image::read_from(&mut file)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let image = match load(&args.image) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("{}: {err}", args.image);
            return ExitCode::FAILURE;
        }
    };

    let mut emu = Emulator::new();
    emu.load_image(&image);

    // Restore the terminal even if we are killed from outside; the raw-mode
    // guard below only covers this process's own exit paths.
    ctrlc::set_handler(|| {
        let _ = terminal::disable_raw_mode();
        std::process::exit(130);
    })
    .expect("failed to install signal handler");

    let raw = match RawMode::enable() {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("failed to enter raw mode: {err}");
            return ExitCode::FAILURE;
        }
    };

    let res = emu.run_at(args.start);
    drop(raw);

    if let Err(err) = res {
        eprintln!("fatal: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
