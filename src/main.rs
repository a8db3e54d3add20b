//! LC-3 Emulator - CLI Entry Point
//!
//! Usage: `lc3-emu [OPTIONS] <IMAGE>`
//!
//! Program output goes to stdout; diagnostics, logs (`RUST_LOG`) and the
//! optional instruction trace go to stderr.

use clap::Parser;
use lc3::io::{spawn_stdin_pump, ConsoleWriter};
use lc3::{load_obj, Cpu, CpuError, Executed, Registers};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lc3-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An instruction-level emulator of the LC-3 educational computer")]
struct Cli {
    /// Path to the LC-3 object image to execute
    image: PathBuf,

    /// Write one JSON line per executed instruction to stderr
    #[arg(short, long)]
    trace: bool,

    /// Stop after this many instructions
    #[arg(short, long)]
    max_steps: Option<u64>,

    /// Leave the terminal line-buffered instead of switching to raw mode
    #[arg(long)]
    no_raw: bool,
}

/// One `--trace` record, written after the instruction has executed.
#[derive(Serialize)]
struct TraceLine<'a> {
    step: u64,
    #[serde(flatten)]
    executed: Executed,
    regs: &'a Registers,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let code = run(&cli);
    std::process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load and run the image; returns the process exit code.
fn run(cli: &Cli) -> i32 {
    let image = match load_obj(&cli.image) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", cli.image.display(), e);
            return 1;
        }
    };

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_image(&image) {
        eprintln!("❌ Failed to load program: {}", e);
        return 1;
    }

    #[cfg(feature = "terminal")]
    let raw_guard = if cli.no_raw {
        None
    } else {
        lc3::io::RawModeGuard::enable().unwrap_or_else(|e| {
            tracing::warn!("could not enable raw mode: {}", e);
            None
        })
    };
    #[cfg(feature = "terminal")]
    let raw = raw_guard.is_some();
    #[cfg(not(feature = "terminal"))]
    let raw = false;

    if let Err(e) = spawn_stdin_pump(cpu.mem.keyboard_sender(), raw) {
        tracing::warn!("keyboard input unavailable: {}", e);
    }

    let mut out = ConsoleWriter::new(io::stdout().lock(), raw);
    // Stderr is not held locked: the input thread may need it on Ctrl+C.
    let mut trace = cli.trace.then(|| ConsoleWriter::new(io::stderr(), raw));
    let limit = cli.max_steps.unwrap_or(u64::MAX);

    let result = cpu
        .run_traced(&mut out, limit, |cpu, executed| match trace.as_mut() {
            Some(trace) => write_trace(trace, cpu, executed),
            None => Ok(()),
        })
        .and_then(|_| out.flush().map_err(CpuError::from));

    #[cfg(feature = "terminal")]
    drop(raw_guard);

    match result {
        Ok(()) if cpu.is_running() => {
            eprintln!();
            eprintln!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", limit);
            0
        }
        Ok(()) => 0,
        Err(e) => {
            eprintln!();
            eprintln!("❌ CPU error: {}", e);
            1
        }
    }
}

/// Write one JSON trace line in a single call.
fn write_trace<T: Write>(trace: &mut T, cpu: &Cpu, executed: Executed) -> Result<(), CpuError> {
    let line = TraceLine {
        step: cpu.steps,
        executed,
        regs: &cpu.regs,
    };
    let mut json = serde_json::to_vec(&line).map_err(io::Error::from)?;
    json.push(b'\n');
    trace.write_all(&json)?;
    Ok(())
}
