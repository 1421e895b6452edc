//! Standalone 6502 assembler CLI: source -> preprocessor -> assembler ->
//! raw PRG bytes, optionally wrapped in an iNES (v1) header.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustendo::preprocessor::{self, FsIncludeResolver};
use rustendo::{assembler, EmuError};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "rustasm", about = "Two-pass 6502 assembler")]
struct Args {
    /// Assembly source file.
    input: PathBuf,

    /// Output file for the assembled bytes.
    #[arg(short, long, default_value = "a.out")]
    output: PathBuf,

    /// Wrap the assembled PRG in an iNES (v1) header instead of emitting raw bytes.
    #[arg(long)]
    ines: bool,

    /// Mapper number to record in the iNES header (only meaningful with --ines).
    #[arg(long, default_value_t = 0)]
    mapper: u8,

    /// 8 KiB CHR ROM units to record in the iNES header (0 = CHR RAM).
    #[arg(long, default_value_t = 0)]
    chr_banks: u8,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "assembly failed");
            eprintln!("rustasm: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), EmuError> {
    let source = fs::read_to_string(&args.input).map_err(|e| EmuError::AssemblyError {
        pos: rustendo::error::SourcePos::line_only(0),
        message: format!("failed to read '{}': {e}", args.input.display()),
    })?;

    let mut resolver = FsIncludeResolver;
    let lines = preprocessor::process(&source, &mut resolver)?;
    let flattened = lines.join("\n");
    let prg = assembler::assemble(&flattened)?;

    let output = if args.ines { wrap_ines(&prg, args.mapper, args.chr_banks) } else { prg };

    fs::write(&args.output, &output).map_err(|e| EmuError::AssemblyError {
        pos: rustendo::error::SourcePos::line_only(0),
        message: format!("failed to write '{}': {e}", args.output.display()),
    })?;

    Ok(())
}

/// Pads `prg` up to a whole number of 16 KiB banks and prepends a minimal
/// iNES (v1) header (NROM-shaped: no trainer, PRG RAM left at the loader's
/// default, horizontal mirroring).
fn wrap_ines(prg: &[u8], mapper: u8, chr_banks: u8) -> Vec<u8> {
    const PRG_BANK: usize = 16 * 1024;
    let prg_banks = prg.len().div_ceil(PRG_BANK).max(1);
    let mut padded = prg.to_vec();
    padded.resize(prg_banks * PRG_BANK, 0);

    let mut image = Vec::with_capacity(16 + padded.len() + chr_banks as usize * 8 * 1024);
    image.extend_from_slice(b"NES\x1A");
    image.push(prg_banks as u8);
    image.push(chr_banks);
    image.push((mapper & 0x0F) << 4);
    image.push(mapper & 0xF0);
    image.extend_from_slice(&[0u8; 8]);
    image.extend_from_slice(&padded);
    image.extend(std::iter::repeat(0u8).take(chr_banks as usize * 8 * 1024));
    image
}
