#![doc = r#"
Rustendo library crate.

This crate exposes the emulator core modules for use by binaries and tests.

Modules:
- bus: CPU-visible address space, owned devices (RAM/PPU/cartridge/DMA), and timing.
- cartridge: iNES v1 loader and cartridge metadata; constructs a Mapper.
- cpu: 6502 CPU core (architectural state, addressing modes, dispatch).
- error: crate-wide error type (`EmuError`) shared by the bus, cartridge loader,
  and assembler/preprocessor.
- isa: 6502 instruction set metadata shared by the CPU core and the assembler.
- mapper: Mapper trait and NROM (mapper 0) implementation.
- mappers: additional mapper implementations (UNROM).
- ppu: self-contained PPU (registers, OAM, per-dot rendering, nametable mirroring).
- preprocessor: macro/include preprocessing pass for the assembler front end.
- assembler: two-pass 6502 assembler producing iNES-ready PRG images.

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod isa;
pub mod mapper;
pub mod mappers;
pub mod ppu;

pub mod assembler;
pub mod preprocessor;

// Re-export commonly used types at the crate root for convenience.
pub use bus::Bus;
pub use cartridge::Cartridge;
pub use cpu::Cpu;
pub use error::{EmuError, EmuResult};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
