//! Crate-wide error types.
//!
//! The core never panics on malformed input it is contractually required to
//! handle (bad ROM headers, out-of-range branch targets, bad bus ranges);
//! everything else is reported through [`EmuError`]. Runtime CPU faults
//! (illegal opcodes) do not propagate as `Result` — the CPU halts and logs
//! instead, per the bus/CPU contract described in the crate root.

use thiserror::Error;

/// A source position used by assembler/preprocessor diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn line_only(line: usize) -> Self {
        Self { line, column: 0 }
    }
}

impl std::fmt::Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.column > 0 {
            write!(f, "line {}, column {}", self.line, self.column)
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmuError {
    /// Lexical, syntactic, or semantic error raised while assembling or
    /// preprocessing source text.
    #[error("assembly error at {pos}: {message}")]
    AssemblyError { pos: SourcePos, message: String },

    /// An instruction mnemonic was used with an addressing mode it does not
    /// support.
    #[error("{mnemonic} does not support {mode} addressing at {pos}")]
    AddressingError {
        pos: SourcePos,
        mnemonic: String,
        mode: String,
    },

    /// A relative branch target lies outside [-128, 127] of the instruction
    /// following the branch.
    #[error("branch offset {offset} out of range [-128,127] at {pos}")]
    BranchRangeError { pos: SourcePos, offset: i32 },

    /// An iNES image failed header validation.
    #[error("invalid ROM image: {0}")]
    RomFormatError(String),

    /// The CPU fetched a byte with no mapped instruction handler. Not a
    /// `Result` path in practice (the CPU halts in place), but kept so
    /// drivers that want to surface it as a `Result` at a higher level can.
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// `Bus::map_region` was called with `end < start`.
    #[error("invalid bus region ${start:04X}..${end:04X}")]
    BusMapError { start: u16, end: u16 },

    /// Reserved for PPU register faults. Never constructed: PPU register
    /// writes are total functions per the bus contract, but the variant is
    /// kept so the error model documented for the core stays complete.
    #[error("PPU register error: {0}")]
    PPURegisterError(String),
}

pub type EmuResult<T> = Result<T, EmuError>;
