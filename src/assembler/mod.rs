//! Two-pass 6502 assembler: lexer -> parser -> encoder, sharing the
//! `crate::isa` opcode table with the CPU core so mnemonic+mode always means
//! the same thing on both sides of the emulator.
//!
//! The public surface is a single function: [`assemble`]. Source text that
//! needs macros or conditional assembly should go through
//! [`crate::preprocessor::process`] first; this module has no knowledge of
//! either, by design (the two stages compose at the driver/test-call level,
//! not internally), except that it recognizes `.equ`/`.define` on its own so
//! a flat source file that skips the preprocessor still assembles.

mod encode;
mod parser;
mod token;

pub use parser::{Directive, DirectiveKind, Instruction, Statement, Symbol};

use crate::error::EmuResult;

/// Runs the full lex/parse/encode pipeline over `source`, returning the
/// assembled bytes in `.org` order (gaps between `.org` regions zero-filled).
pub fn assemble(source: &str) -> EmuResult<Vec<u8>> {
    let tokens = token::tokenize(source)?;
    let (statements, symbols) = parser::Parser::new(&tokens).parse()?;
    encode::assemble_statements(&statements, &symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmuError;

    #[test]
    fn end_to_end_indirect_jmp() {
        let bytes = assemble("JMP ($10FF)\n").unwrap();
        assert_eq!(bytes, vec![0x6C, 0xFF, 0x10]);
    }

    #[test]
    fn unknown_directive_reports_assembly_error() {
        let err = assemble(".frobnicate 1\n").unwrap_err();
        assert!(matches!(err, EmuError::AssemblyError { .. }));
    }

    #[test]
    fn zero_page_indexed_wraps_at_encode_not_assemble_time() {
        // LDA $FF,X is a valid zero-page,X encoding; the wraparound itself
        // is a CPU-execution concern, not an assembler one.
        let bytes = assemble("LDA $FF,X\n").unwrap();
        assert_eq!(bytes, vec![0xB5, 0xFF]);
    }
}
