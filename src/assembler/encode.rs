//! Phase 3 (encode): walks the statement list a second time and emits
//! bytes. All addresses and the symbol table are already final by this
//! point (built in `parser`); this pass only resolves operand values and
//! writes bytes, filling zero-padded gaps across `.org` jumps.

use std::collections::HashMap;

use crate::error::{EmuError, EmuResult, SourcePos};
use crate::isa::AddressingMode;

use super::parser::{Directive, DirectiveKind, Instruction, Statement, Symbol};

pub fn assemble_statements(statements: &[Statement], symbols: &HashMap<String, Symbol>) -> EmuResult<Vec<u8>> {
    let mut binary = Vec::new();
    let mut cursor = 0u32;
    let mut origin_set = false;

    for stmt in statements {
        match stmt {
            Statement::Directive(d) => encode_directive(d, symbols, &mut binary, &mut cursor, &mut origin_set)?,
            Statement::Instruction(ins) => encode_instruction(ins, symbols, &mut binary, &mut cursor)?,
        }
    }

    Ok(binary)
}

fn encode_directive(
    d: &Directive,
    symbols: &HashMap<String, Symbol>,
    binary: &mut Vec<u8>,
    cursor: &mut u32,
    origin_set: &mut bool,
) -> EmuResult<()> {
    let pos = SourcePos::line_only(d.line);
    match d.kind {
        DirectiveKind::Org => {
            let addr = resolve_number(&d.operands[0], symbols, pos)? as u32;
            if *origin_set && addr > *cursor {
                binary.resize(binary.len() + (addr - *cursor) as usize, 0);
            }
            *cursor = addr;
            *origin_set = true;
        }
        DirectiveKind::Equ | DirectiveKind::Define => {}
        DirectiveKind::Byte => {
            for operand in &d.operands {
                if is_string_literal(operand) {
                    for byte in string_literal_bytes(operand) {
                        binary.push(byte);
                        *cursor += 1;
                    }
                } else {
                    let v = resolve_number(operand, symbols, pos)?;
                    binary.push((v & 0xFF) as u8);
                    *cursor += 1;
                }
            }
        }
        DirectiveKind::Word => {
            for operand in &d.operands {
                let v = resolve_number(operand, symbols, pos)?;
                binary.push((v & 0xFF) as u8);
                binary.push(((v >> 8) & 0xFF) as u8);
                *cursor += 2;
            }
        }
    }
    Ok(())
}

fn encode_instruction(
    ins: &Instruction,
    symbols: &HashMap<String, Symbol>,
    binary: &mut Vec<u8>,
    cursor: &mut u32,
) -> EmuResult<()> {
    binary.push(ins.opcode);
    *cursor += 1;

    if ins.size == 1 {
        return Ok(());
    }

    let operand = ins.operand.as_deref().ok_or_else(|| EmuError::AssemblyError {
        pos: SourcePos::line_only(ins.line),
        message: format!("{} requires an operand", ins.mnemonic),
    })?;
    let value = resolve_operand_value(operand, ins, symbols)?;

    if ins.size == 2 {
        binary.push((value & 0xFF) as u8);
        *cursor += 1;
    } else {
        binary.push((value & 0xFF) as u8);
        binary.push(((value >> 8) & 0xFF) as u8);
        *cursor += 2;
    }

    Ok(())
}

fn resolve_operand_value(operand: &str, ins: &Instruction, symbols: &HashMap<String, Symbol>) -> EmuResult<i64> {
    let pos = SourcePos::line_only(ins.line);
    match ins.mode {
        AddressingMode::Immediate => {
            let stripped = operand.strip_prefix('#').unwrap_or(operand);
            resolve_number(stripped, symbols, pos)
        }
        AddressingMode::Relative => {
            let target = resolve_number(operand, symbols, pos)?;
            let pc_after = ins.address as i64 + ins.size as i64;
            let offset = target - pc_after;
            if !(-128..=127).contains(&offset) {
                return Err(EmuError::BranchRangeError { pos, offset: offset as i32 });
            }
            Ok(offset)
        }
        AddressingMode::AbsoluteX | AddressingMode::ZeroPageX => resolve_number(strip_index_suffix(operand, 'X'), symbols, pos),
        AddressingMode::AbsoluteY | AddressingMode::ZeroPageY => resolve_number(strip_index_suffix(operand, 'Y'), symbols, pos),
        AddressingMode::Indirect => resolve_number(strip_parens(operand), symbols, pos),
        AddressingMode::IndirectX => resolve_number(strip_index_suffix(strip_parens(operand), 'X'), symbols, pos),
        AddressingMode::IndirectY => resolve_number(strip_index_suffix(strip_parens(operand), 'Y'), symbols, pos),
        AddressingMode::ZeroPage | AddressingMode::Absolute => resolve_number(operand, symbols, pos),
        AddressingMode::Implicit | AddressingMode::Accumulator => Ok(0),
    }
}

fn strip_parens(s: &str) -> &str {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix('(') {
        if let Some(idx) = rest.find(')') {
            return &rest[..idx];
        }
    }
    s
}

fn strip_index_suffix(s: &str, reg: char) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let tail = &s[s.len() - 2..];
        if tail.starts_with(',') && tail[1..].eq_ignore_ascii_case(&reg.to_string()) {
            return &s[..s.len() - 2];
        }
    }
    s
}

pub(super) fn resolve_number(s: &str, symbols: &HashMap<String, Symbol>, pos: SourcePos) -> EmuResult<i64> {
    let s = s.trim();
    if let Some(sym) = symbols.get(s) {
        return Ok(sym.value);
    }
    if let Some(hex) = s.strip_prefix('$') {
        return i64::from_str_radix(hex, 16)
            .map_err(|_| EmuError::AssemblyError { pos, message: format!("invalid hex value: {s}") });
    }
    if let Some(bin) = s.strip_prefix('%') {
        return i64::from_str_radix(bin, 2)
            .map_err(|_| EmuError::AssemblyError { pos, message: format!("invalid binary value: {s}") });
    }
    s.parse::<i64>()
        .map_err(|_| EmuError::AssemblyError { pos, message: format!("undefined symbol or invalid number: {s}") })
}

pub(super) fn is_string_literal(s: &str) -> bool {
    let s = s.trim();
    (s.len() >= 2 && s.starts_with('"') && s.ends_with('"')) || (s.len() >= 2 && s.starts_with('\'') && s.ends_with('\''))
}

pub(super) fn string_literal_bytes(s: &str) -> Vec<u8> {
    let s = s.trim();
    s[1..s.len() - 1].bytes().collect()
}

#[cfg(test)]
mod tests {
    use super::super::token;
    use super::super::parser::Parser;
    use super::*;

    fn assemble(src: &str) -> EmuResult<Vec<u8>> {
        let tokens = token::tokenize(src)?;
        let (statements, symbols) = Parser::new(&tokens).parse()?;
        assemble_statements(&statements, &symbols)
    }

    #[test]
    fn assembles_small_example_program() {
        let src = ".org $8000\nLDA #$42\nSTA $0200\nBRK\n";
        let bytes = assemble(src).unwrap();
        assert_eq!(bytes, vec![0xA9, 0x42, 0x8D, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn word_directive_emits_little_endian() {
        let src = ".word $ABCD\n";
        let bytes = assemble(src).unwrap();
        assert_eq!(bytes, vec![0xCD, 0xAB]);
    }

    #[test]
    fn org_gap_is_zero_filled() {
        let src = ".org $00\n.byte $11\n.org $04\n.byte $22\n";
        let bytes = assemble(src).unwrap();
        assert_eq!(bytes, vec![0x11, 0x00, 0x00, 0x00, 0x22]);
    }

    #[test]
    fn branch_within_range_resolves_forward_label() {
        let src = "BEQ TARGET\nNOP\nNOP\nTARGET:\nBRK\n";
        let bytes = assemble(src).unwrap();
        assert_eq!(bytes[0], 0xF0);
        assert_eq!(bytes[1] as i8, 2);
    }

    #[test]
    fn branch_out_of_range_is_an_error() {
        let mut src = String::from("BNE TOO_FAR\n");
        for _ in 0..200 {
            src.push_str("NOP\n");
        }
        src.push_str("TOO_FAR:\nBRK\n");
        let err = assemble(&src).unwrap_err();
        assert!(matches!(err, EmuError::BranchRangeError { .. }));
    }

    #[test]
    fn unsupported_addressing_mode_is_an_addressing_error() {
        let err = assemble("TAX #$01\n").unwrap_err();
        assert!(matches!(err, EmuError::AddressingError { .. }));
    }

    #[test]
    fn string_literal_in_byte_directive() {
        let bytes = assemble(".byte \"AB\", $00\n").unwrap();
        assert_eq!(bytes, vec![b'A', b'B', 0x00]);
    }

    proptest::proptest! {
        #[test]
        fn branch_offset_resolves_within_range_or_errors(addr in 0u32..0xFFFF, target in 0u16..=0xFFFF) {
            let mut symbols = HashMap::new();
            symbols.insert("TARGET".to_string(), Symbol { value: target as i64, defined_at: 0 });
            let ins = Instruction {
                line: 1,
                label: None,
                mnemonic: "BEQ".to_string(),
                operand: Some("TARGET".to_string()),
                mode: AddressingMode::Relative,
                opcode: 0xF0,
                size: 2,
                address: addr,
            };
            let pc_after = addr as i64 + 2;
            let offset = target as i64 - pc_after;
            let result = resolve_operand_value("TARGET", &ins, &symbols);
            if (-128..=127).contains(&offset) {
                proptest::prop_assert_eq!(result.unwrap(), offset);
            } else {
                proptest::prop_assert!(matches!(result, Err(EmuError::BranchRangeError { .. })));
            }
        }
    }
}
