//! Phase 2 (parse): builds the statement list and symbol table in a single
//! left-to-right pass. Label addresses are resolved here since the current
//! address is tracked through every statement's size and `.org`; pass 3
//! (`encode`) only ever looks values up, it never advances `current_address`
//! for anything but `.org` gap-filling.

use std::collections::HashMap;

use crate::error::{EmuError, EmuResult, SourcePos};
use crate::isa::{self, AddressingMode};

use super::token::{Token, TokenKind};

#[derive(Clone, Copy, Debug)]
pub struct Symbol {
    pub value: i64,
    pub defined_at: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    Org,
    Equ,
    Define,
    Byte,
    Word,
}

#[derive(Clone, Debug)]
pub struct Instruction {
    pub line: usize,
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Option<String>,
    pub mode: AddressingMode,
    pub opcode: u8,
    pub size: u8,
    pub address: u32,
}

#[derive(Clone, Debug)]
pub struct Directive {
    pub line: usize,
    pub label: Option<String>,
    pub kind: DirectiveKind,
    pub operands: Vec<String>,
    pub size: u16,
    pub address: u32,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Instruction(Instruction),
    Directive(Directive),
}

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    statements: Vec<Statement>,
    symbols: HashMap<String, Symbol>,
    current_address: u32,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            statements: Vec::new(),
            symbols: HashMap::new(),
            current_address: 0,
        }
    }

    pub fn parse(mut self) -> EmuResult<(Vec<Statement>, HashMap<String, Symbol>)> {
        while !self.is_eof() {
            self.parse_line()?;
        }
        Ok((self.statements, self.symbols))
    }

    fn is_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn parse_line(&mut self) -> EmuResult<()> {
        if self.check(TokenKind::Newline) {
            self.advance();
            return Ok(());
        }
        if self.check(TokenKind::Comment) {
            self.advance();
            self.skip_to_newline();
            return Ok(());
        }

        let mut label = None;
        if self.check(TokenKind::Label) {
            let tok = self.advance();
            self.symbols.insert(
                tok.text.clone(),
                Symbol { value: self.current_address as i64, defined_at: tok.line },
            );
            label = Some(tok.text);
            if self.check(TokenKind::Newline) {
                self.advance();
                return Ok(());
            }
        }

        if self.check(TokenKind::Instruction) {
            self.parse_instruction(label)?;
        } else if self.check(TokenKind::Directive) {
            self.parse_directive(label)?;
        } else if !self.check(TokenKind::Comment) && !self.check(TokenKind::Newline) {
            let tok = self.current();
            return Err(EmuError::AssemblyError {
                pos: SourcePos::new(tok.line, tok.column),
                message: format!("expected instruction or directive, found {:?}", tok.kind),
            });
        }

        self.skip_to_newline();
        Ok(())
    }

    fn skip_to_newline(&mut self) {
        while !self.check(TokenKind::Newline) && !self.is_eof() {
            self.advance();
        }
        if self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn parse_instruction(&mut self, label: Option<String>) -> EmuResult<()> {
        let tok = self.advance();
        let mnemonic = tok.text.to_ascii_uppercase();
        let line = tok.line;

        let operand = if !self.check(TokenKind::Newline) && !self.check(TokenKind::Comment) && !self.is_eof() {
            Some(self.parse_operand()?)
        } else {
            None
        };

        let mode = match &operand {
            Some(op) => {
                if isa::is_branch_mnemonic(&mnemonic) {
                    AddressingMode::Relative
                } else {
                    detect_addressing_mode(op)
                }
            }
            None => AddressingMode::Implicit,
        };

        let (opcode, size) = isa::encode(&mnemonic, mode).ok_or_else(|| EmuError::AddressingError {
            pos: SourcePos::line_only(line),
            mnemonic: mnemonic.clone(),
            mode: mode.name().to_string(),
        })?;

        let address = self.current_address;
        self.current_address += size as u32;

        self.statements.push(Statement::Instruction(Instruction {
            line,
            label,
            mnemonic,
            operand,
            mode,
            opcode,
            size,
            address,
        }));
        Ok(())
    }

    fn parse_operand(&mut self) -> EmuResult<String> {
        let mut text = String::new();
        let tok = self.advance();
        text.push_str(&tok.text);

        while self.check(TokenKind::Separator) {
            let sep = self.advance();
            text.push_str(&sep.text);
            if self.check(TokenKind::Newline) || self.check(TokenKind::Comment) || self.is_eof() {
                let t = self.current();
                return Err(EmuError::AssemblyError {
                    pos: SourcePos::new(t.line, t.column),
                    message: "expected operand after separator".to_string(),
                });
            }
            let next = self.advance();
            text.push_str(&next.text);
        }

        Ok(text)
    }

    fn parse_directive(&mut self, label: Option<String>) -> EmuResult<()> {
        let tok = self.advance();
        let line = tok.line;
        let name_upper = tok.text.to_ascii_uppercase();

        let kind = match name_upper.as_str() {
            ".ORG" => DirectiveKind::Org,
            ".EQU" => DirectiveKind::Equ,
            ".DEFINE" => DirectiveKind::Define,
            ".BYTE" | ".DB" => DirectiveKind::Byte,
            ".WORD" | ".DW" => DirectiveKind::Word,
            other => {
                return Err(EmuError::AssemblyError {
                    pos: SourcePos::line_only(line),
                    message: format!("unknown directive: {other}"),
                });
            }
        };

        let operands = self.parse_directive_operands(kind, line)?;
        let mut size = 0u16;
        let address = self.current_address;

        match kind {
            DirectiveKind::Org => {
                if operands.len() != 1 {
                    return Err(EmuError::AssemblyError {
                        pos: SourcePos::line_only(line),
                        message: ".org requires exactly one operand".to_string(),
                    });
                }
                let value = super::encode::resolve_number(&operands[0], &self.symbols, SourcePos::line_only(line))?;
                self.current_address = value as u32;
            }
            DirectiveKind::Equ | DirectiveKind::Define => {
                if operands.len() != 2 {
                    return Err(EmuError::AssemblyError {
                        pos: SourcePos::line_only(line),
                        message: format!("{name_upper} requires exactly two operands"),
                    });
                }
                let value = super::encode::resolve_number(&operands[1], &self.symbols, SourcePos::line_only(line))?;
                self.symbols.insert(operands[0].clone(), Symbol { value, defined_at: line });
            }
            DirectiveKind::Byte => {
                if operands.is_empty() {
                    return Err(EmuError::AssemblyError {
                        pos: SourcePos::line_only(line),
                        message: format!("{name_upper} requires at least one operand"),
                    });
                }
                for op in &operands {
                    size += if super::encode::is_string_literal(op) {
                        super::encode::string_literal_bytes(op).len() as u16
                    } else {
                        1
                    };
                }
                self.current_address += size as u32;
            }
            DirectiveKind::Word => {
                if operands.is_empty() {
                    return Err(EmuError::AssemblyError {
                        pos: SourcePos::line_only(line),
                        message: format!("{name_upper} requires at least one operand"),
                    });
                }
                size = operands.len() as u16 * 2;
                self.current_address += size as u32;
            }
        }

        self.statements.push(Statement::Directive(Directive { line, label, kind, operands, size, address }));
        Ok(())
    }

    fn parse_directive_operands(&mut self, kind: DirectiveKind, line: usize) -> EmuResult<Vec<String>> {
        if matches!(kind, DirectiveKind::Equ | DirectiveKind::Define) {
            if !(self.check(TokenKind::Symbol) || self.check(TokenKind::Label)) {
                let t = self.current();
                return Err(EmuError::AssemblyError {
                    pos: SourcePos::new(t.line, t.column),
                    message: "directive requires a symbol as first operand".to_string(),
                });
            }
            let symbol_tok = self.advance();
            if !(self.check(TokenKind::Number) || self.check(TokenKind::Symbol)) {
                let t = self.current();
                return Err(EmuError::AssemblyError {
                    pos: SourcePos::new(t.line, t.column),
                    message: "directive requires a value as second operand".to_string(),
                });
            }
            let value_tok = self.advance();
            return Ok(vec![symbol_tok.text, value_tok.text]);
        }

        let mut operands = Vec::new();
        let mut current = String::new();
        while !self.check(TokenKind::Newline) && !self.check(TokenKind::Comment) && !self.is_eof() {
            let tok = self.advance();
            if tok.kind == TokenKind::Separator {
                if !current.is_empty() {
                    operands.push(std::mem::take(&mut current));
                }
            } else {
                current.push_str(&tok.text);
            }
        }
        if !current.is_empty() {
            operands.push(current);
        }
        if operands.is_empty() {
            return Err(EmuError::AssemblyError {
                pos: SourcePos::line_only(line),
                message: "directive requires at least one operand".to_string(),
            });
        }
        Ok(operands)
    }
}

/// Addressing-mode detection from an operand's surface syntax alone (branch
/// mnemonics bypass this entirely and force `Relative`).
pub fn detect_addressing_mode(operand: &str) -> AddressingMode {
    let op = operand.trim();

    if op.is_empty() {
        return AddressingMode::Implicit;
    }
    if op.eq_ignore_ascii_case("a") {
        return AddressingMode::Accumulator;
    }
    if op.starts_with('#') {
        return AddressingMode::Immediate;
    }

    if let Some(inner) = op.strip_prefix('(') {
        if let Some(close_rel) = inner.find(')') {
            let inside = &inner[..close_rel];
            let after = &inner[close_rel + 1..];
            if after.eq_ignore_ascii_case(",y") {
                return AddressingMode::IndirectY;
            }
            if inside.to_ascii_uppercase().ends_with(",X") {
                return AddressingMode::IndirectX;
            }
            if after.is_empty() {
                return AddressingMode::Indirect;
            }
        }
    }

    if let Some(base) = strip_suffix_ci(op, "X") {
        return if fits_zero_page(base) { AddressingMode::ZeroPageX } else { AddressingMode::AbsoluteX };
    }
    if let Some(base) = strip_suffix_ci(op, "Y") {
        return if fits_zero_page(base) { AddressingMode::ZeroPageY } else { AddressingMode::AbsoluteY };
    }

    if fits_zero_page(op) {
        AddressingMode::ZeroPage
    } else {
        AddressingMode::Absolute
    }
}

fn strip_suffix_ci<'a>(s: &'a str, reg: &str) -> Option<&'a str> {
    if s.len() < reg.len() + 1 {
        return None;
    }
    let tail = &s[s.len() - reg.len() - 1..];
    if tail.len() == reg.len() + 1 && tail.starts_with(',') && tail[1..].eq_ignore_ascii_case(reg) {
        Some(&s[..s.len() - reg.len() - 1])
    } else {
        None
    }
}

fn fits_zero_page(s: &str) -> bool {
    if let Some(hex) = s.strip_prefix('$') {
        return hex.len() <= 2 && u32::from_str_radix(hex, 16).is_ok();
    }
    if let Some(bin) = s.strip_prefix('%') {
        return u32::from_str_radix(bin, 2).map(|v| v < 256).unwrap_or(false);
    }
    s.parse::<i64>().map(|v| (0..256).contains(&v)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_immediate_and_accumulator() {
        assert_eq!(detect_addressing_mode("#$10"), AddressingMode::Immediate);
        assert_eq!(detect_addressing_mode("A"), AddressingMode::Accumulator);
        assert_eq!(detect_addressing_mode(""), AddressingMode::Implicit);
    }

    #[test]
    fn detects_zero_page_vs_absolute() {
        assert_eq!(detect_addressing_mode("$10"), AddressingMode::ZeroPage);
        assert_eq!(detect_addressing_mode("$1000"), AddressingMode::Absolute);
        assert_eq!(detect_addressing_mode("200"), AddressingMode::ZeroPage);
        assert_eq!(detect_addressing_mode("LABEL"), AddressingMode::Absolute);
    }

    #[test]
    fn detects_indexed_modes() {
        assert_eq!(detect_addressing_mode("$10,X"), AddressingMode::ZeroPageX);
        assert_eq!(detect_addressing_mode("$1000,Y"), AddressingMode::AbsoluteY);
        assert_eq!(detect_addressing_mode("LABEL,X"), AddressingMode::AbsoluteX);
    }

    #[test]
    fn detects_indirect_forms() {
        assert_eq!(detect_addressing_mode("($20,X)"), AddressingMode::IndirectX);
        assert_eq!(detect_addressing_mode("($20),Y"), AddressingMode::IndirectY);
        assert_eq!(detect_addressing_mode("($20)"), AddressingMode::Indirect);
    }
}
