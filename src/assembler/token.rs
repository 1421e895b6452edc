//! Lexer: turns a line-oriented assembly source into a flat token stream.
//!
//! Tokenized per line so every token carries an accurate line/column, the
//! same way diagnostics are reported throughout the assembler. Indirect
//! operand shapes (`($xx),Y`, `($xx,X)`, `(sym)`) are matched as a single
//! token here so the parser never has to special-case the comma inside the
//! parentheses when it reassembles an operand.

use crate::error::{EmuError, EmuResult, SourcePos};
use crate::isa;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Instruction,
    Directive,
    Label,
    Symbol,
    Number,
    String,
    Register,
    Immediate,
    Separator,
    Comment,
    Newline,
    Eof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

pub fn tokenize(source: &str) -> EmuResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        tokenize_line(line, line_no, &mut tokens)?;
        tokens.push(Token {
            kind: TokenKind::Newline,
            text: "\n".to_string(),
            line: line_no,
            column: line.chars().count() + 1,
        });
    }
    let eof_line = source.lines().count().max(1);
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line: eof_line,
        column: 1,
    });
    Ok(tokens)
}

fn tokenize_line(line: &str, line_no: usize, out: &mut Vec<Token>) -> EmuResult<()> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let col = i + 1;

        if c == '#' {
            if let Some(end) = match_immediate(&chars, i) {
                push(out, TokenKind::Immediate, &chars, i, end, line_no, col);
                i = end;
                continue;
            }
            // Not a well-formed immediate: the rest of the line is a comment.
            push(out, TokenKind::Comment, &chars, i, chars.len(), line_no, col);
            break;
        }

        if c == ';' {
            push(out, TokenKind::Comment, &chars, i, chars.len(), line_no, col);
            break;
        }

        if c == '(' {
            match match_indirect(&chars, i) {
                Some(end) => {
                    push(out, TokenKind::Symbol, &chars, i, end, line_no, col);
                    i = end;
                    continue;
                }
                None => {
                    return Err(lex_error(line_no, col, "unmatched '(' in operand"));
                }
            }
        }

        if c == '.' {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            if j == i + 1 {
                return Err(lex_error(line_no, col, "expected directive name after '.'"));
            }
            push(out, TokenKind::Directive, &chars, i, j, line_no, col);
            i = j;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            if j < chars.len() && chars[j] == ':' {
                push(out, TokenKind::Label, &chars, i, j, line_no, col);
                i = j + 1;
                continue;
            }
            let word: String = chars[i..j].iter().collect();
            let upper = word.to_ascii_uppercase();
            let kind = if upper == "A" || upper == "X" || upper == "Y" {
                TokenKind::Register
            } else if !isa::supported_modes(&upper).is_empty() {
                TokenKind::Instruction
            } else {
                TokenKind::Symbol
            };
            out.push(Token { kind, text: word, line: line_no, column: col });
            i = j;
            continue;
        }

        if c == '$' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_hexdigit() {
                j += 1;
            }
            if j == i + 1 {
                return Err(lex_error(line_no, col, "invalid hex literal"));
            }
            push(out, TokenKind::Number, &chars, i, j, line_no, col);
            i = j;
            continue;
        }

        if c == '%' {
            let mut j = i + 1;
            while j < chars.len() && (chars[j] == '0' || chars[j] == '1') {
                j += 1;
            }
            if j == i + 1 {
                return Err(lex_error(line_no, col, "invalid binary literal"));
            }
            push(out, TokenKind::Number, &chars, i, j, line_no, col);
            i = j;
            continue;
        }

        if c.is_ascii_digit() {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            push(out, TokenKind::Number, &chars, i, j, line_no, col);
            i = j;
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut j = i + 1;
            while j < chars.len() && chars[j] != quote {
                j += 1;
            }
            if j >= chars.len() {
                return Err(lex_error(line_no, col, "unterminated string literal"));
            }
            push(out, TokenKind::String, &chars, i, j + 1, line_no, col);
            i = j + 1;
            continue;
        }

        if c == ',' {
            out.push(Token { kind: TokenKind::Separator, text: ",".to_string(), line: line_no, column: col });
            i += 1;
            continue;
        }

        return Err(lex_error(line_no, col, &format!("unexpected character '{c}'")));
    }

    Ok(())
}

fn match_immediate(chars: &[char], start: usize) -> Option<usize> {
    let after_hash = start + 1;
    if after_hash < chars.len() && chars[after_hash] == '$' {
        let mut j = after_hash + 1;
        while j < chars.len() && chars[j].is_ascii_hexdigit() {
            j += 1;
        }
        if j > after_hash + 1 {
            return Some(j);
        }
        return None;
    }
    if after_hash < chars.len() && chars[after_hash] == '%' {
        let mut j = after_hash + 1;
        while j < chars.len() && (chars[j] == '0' || chars[j] == '1') {
            j += 1;
        }
        if j > after_hash + 1 {
            return Some(j);
        }
        return None;
    }
    if after_hash < chars.len() && chars[after_hash].is_ascii_digit() {
        let mut j = after_hash;
        while j < chars.len() && chars[j].is_ascii_digit() {
            j += 1;
        }
        return Some(j);
    }
    if after_hash < chars.len() && (chars[after_hash].is_alphabetic() || chars[after_hash] == '_') {
        let mut j = after_hash;
        while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
            j += 1;
        }
        return Some(j);
    }
    None
}

/// Matches `(...)` optionally followed by a literal `,Y`, returning the end
/// index of the whole match. `($xx,X)` and `(sym,X)` close at the `)`; the
/// `,Y` indexed-indirect form extends two characters past it.
fn match_indirect(chars: &[char], start: usize) -> Option<usize> {
    let close_rel = chars[start + 1..].iter().position(|&ch| ch == ')')?;
    let close_idx = start + 1 + close_rel;
    let mut end = close_idx + 1;
    if end + 1 < chars.len() && chars[end] == ',' && chars[end + 1] == 'Y' {
        end += 2;
    }
    Some(end)
}

fn push(out: &mut Vec<Token>, kind: TokenKind, chars: &[char], start: usize, end: usize, line: usize, column: usize) {
    out.push(Token { kind, text: chars[start..end].iter().collect(), line, column });
}

fn lex_error(line: usize, column: usize, message: &str) -> EmuError {
    EmuError::AssemblyError { pos: SourcePos::new(line, column), message: message.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_simple_instruction() {
        let tokens = tokenize("LDA #$42").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Instruction, TokenKind::Immediate, TokenKind::Newline, TokenKind::Eof]
        );
        assert_eq!(tokens[1].text, "#$42");
    }

    #[test]
    fn tokenizes_label_and_comment() {
        let tokens = tokenize("start: LDA $10 ; load thing").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Label);
        assert_eq!(tokens[0].text, "start");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment));
    }

    #[test]
    fn tokenizes_indirect_indexed_forms_as_single_token() {
        let tokens = tokenize("LDA ($20),Y").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].text, "($20),Y");

        let tokens = tokenize("LDA ($20,X)").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].text, "($20,X)");
    }

    #[test]
    fn tokenizes_directive_and_indexed_operand() {
        let tokens = tokenize(".org $8000").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[0].text, ".org");

        let tokens = tokenize("STA $10,X").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Instruction,
                TokenKind::Number,
                TokenKind::Separator,
                TokenKind::Register,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unexpected_character() {
        assert!(tokenize("LDA @foo").is_err());
    }

    #[test]
    fn binary_literal_tokenizes_as_number() {
        let tokens = tokenize("LDA #%00001010").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Immediate);
        assert_eq!(tokens[1].text, "#%00001010");
    }
}
