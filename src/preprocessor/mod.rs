//! Macro and conditional-assembly preprocessor: runs over raw source text
//! before it reaches [`crate::assembler::assemble`], expanding `.macro`
//! bodies, resolving `.include`, and stripping out lines inside inactive
//! `.if`/`.ifdef`/`.ifndef` blocks. The output is plain assembly text with
//! none of these directives left in it.
//!
//! File access is abstracted behind [`IncludeResolver`] rather than calling
//! into `std::fs` directly, so tests (and anything embedding the assembler)
//! can supply `.include` contents without touching a real filesystem.

mod expr;

use std::collections::{HashMap, VecDeque};

use crate::error::{EmuError, EmuResult, SourcePos};

/// Supplies the contents of a file named by an `.include` directive.
pub trait IncludeResolver {
    fn resolve(&mut self, path: &str) -> EmuResult<String>;
}

/// Resolves `.include` paths directly against the filesystem, relative to
/// the current working directory. What the standalone assembler driver uses.
#[derive(Default)]
pub struct FsIncludeResolver;

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&mut self, path: &str) -> EmuResult<String> {
        std::fs::read_to_string(path).map_err(|e| EmuError::AssemblyError {
            pos: SourcePos::line_only(0),
            message: format!("failed to include '{path}': {e}"),
        })
    }
}

/// A resolver backed by an in-memory map, for tests and embedders that
/// already have every included file's contents on hand.
#[derive(Default)]
pub struct MapIncludeResolver {
    pub files: HashMap<String, String>,
}

impl IncludeResolver for MapIncludeResolver {
    fn resolve(&mut self, path: &str) -> EmuResult<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| EmuError::AssemblyError {
                pos: SourcePos::line_only(0),
                message: format!("include file not found: {path}"),
            })
    }
}

struct MacroDef {
    params: Vec<String>,
    body: Vec<String>,
}

struct ConditionalBlock {
    parent_active: bool,
    active: bool,
    else_seen: bool,
}

struct Processor<'r> {
    resolver: &'r mut dyn IncludeResolver,
    macros: HashMap<String, MacroDef>,
    symbols: HashMap<String, Option<i64>>,
    conditionals: Vec<ConditionalBlock>,
    defining_macro: Option<(String, Vec<String>, Vec<String>, bool)>,
    output: Vec<String>,
    line_no: usize,
}

/// Runs the full macro/conditional pass over `source`, returning the
/// resulting lines with every preprocessor directive resolved away.
pub fn process(source: &str, resolver: &mut dyn IncludeResolver) -> EmuResult<Vec<String>> {
    let mut proc = Processor {
        resolver,
        macros: HashMap::new(),
        symbols: HashMap::new(),
        conditionals: Vec::new(),
        defining_macro: None,
        output: Vec::new(),
        line_no: 0,
    };
    proc.run(source)?;
    proc.finish()
}

impl<'r> Processor<'r> {
    fn run(&mut self, source: &str) -> EmuResult<()> {
        let mut queue: VecDeque<String> = source.lines().map(str::to_string).collect();
        self.process_queue(&mut queue)
    }

    fn process_queue(&mut self, queue: &mut VecDeque<String>) -> EmuResult<()> {
        while let Some(line) = queue.pop_front() {
            self.line_no += 1;
            self.process_line(&line, queue)?;
        }
        Ok(())
    }

    fn pos(&self) -> SourcePos {
        SourcePos::line_only(self.line_no)
    }

    fn err(&self, message: impl Into<String>) -> EmuError {
        EmuError::AssemblyError { pos: self.pos(), message: message.into() }
    }

    fn is_active(&self) -> bool {
        self.conditionals.iter().all(|b| b.active)
    }

    fn process_line(&mut self, raw: &str, queue: &mut VecDeque<String>) -> EmuResult<()> {
        let trimmed = raw.trim();

        if self.defining_macro.is_some() {
            let directive = first_word(trimmed).to_ascii_lowercase();
            if directive == ".endmacro" {
                let (name, params, body, register) = self.defining_macro.take().unwrap();
                if register {
                    self.macros.insert(name, MacroDef { params, body });
                }
                return Ok(());
            }
            if directive == ".macro" {
                return Err(self.err("nested macro definition not allowed"));
            }
            let (_, _, body, _) = self.defining_macro.as_mut().unwrap();
            body.push(raw.to_string());
            return Ok(());
        }

        let directive = first_word(trimmed).to_ascii_lowercase();
        match directive.as_str() {
            ".macro" => return self.begin_macro(trimmed),
            ".endmacro" => return Err(self.err("'.endmacro' without matching '.macro'")),
            ".if" => return self.begin_if(trimmed),
            ".ifdef" => return self.begin_ifdef(trimmed, false),
            ".ifndef" => return self.begin_ifdef(trimmed, true),
            ".else" => return self.handle_else(),
            ".endif" => return self.handle_endif(),
            ".include" if self.is_active() => return self.handle_include(trimmed, queue),
            ".equ" | ".define" if self.is_active() => return self.handle_equ(trimmed),
            _ => {}
        }

        if !self.is_active() {
            return Ok(());
        }

        if let Some(expanded) = self.try_expand_macro(trimmed)? {
            for line in expanded.into_iter().rev() {
                queue.push_front(line);
            }
            return Ok(());
        }

        self.output.push(raw.to_string());
        Ok(())
    }

    fn begin_macro(&mut self, line: &str) -> EmuResult<()> {
        if self.defining_macro.is_some() {
            return Err(self.err("nested macro definition not allowed"));
        }
        let rest = line[".macro".len()..].trim();
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.err("'.macro' requires a name"))?
            .to_string();
        let params = parts
            .next()
            .unwrap_or("")
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let register = self.is_active();
        self.defining_macro = Some((name, params, Vec::new(), register));
        Ok(())
    }

    fn begin_if(&mut self, line: &str) -> EmuResult<()> {
        let condition = line[".if".len()..].trim();
        let parent_active = self.is_active();
        let numeric_symbols: HashMap<String, i64> =
            self.symbols.iter().filter_map(|(k, v)| v.map(|n| (k.clone(), n))).collect();
        let matched = if parent_active {
            expr::eval_condition(condition, &numeric_symbols).map_err(|e| self.err(e))?
        } else {
            false
        };
        self.conditionals.push(ConditionalBlock { parent_active, active: parent_active && matched, else_seen: false });
        Ok(())
    }

    fn begin_ifdef(&mut self, line: &str, negate: bool) -> EmuResult<()> {
        let directive_len = if negate { ".ifndef".len() } else { ".ifdef".len() };
        let name = line[directive_len..].trim().to_string();
        let parent_active = self.is_active();
        let defined = self.symbols.contains_key(&name);
        let matched = if negate { !defined } else { defined };
        self.conditionals.push(ConditionalBlock { parent_active, active: parent_active && matched, else_seen: false });
        Ok(())
    }

    fn handle_else(&mut self) -> EmuResult<()> {
        let block = self.conditionals.last_mut().ok_or_else(|| self.err("'.else' without matching '.if'"))?;
        if block.else_seen {
            return Err(self.err("duplicate '.else' for the same '.if'"));
        }
        block.else_seen = true;
        block.active = block.parent_active && !block.active;
        Ok(())
    }

    fn handle_endif(&mut self) -> EmuResult<()> {
        if self.conditionals.pop().is_none() {
            return Err(self.err("'.endif' without matching '.if'"));
        }
        Ok(())
    }

    fn handle_include(&mut self, line: &str, queue: &mut VecDeque<String>) -> EmuResult<()> {
        let rest = line[".include".len()..].trim();
        let path = strip_quotes(rest).ok_or_else(|| self.err("'.include' requires a quoted path"))?;
        let contents = self.resolver.resolve(path)?;
        for line in contents.lines().rev() {
            queue.push_front(line.to_string());
        }
        Ok(())
    }

    fn handle_equ(&mut self, line: &str) -> EmuResult<()> {
        let rest = first_directive_rest(line);
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.err("'.equ'/'.define' requires a name"))?
            .to_string();
        let value_text = parts.next().unwrap_or("").trim();
        let value = parse_numeric(value_text);
        self.symbols.insert(name, value);
        Ok(())
    }

    fn try_expand_macro(&mut self, line: &str) -> EmuResult<Option<Vec<String>>> {
        let name = first_word(line);
        if name.is_empty() {
            return Ok(None);
        }
        let Some(def_name) = self.macros.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned() else {
            return Ok(None);
        };
        let args_text = line[name.len()..].trim();
        let args = split_args(args_text);
        let def = &self.macros[&def_name];
        if args.len() != def.params.len() {
            return Err(self.err(format!(
                "macro '{}' expects {} argument(s), got {}",
                def_name,
                def.params.len(),
                args.len()
            )));
        }
        let mut expanded = Vec::with_capacity(def.body.len());
        for body_line in &def.body {
            let mut substituted = body_line.clone();
            for (param, arg) in def.params.iter().zip(args.iter()) {
                substituted = substitute_whole_word(&substituted, param, arg);
            }
            expanded.push(substituted);
        }
        Ok(Some(expanded))
    }

    fn finish(self) -> EmuResult<Vec<String>> {
        if self.defining_macro.is_some() {
            return Err(EmuError::AssemblyError {
                pos: self.pos(),
                message: "unterminated '.macro' block (missing '.endmacro')".to_string(),
            });
        }
        if !self.conditionals.is_empty() {
            return Err(EmuError::AssemblyError {
                pos: self.pos(),
                message: "unterminated '.if' block (missing '.endif')".to_string(),
            });
        }
        Ok(self.output)
    }
}

fn first_word(s: &str) -> &str {
    s.split(char::is_whitespace).next().unwrap_or("")
}

fn first_directive_rest(line: &str) -> &str {
    let word = first_word(line);
    line[word.len()..].trim()
}

fn strip_quotes(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn parse_numeric(s: &str) -> Option<i64> {
    if let Some(hex) = s.strip_prefix('$') {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = s.strip_prefix('%') {
        return i64::from_str_radix(bin, 2).ok();
    }
    s.parse::<i64>().ok()
}

/// Splits macro-invocation arguments on top-level commas, leaving commas
/// inside a quoted string alone.
fn split_args(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    args
}

/// Replaces every whole-word occurrence of `name` in `text` with
/// `replacement`, where "whole word" means not immediately adjacent to
/// another identifier character on either side. Written by hand since this
/// crate has no regex dependency.
pub(crate) fn substitute_whole_word(text: &str, name: &str, replacement: &str) -> String {
    if name.is_empty() {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i..].starts_with(needle.as_slice()) {
            let before_ok = i == 0 || !is_word_char(chars[i - 1]);
            let after_idx = i + needle.len();
            let after_ok = after_idx >= chars.len() || !is_word_char(chars[after_idx]);
            if before_ok && after_ok {
                result.push_str(replacement);
                i = after_idx;
                continue;
            }
        }
        result.push(chars[i]);
        i += 1;
    }
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_ok(source: &str) -> Vec<String> {
        let mut resolver = MapIncludeResolver::default();
        process(source, &mut resolver).unwrap()
    }

    #[test]
    fn strips_comments_are_left_for_the_assembler() {
        // The preprocessor only handles its own directives; plain lines pass
        // through untouched, including trailing comments.
        let out = process_ok("LDA #$01 ; comment\n");
        assert_eq!(out, vec!["LDA #$01 ; comment"]);
    }

    #[test]
    fn expands_macro_with_whole_word_substitution() {
        let source = ".macro LOAD_VALUE VAL\nLDA #VAL\n.endmacro\nLOAD_VALUE $42\n";
        let out = process_ok(source);
        assert_eq!(out, vec!["LDA #$42"]);
    }

    #[test]
    fn rejects_nested_macro_definitions() {
        let source = ".macro OUTER A\n.macro INNER B\n.endmacro\n.endmacro\n";
        let mut resolver = MapIncludeResolver::default();
        let err = process(source, &mut resolver).unwrap_err();
        assert!(matches!(err, EmuError::AssemblyError { .. }));
    }

    #[test]
    fn conditional_assembly_honors_ifdef_and_else() {
        let source = ".equ DEBUG 1\n.ifdef DEBUG\nLDA #$01\n.else\nLDA #$00\n.endif\n";
        assert_eq!(process_ok(source), vec!["LDA #$01"]);

        let source = ".ifdef RELEASE\nLDA #$01\n.else\nLDA #$00\n.endif\n";
        assert_eq!(process_ok(source), vec!["LDA #$00"]);
    }

    #[test]
    fn conditional_assembly_honors_if_expression() {
        let source = ".equ VERSION 3\n.if VERSION >= 2\nLDA #$01\n.endif\n";
        assert_eq!(process_ok(source), vec!["LDA #$01"]);

        let source = ".equ VERSION 1\n.if VERSION >= 2\nLDA #$01\n.endif\n";
        assert_eq!(process_ok(source), Vec::<String>::new());
    }

    #[test]
    fn nested_inactive_block_is_fully_dropped() {
        let source = ".if 0\nLDA #$01\n.if 1\nLDA #$02\n.endif\nLDA #$03\n.endif\nNOP\n";
        assert_eq!(process_ok(source), vec!["NOP"]);
    }

    #[test]
    fn unterminated_if_is_an_error() {
        let mut resolver = MapIncludeResolver::default();
        let err = process(".if 1\nNOP\n", &mut resolver).unwrap_err();
        assert!(matches!(err, EmuError::AssemblyError { .. }));
    }

    #[test]
    fn include_splices_file_contents_in_place() {
        let mut resolver = MapIncludeResolver::default();
        resolver.files.insert("lib.asm".to_string(), "LDA #$99\n".to_string());
        let out = process(".include \"lib.asm\"\nNOP\n", &mut resolver).unwrap();
        assert_eq!(out, vec!["LDA #$99", "NOP"]);
    }
}
