//! Tokens to rule source objects (component C).
//!
//! Two line productions:
//!
//! 1. `[name]` — defines or switches to a rule. A leading `?` marks an
//!    exception; a leading `.` is optional and elided. Segments separate on
//!    `.`; a trailing `.` is allowed. After the header, the globals
//!    currently in scope are copied into the new rule, then the rule's
//!    "set" flags are reset so a per-rule assignment may still overwrite an
//!    inherited global.
//! 2. `name = value` — `name` is bare (`status`, `apply_to`) or `tag/<tag>`.
//!    Outside any section, assignments go to the global dictionary (only
//!    `status` or `tag/...` are legal there). Inside a section, assignments
//!    go to the current rule.

use hashbrown::HashMap;

use super::lexer::{Lexer, Token};
use super::rule::Rule;
use crate::error::CompileError;
use crate::status::Status;

/// Globals currently in scope; copied into every new rule's section.
#[derive(Default)]
struct Globals {
    status: Option<Status>,
    tags: HashMap<String, String>,
}

pub struct Parser {
    globals: Globals,
    pub rules: Vec<Rule>,
    current: Option<usize>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            globals: Globals::default(),
            rules: Vec::new(),
            current: None,
        }
    }

    /// Parses every logical line of `text`, attributing errors to `file`.
    pub fn parse_file(&mut self, file: &str, text: &str) -> Result<(), CompileError> {
        for (idx, raw_line) in text.lines().enumerate() {
            let line = idx as u32 + 1;
            if raw_line.trim().is_empty() {
                continue;
            }
            let mut lexer = Lexer::new(file, line, raw_line);
            let tokens = lexer.tokenize()?;
            if tokens.len() == 1 && tokens[0] == Token::Eof {
                continue; // comment-only or blank line
            }
            self.parse_line(file, line, &tokens)?;
        }
        Ok(())
    }

    fn parse_line(&mut self, file: &str, line: u32, tokens: &[Token]) -> Result<(), CompileError> {
        if tokens[0] == Token::LBracket {
            self.parse_section_header(file, line, tokens)
        } else {
            self.parse_assignment(file, line, tokens)
        }
    }

    fn parse_section_header(&mut self, file: &str, line: u32, tokens: &[Token]) -> Result<(), CompileError> {
        let mut pos = 1usize;
        let mut exception = false;
        if tokens.get(pos) == Some(&Token::Question) {
            exception = true;
            pos += 1;
        }
        // An optional leading `.` is elided: `[.uk]` == `[uk]`.
        if tokens.get(pos) == Some(&Token::Dot) {
            pos += 1;
        }

        let mut segments = Vec::new();
        loop {
            let seg = match tokens.get(pos) {
                Some(Token::Ident(s)) | Some(Token::Word(s)) | Some(Token::QuotedString(s)) => s.clone(),
                Some(Token::Number(s)) => s.clone(),
                Some(Token::Star) => "*".to_string(),
                Some(Token::RBracket) => {
                    return Err(CompileError::syntax(file, line, "empty section name"));
                }
                _ => return Err(CompileError::syntax(file, line, "expected a segment name")),
            };
            segments.push(seg);
            pos += 1;
            match tokens.get(pos) {
                Some(Token::Dot) => {
                    pos += 1;
                    // A trailing `.` right before `]` is allowed.
                    if tokens.get(pos) == Some(&Token::RBracket) {
                        break;
                    }
                }
                Some(Token::RBracket) => break,
                _ => return Err(CompileError::syntax(file, line, "malformed section name")),
            }
        }
        if tokens.get(pos) != Some(&Token::RBracket) {
            return Err(CompileError::syntax(file, line, "expected ']'"));
        }
        if tokens.get(pos + 1) != Some(&Token::Eof) {
            return Err(CompileError::syntax(file, line, "unexpected tokens after ']'"));
        }

        // Segments are top-of-tree -> leaf in the source, i.e. reversed
        // relative to how the user writes them left-to-right (`co.uk` means
        // `uk` is the parent of `co`).
        segments.reverse();

        let mut rule = Rule::new();
        for seg in &segments {
            rule.add_segment(seg, file, line)?;
        }
        rule.close();
        rule.marked_exception_syntax = exception;

        if let Some(status) = self.globals.status {
            rule.set_status(status, file, line)?;
        }
        for (name, value) in &self.globals.tags {
            rule.add_tag(name, value);
        }
        rule.reset_set_flags();

        self.rules.push(rule);
        self.current = Some(self.rules.len() - 1);
        Ok(())
    }

    fn parse_assignment(&mut self, file: &str, line: u32, tokens: &[Token]) -> Result<(), CompileError> {
        let name = match tokens.first() {
            Some(Token::Ident(s)) => s.clone(),
            _ => return Err(CompileError::syntax(file, line, "expected an assignment")),
        };
        if tokens.get(1) != Some(&Token::Equals) {
            return Err(CompileError::syntax(file, line, "expected '=' after name"));
        }
        let value = read_value(file, line, &tokens[2..])?;

        if let Some(tag_name) = name.strip_prefix("tag/") {
            if tag_name.contains('/') {
                return Err(CompileError::syntax(file, line, "tag name may not contain '/'"));
            }
            match self.current {
                Some(idx) => self.rules[idx].add_tag(tag_name, &value),
                None => {
                    self.globals.tags.insert(tag_name.to_string(), value);
                }
            }
            return Ok(());
        }

        match name.as_str() {
            "status" => {
                let status = Status::parse(&value)
                    .filter(|s| *s != Status::Undefined)
                    .ok_or_else(|| CompileError::syntax(file, line, format!("unknown status '{value}'")))?;
                match self.current {
                    Some(idx) => self.rules[idx].set_status(status, file, line)?,
                    None => {
                        if self.globals.status.is_some() {
                            return Err(CompileError::syntax(file, line, "global status assigned twice"));
                        }
                        self.globals.status = Some(status);
                    }
                }
            }
            "apply_to" => {
                let target = value.strip_prefix('.').unwrap_or(&value).to_string();
                match self.current {
                    Some(idx) => self.rules[idx].set_apply_to(&target, file, line)?,
                    None => {
                        return Err(CompileError::syntax(file, line, "'apply_to' is not a valid global variable"));
                    }
                }
            }
            other => {
                return Err(CompileError::syntax(
                    file,
                    line,
                    format!("variable '{other}' is not supported; missing 'tag/'?"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reassembles a value from the remaining tokens on an assignment line,
/// joining dotted/word fragments the lexer split apart (e.g. `1.0.0`).
fn read_value(file: &str, line: u32, tokens: &[Token]) -> Result<String, CompileError> {
    if tokens.is_empty() || tokens == [Token::Eof] {
        return Err(CompileError::syntax(file, line, "expected a value after '='"));
    }
    let mut out = String::new();
    for tok in tokens {
        match tok {
            Token::Eof => break,
            Token::Ident(s) | Token::Word(s) | Token::QuotedString(s) | Token::Number(s) => out.push_str(s),
            Token::Dot => out.push('.'),
            Token::Star => out.push('*'),
            Token::Question => out.push('?'),
            Token::Equals => return Err(CompileError::syntax(file, line, "unexpected '=' in value")),
            Token::LBracket | Token::RBracket => {
                return Err(CompileError::syntax(file, line, "unexpected bracket in value"))
            }
        }
    }
    Ok(out)
}
