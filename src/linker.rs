//! Textual parser for GNU ld linker scripts, limited to what a usage
//! report needs: the `MEMORY` block (region name, origin, length) and the
//! `SECTIONS` block's `> REGION` / `AT > REGION` placements. The script
//! is scanned, never executed.

use crate::config::{Config, RegionSpec};
use crate::{Error, Result};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Token<'a> {
    Word(&'a str),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,
    Equals,
    Gt,
    Semicolon,
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        let symbol = match c {
            b'{' => Some(Token::LBrace),
            b'}' => Some(Token::RBrace),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b':' => Some(Token::Colon),
            b',' => Some(Token::Comma),
            b'=' => Some(Token::Equals),
            b'>' => Some(Token::Gt),
            b';' => Some(Token::Semicolon),
            _ => None,
        };
        if let Some(token) = symbol {
            tokens.push(token);
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() {
            let c = bytes[i];
            if c.is_ascii_whitespace() || b"{}():,=>;".contains(&c) {
                break;
            }
            if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                break;
            }
            i += 1;
        }
        tokens.push(Token::Word(&input[start..i]));
    }

    tokens
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: Token<'a>) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

/// Parses a linker script into a region config.
///
/// # Errors
/// Returns an error if the `MEMORY` block is malformed or if the script
/// declares no memory region at all.
pub fn parse(script: &str) -> Result<Config> {
    let mut parser = Parser {
        tokens: tokenize(script),
        pos: 0,
    };
    let mut config = Config::new();

    while let Some(token) = parser.next() {
        match token {
            Token::Word("MEMORY") if parser.peek() == Some(Token::LBrace) => {
                parser.next();
                parse_memory(&mut parser, &mut config)?;
            }
            Token::Word("SECTIONS") if parser.peek() == Some(Token::LBrace) => {
                parser.next();
                parse_sections(&mut parser, &mut config);
            }
            _ => {}
        }
    }

    if config.is_empty() {
        return Err(Error::Linker("no MEMORY regions found".to_string()));
    }
    Ok(config)
}

fn is_origin_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("ORIGIN") || key.eq_ignore_ascii_case("org") || key.eq_ignore_ascii_case("o")
}

fn is_length_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("LENGTH") || key.eq_ignore_ascii_case("len") || key.eq_ignore_ascii_case("l")
}

/// Number with optional `0x` prefix and `K`/`M`/`G` scale suffix.
fn parse_number(word: &str) -> Option<u64> {
    let (digits, multiplier) = match word.as_bytes().last()? {
        b'K' | b'k' => (&word[..word.len() - 1], 1024),
        b'M' | b'm' => (&word[..word.len() - 1], 1024 * 1024),
        b'G' | b'g' => (&word[..word.len() - 1], 1024 * 1024 * 1024),
        _ => (word, 1),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    value.checked_mul(multiplier)
}

/// Parses `NAME [(attrs)] : ORIGIN = <n>, LENGTH = <n>` entries until the
/// closing brace.
fn parse_memory(parser: &mut Parser<'_>, config: &mut Config) -> Result<()> {
    loop {
        let name = match parser.next() {
            Some(Token::RBrace) => return Ok(()),
            Some(Token::Word(name)) => name,
            _ => return Err(Error::Linker("malformed MEMORY block".to_string())),
        };
        if parser.eat(Token::LParen) {
            while let Some(token) = parser.next() {
                if token == Token::RParen {
                    break;
                }
            }
        }
        if !parser.eat(Token::Colon) {
            return Err(Error::Linker(format!("expected `:` after region `{name}`")));
        }

        let mut origin = None;
        let mut length = None;
        while let Some(Token::Word(key)) = parser.peek() {
            if !is_origin_key(key) && !is_length_key(key) {
                break;
            }
            parser.next();
            if !parser.eat(Token::Equals) {
                return Err(Error::Linker(format!(
                    "expected `=` after `{key}` in region `{name}`"
                )));
            }
            let Some(Token::Word(value)) = parser.next() else {
                return Err(Error::Linker(format!(
                    "expected a value for `{key}` in region `{name}`"
                )));
            };
            let value = parse_number(value).ok_or_else(|| {
                Error::Linker(format!("bad {key} value `{value}` in region `{name}`"))
            })?;
            if is_origin_key(key) {
                origin = Some(value);
            } else {
                length = Some(value);
            }
            parser.eat(Token::Comma);
        }

        let Some(length) = length else {
            return Err(Error::Linker(format!("region `{name}` has no LENGTH")));
        };
        config.insert(name, RegionSpec::new(length, origin));
    }
}

/// Walks the `SECTIONS` body recording which region each output section
/// is placed into. `> REGION` and `AT > REGION` both count (initialized
/// data occupies its load region and its run region). Statements the
/// scanner does not understand are skipped.
fn parse_sections(parser: &mut Parser<'_>, config: &mut Config) {
    let mut depth = 1usize;
    let mut paren_depth = 0usize;
    // last plausible section name in the current statement's header,
    // frozen into `current` at the header colon. Words after the colon
    // (ALIGN, addresses) are not names.
    let mut stmt_name: Option<&str> = None;
    let mut seen_colon = false;
    let mut current: Option<&str> = None;

    while let Some(token) = parser.next() {
        match token {
            Token::LBrace => depth += 1,
            Token::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return;
                }
                if depth == 1 {
                    if stmt_name.is_some() {
                        current = stmt_name;
                    }
                    stmt_name = None;
                    seen_colon = false;
                }
            }
            Token::LParen if depth == 1 => paren_depth += 1,
            Token::RParen if depth == 1 => paren_depth = paren_depth.saturating_sub(1),
            Token::Word(word) if depth == 1 && paren_depth == 0 && !seen_colon => {
                if word != "AT" && !word.starts_with(|c: char| c.is_ascii_digit()) {
                    stmt_name = Some(word);
                }
            }
            Token::Colon if depth == 1 && paren_depth == 0 => {
                seen_colon = true;
                if stmt_name.is_some() {
                    current = stmt_name;
                }
            }
            Token::Gt if depth == 1 && paren_depth == 0 => {
                if let Some(Token::Word(region)) = parser.peek() {
                    parser.next();
                    if let (Some(section), Some(spec)) = (current, config.get_mut(region)) {
                        spec.add_section(section);
                    }
                    stmt_name = None;
                    seen_colon = false;
                }
            }
            Token::Semicolon if depth == 1 => {
                stmt_name = None;
                seen_colon = false;
                current = None;
            }
            _ => {}
        }
    }
}
