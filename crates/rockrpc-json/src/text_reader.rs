//! Tokenizer over JSON text
//!
//! Accepts standard JSON plus the relaxed forms seen in hand-written
//! payloads: single-quoted strings, unquoted member names and scalars,
//! `//` and `/* */` comments, and `=`/`=>` as member separators.

use std::io::Read;

use tracing::trace;

use crate::error::{JsonError, JsonResult};
use crate::number::JsonNumber;
use crate::options::ReaderOptions;
use crate::reader::JsonReader;
use crate::token::{Token, TokenClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Container just opened
    Fresh,
    /// Member name consumed, value pending
    Member,
    /// At least one value consumed
    Value,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    container: Container,
    position: Position,
}

/// [`JsonReader`] over an in-memory character source
#[derive(Debug)]
pub struct JsonTextReader {
    source: Vec<char>,
    pos: usize,
    token: Token,
    stack: Vec<Frame>,
    options: ReaderOptions,
    started: bool,
}

impl JsonTextReader {
    pub fn new(text: &str) -> Self {
        Self::with_options(text, ReaderOptions::default())
    }

    pub fn with_options(text: &str, options: ReaderOptions) -> Self {
        Self {
            source: text.chars().collect(),
            pos: 0,
            token: Token::begin_of_input(),
            stack: Vec::new(),
            options,
            started: false,
        }
    }

    /// Drain `input` and read from its text
    pub fn from_reader<R: Read>(mut input: R) -> JsonResult<Self> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        Ok(Self::new(&text))
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn error(&self, message: impl Into<String>) -> JsonError {
        let consumed = &self.source[..self.pos.min(self.source.len())];
        let line = consumed.iter().filter(|c| **c == '\n').count() + 1;
        let column = match consumed.iter().rposition(|c| *c == '\n') {
            Some(newline) => consumed.len() - newline,
            None => consumed.len() + 1,
        };
        JsonError::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.source.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn peek_char(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Next character that is neither whitespace nor part of a comment
    fn next_clean(&mut self) -> JsonResult<Option<char>> {
        loop {
            match self.next_char() {
                None => return Ok(None),
                Some('/') => match self.peek_char() {
                    Some('/') => {
                        while let Some(c) = self.next_char() {
                            if c == '\n' || c == '\r' {
                                break;
                            }
                        }
                    }
                    Some('*') => {
                        self.pos += 1;
                        loop {
                            match self.next_char() {
                                None => return Err(self.error("Unclosed comment.")),
                                Some('*') if self.peek_char() == Some('/') => {
                                    self.pos += 1;
                                    break;
                                }
                                Some(_) => {}
                            }
                        }
                    }
                    _ => return Ok(Some('/')),
                },
                Some(c) if c <= ' ' || c.is_whitespace() => {}
                Some(c) => return Ok(Some(c)),
            }
        }
    }

    fn next_significant(&mut self) -> JsonResult<char> {
        self.next_clean()?
            .ok_or_else(|| self.error("Unexpected end of input."))
    }

    fn scan_string(&mut self, quote: char) -> JsonResult<String> {
        let mut out = String::new();
        loop {
            let c = match self.next_char() {
                None | Some('\n') | Some('\r') => return Err(self.error("Unterminated string.")),
                Some(c) => c,
            };
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self
                .next_char()
                .ok_or_else(|| self.error("Unterminated string."))?;
            match escaped {
                'b' => out.push('\u{8}'),
                't' => out.push('\t'),
                'n' => out.push('\n'),
                'f' => out.push('\u{c}'),
                'r' => out.push('\r'),
                'u' => out.push(self.scan_unicode_escape()?),
                other => out.push(other),
            }
        }
    }

    fn scan_hex4(&mut self) -> JsonResult<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = self
                .next_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid Unicode escape sequence."))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn scan_unicode_escape(&mut self) -> JsonResult<char> {
        let unit = self.scan_hex4()?;
        let code = if (0xD800..0xDC00).contains(&unit) {
            if self.next_char() != Some('\\') || self.next_char() != Some('u') {
                return Err(self.error("Unpaired surrogate in Unicode escape sequence."));
            }
            let low = self.scan_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("Unpaired surrogate in Unicode escape sequence."));
            }
            0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
        } else {
            unit
        };
        char::from_u32(code).ok_or_else(|| self.error("Invalid Unicode escape sequence."))
    }

    /// Raw run of characters up to the next delimiter, trimmed
    fn scan_bare(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c < ' ' || ",:]}/\\\"'[{;=#".contains(c) {
                break;
            }
            self.pos += 1;
        }
        self.source[start..self.pos]
            .iter()
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn push(&mut self, container: Container) -> JsonResult<()> {
        if self.stack.len() >= self.options.max_depth {
            return Err(self.error(format!(
                "Maximum nesting depth of {} exceeded.",
                self.options.max_depth
            )));
        }
        self.stack.push(Frame {
            container,
            position: Position::Fresh,
        });
        Ok(())
    }

    fn value_token(&mut self, c: char) -> JsonResult<Token> {
        if let Some(parent) = self.stack.last_mut() {
            parent.position = Position::Value;
        }
        match c {
            '{' => {
                self.push(Container::Object)?;
                Ok(Token::start_object())
            }
            '[' => {
                self.push(Container::Array)?;
                Ok(Token::start_array())
            }
            '"' | '\'' => Ok(Token::string(self.scan_string(c)?)),
            _ => {
                self.pos -= 1;
                let text = self.scan_bare();
                self.classify_bare(text)
            }
        }
    }

    fn classify_bare(&self, text: String) -> JsonResult<Token> {
        match text.as_str() {
            "" => Err(self.error("Missing value.")),
            "true" => Ok(Token::boolean(true)),
            "false" => Ok(Token::boolean(false)),
            "null" => Ok(Token::null()),
            _ if text.starts_with(|c: char| c.is_ascii_digit() || "+-.".contains(c)) => {
                match JsonNumber::parse(&text) {
                    Some(number) => Ok(Token::number(&number)),
                    None => Err(self.error(format!(
                        "The text '{text}' has the incorrect syntax for a number."
                    ))),
                }
            }
            _ => Ok(Token::string(text)),
        }
    }

    fn member_token(&mut self, c: char) -> JsonResult<Token> {
        let name = match c {
            '"' | '\'' => self.scan_string(c)?,
            _ => {
                self.pos -= 1;
                let name = self.scan_bare();
                if name.is_empty() {
                    return Err(self.error("Missing member name."));
                }
                name
            }
        };
        match self.next_significant()? {
            ':' => {}
            '=' => {
                if self.peek_char() == Some('>') {
                    self.pos += 1;
                }
            }
            _ => return Err(self.error(format!("Expected a ':' after member '{name}'."))),
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.position = Position::Member;
        }
        Ok(Token::member(name))
    }

    fn close(&mut self, container: Container) -> Token {
        self.stack.pop();
        match container {
            Container::Object => Token::end_object(),
            Container::Array => Token::end_array(),
        }
    }

    fn next_token(&mut self) -> JsonResult<Token> {
        let Some(frame) = self.stack.last().copied() else {
            return self.next_root_token();
        };
        match (frame.container, frame.position) {
            (Container::Object, Position::Fresh) => match self.next_significant()? {
                '}' => Ok(self.close(Container::Object)),
                c => self.member_token(c),
            },
            (Container::Object, Position::Member) => {
                let c = self.next_significant()?;
                self.value_token(c)
            }
            (Container::Object, Position::Value) => match self.next_significant()? {
                '}' => Ok(self.close(Container::Object)),
                ',' => {
                    let c = self.next_significant()?;
                    self.member_token(c)
                }
                _ => Err(self.error("Expected a ',' or '}' after an object member.")),
            },
            (Container::Array, Position::Fresh) => match self.next_significant()? {
                ']' => Ok(self.close(Container::Array)),
                c => self.value_token(c),
            },
            (Container::Array, _) => match self.next_significant()? {
                ']' => Ok(self.close(Container::Array)),
                ',' => {
                    let c = self.next_significant()?;
                    self.value_token(c)
                }
                _ => Err(self.error("Expected a ',' or ']' after an array element.")),
            },
        }
    }

    fn next_root_token(&mut self) -> JsonResult<Token> {
        let Some(mut c) = self.next_clean()? else {
            return Ok(Token::end_of_input());
        };
        if !self.started {
            self.started = true;
            if c == '%' && self.options.percent_decoding {
                self.decode_percent_payload()?;
                c = match self.next_clean()? {
                    Some(c) => c,
                    None => return Ok(Token::end_of_input()),
                };
            }
        }
        if "]},:".contains(c) {
            return Err(self.error("Missing value."));
        }
        self.value_token(c)
    }

    /// Replace the remaining source with its URL-decoded form
    fn decode_percent_payload(&mut self) -> JsonResult<()> {
        let encoded: String = self.source[self.pos - 1..]
            .iter()
            .map(|c| if *c == '+' { ' ' } else { *c })
            .collect();
        let decoded = urlencoding::decode(&encoded)
            .map_err(|e| self.error(format!("Invalid percent-encoded payload: {e}")))?;
        trace!(len = decoded.len(), "Decoded percent-encoded JSON payload");
        self.source = decoded.chars().collect();
        self.pos = 0;
        Ok(())
    }
}

impl JsonReader for JsonTextReader {
    fn read(&mut self) -> JsonResult<bool> {
        if self.token.class() == TokenClass::EndOfInput {
            return Ok(false);
        }
        self.token = self.next_token()?;
        Ok(self.token.class() != TokenClass::EndOfInput)
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}
