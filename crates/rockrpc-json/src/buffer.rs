//! In-memory token recording and replay
//!
//! A [`JsonBuffer`] holds the token sequence of one or more JSON values. The
//! dispatcher records request parameters this way before it knows which types
//! to import them as.

use serde_json::Value;

use crate::error::{JsonError, JsonResult};
use crate::number::JsonNumber;
use crate::reader::JsonReader;
use crate::token::{Token, TokenClass};
use crate::writer::{JsonEmitter, JsonWrite, JsonWriter};

static BEGIN_OF_INPUT: Token = Token::begin_of_input();
static END_OF_INPUT: Token = Token::end_of_input();

/// Recorded token sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonBuffer {
    tokens: Vec<Token>,
}

impl JsonBuffer {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// A buffer holding a single JSON `null`
    pub fn null() -> Self {
        Self::new(vec![Token::null()])
    }

    /// Wrap already recorded values into one array
    pub fn array(items: impl IntoIterator<Item = JsonBuffer>) -> Self {
        let mut tokens = vec![Token::start_array()];
        for item in items {
            tokens.extend(item.tokens);
        }
        tokens.push(Token::end_array());
        Self::new(tokens)
    }

    /// Record the value under the reader's cursor
    pub fn from_reader(reader: &mut dyn JsonReader) -> JsonResult<Self> {
        let mut writer = JsonWriter::buffer();
        writer.write_from_reader(reader)?;
        Ok(writer.into_buffer())
    }

    pub fn from_value(value: &Value) -> JsonResult<Self> {
        let mut writer = JsonWriter::buffer();
        writer.write_value(value)?;
        Ok(writer.into_buffer())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn first_class(&self) -> Option<TokenClass> {
        self.tokens.first().map(Token::class)
    }

    pub fn is_array(&self) -> bool {
        self.first_class() == Some(TokenClass::StartArray)
    }

    pub fn is_object(&self) -> bool {
        self.first_class() == Some(TokenClass::StartObject)
    }

    pub fn is_null(&self) -> bool {
        self.first_class() == Some(TokenClass::Null)
    }

    pub fn reader(&self) -> JsonBufferReader<'_> {
        JsonBufferReader::new(&self.tokens)
    }

    /// Split a recorded array into one buffer per element
    pub fn elements(&self) -> JsonResult<Vec<JsonBuffer>> {
        if !self.is_array() {
            return Err(JsonError::structural(
                "The buffer does not hold an array.",
            ));
        }
        let mut items = Vec::new();
        let mut index = 1;
        while self.class_at(index)? != TokenClass::EndArray {
            let len = value_len(&self.tokens[index..])?;
            items.push(Self::new(self.tokens[index..index + len].to_vec()));
            index += len;
        }
        Ok(items)
    }

    /// Split a recorded object into its members
    pub fn members(&self) -> JsonResult<Vec<(String, JsonBuffer)>> {
        if !self.is_object() {
            return Err(JsonError::structural(
                "The buffer does not hold an object.",
            ));
        }
        let mut members = Vec::new();
        let mut index = 1;
        while self.class_at(index)? != TokenClass::EndObject {
            let name = match &self.tokens[index] {
                token if token.class() == TokenClass::Member => {
                    token.text().unwrap_or_default().to_string()
                }
                token => {
                    return Err(JsonError::structural(format!(
                        "Found {} where Member was expected.",
                        token.class()
                    )));
                }
            };
            index += 1;
            let len = value_len(&self.tokens[index..])?;
            members.push((name, Self::new(self.tokens[index..index + len].to_vec())));
            index += len;
        }
        Ok(members)
    }

    fn class_at(&self, index: usize) -> JsonResult<TokenClass> {
        self.tokens
            .get(index)
            .map(Token::class)
            .ok_or_else(|| JsonError::structural("Unexpected end of recorded tokens."))
    }

    pub fn to_value(&self) -> JsonResult<Value> {
        self.reader().read_value()
    }

    /// Compact JSON text of the first recorded value
    pub fn to_text(&self) -> JsonResult<String> {
        let mut writer = JsonWriter::text(String::new());
        writer.write_from_reader(&mut self.reader())?;
        Ok(writer.into_string())
    }
}

/// Number of tokens making up the value starting at `tokens[0]`
fn value_len(tokens: &[Token]) -> JsonResult<usize> {
    let mut level = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        match token.class() {
            TokenClass::StartObject | TokenClass::StartArray => level += 1,
            TokenClass::EndObject | TokenClass::EndArray => {
                if level == 0 {
                    break;
                }
                level -= 1;
            }
            TokenClass::Member => {
                if level == 0 {
                    break;
                }
            }
            _ => {}
        }
        if level == 0 {
            return Ok(index + 1);
        }
    }
    Err(JsonError::structural("Incomplete value in recorded tokens."))
}

/// Emitter recording tokens into a [`JsonBuffer`]
#[derive(Debug, Default)]
pub struct BufferEmitter {
    tokens: Vec<Token>,
}

impl BufferEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_buffer(self) -> JsonBuffer {
        JsonBuffer::new(self.tokens)
    }
}

impl JsonEmitter for BufferEmitter {
    fn emit_start_object(&mut self) -> JsonResult<()> {
        self.tokens.push(Token::start_object());
        Ok(())
    }

    fn emit_end_object(&mut self) -> JsonResult<()> {
        self.tokens.push(Token::end_object());
        Ok(())
    }

    fn emit_member(&mut self, name: &str) -> JsonResult<()> {
        self.tokens.push(Token::member(name));
        Ok(())
    }

    fn emit_start_array(&mut self) -> JsonResult<()> {
        self.tokens.push(Token::start_array());
        Ok(())
    }

    fn emit_end_array(&mut self) -> JsonResult<()> {
        self.tokens.push(Token::end_array());
        Ok(())
    }

    fn emit_string(&mut self, value: &str) -> JsonResult<()> {
        self.tokens.push(Token::string(value));
        Ok(())
    }

    fn emit_number(&mut self, value: &JsonNumber) -> JsonResult<()> {
        self.tokens.push(Token::number(value));
        Ok(())
    }

    fn emit_boolean(&mut self, value: bool) -> JsonResult<()> {
        self.tokens.push(Token::boolean(value));
        Ok(())
    }

    fn emit_null(&mut self) -> JsonResult<()> {
        self.tokens.push(Token::null());
        Ok(())
    }
}

impl JsonWriter<BufferEmitter> {
    /// Writer recording into a token buffer
    pub fn buffer() -> Self {
        JsonWriter::new(BufferEmitter::new())
    }

    pub fn into_buffer(self) -> JsonBuffer {
        self.into_inner().into_buffer()
    }
}

/// [`JsonReader`] replaying recorded tokens
#[derive(Debug)]
pub struct JsonBufferReader<'a> {
    tokens: &'a [Token],
    /// 0 is begin of input, `tokens.len() + 1` end of input
    position: usize,
    depth: usize,
}

impl<'a> JsonBufferReader<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }
}

impl JsonReader for JsonBufferReader<'_> {
    fn read(&mut self) -> JsonResult<bool> {
        if self.position > self.tokens.len() {
            return Ok(false);
        }
        self.position += 1;
        match self.token_class() {
            TokenClass::StartObject | TokenClass::StartArray => self.depth += 1,
            TokenClass::EndObject | TokenClass::EndArray => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }
        Ok(!self.eof())
    }

    fn token(&self) -> &Token {
        match self.position {
            0 => &BEGIN_OF_INPUT,
            n => self.tokens.get(n - 1).unwrap_or(&END_OF_INPUT),
        }
    }

    fn depth(&self) -> usize {
        self.depth
    }
}
