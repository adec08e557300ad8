//! Pull-style token reader contract
//!
//! A reader is always positioned on a current token. Freshly constructed
//! readers sit on [`TokenClass::BeginOfInput`]; every typed `read_*` helper
//! first moves to content, checks the current token and then advances past it.

use serde_json::{Map, Value};

use crate::error::{JsonError, JsonResult};
use crate::number::JsonNumber;
use crate::token::{Token, TokenClass};

pub trait JsonReader {
    /// Advance to the next token. Returns `false` once the end of input is reached.
    fn read(&mut self) -> JsonResult<bool>;

    /// The current token
    fn token(&self) -> &Token;

    /// Number of containers open after the current token
    fn depth(&self) -> usize;

    fn token_class(&self) -> TokenClass {
        self.token().class()
    }

    fn text(&self) -> Option<&str> {
        self.token().text()
    }

    fn eof(&self) -> bool {
        self.token_class() == TokenClass::EndOfInput
    }

    /// Step off the begin-of-input marker onto the first real token
    fn move_to_content(&mut self) -> JsonResult<bool> {
        if self.token_class() == TokenClass::BeginOfInput {
            self.read()?;
        }
        Ok(!self.eof())
    }

    /// Check the current token class, then advance past it, returning its text
    fn read_token(&mut self, expected: TokenClass) -> JsonResult<Option<String>> {
        self.move_to_content()?;
        let actual = self.token_class();
        if actual != expected {
            return Err(JsonError::structural(format!(
                "Found {actual} where {expected} was expected."
            )));
        }
        let text = self.text().map(str::to_string);
        self.read()?;
        Ok(text)
    }

    fn read_string(&mut self) -> JsonResult<String> {
        Ok(self.read_token(TokenClass::String)?.unwrap_or_default())
    }

    fn read_member(&mut self) -> JsonResult<String> {
        Ok(self.read_token(TokenClass::Member)?.unwrap_or_default())
    }

    fn read_number(&mut self) -> JsonResult<JsonNumber> {
        let text = self.read_token(TokenClass::Number)?.unwrap_or_default();
        JsonNumber::parse(&text).ok_or_else(|| {
            JsonError::structural(format!("The text '{text}' is not a valid number."))
        })
    }

    fn read_boolean(&mut self) -> JsonResult<bool> {
        let text = self.read_token(TokenClass::Boolean)?;
        Ok(text.as_deref() == Some("true"))
    }

    fn read_null(&mut self) -> JsonResult<()> {
        self.read_token(TokenClass::Null).map(|_| ())
    }

    /// Consume the value under the cursor without materializing it
    ///
    /// On a member the member and its value are skipped together.
    fn skip(&mut self) -> JsonResult<()> {
        self.move_to_content()?;
        match self.token_class() {
            TokenClass::Member => {
                self.read()?;
                self.skip()
            }
            TokenClass::StartObject | TokenClass::StartArray => {
                let mut level = 0usize;
                loop {
                    match self.token_class() {
                        TokenClass::StartObject | TokenClass::StartArray => level += 1,
                        TokenClass::EndObject | TokenClass::EndArray => level -= 1,
                        TokenClass::EndOfInput => {
                            return Err(JsonError::structural(
                                "Unexpected end of input while skipping a value.",
                            ));
                        }
                        _ => {}
                    }
                    self.read()?;
                    if level == 0 {
                        return Ok(());
                    }
                }
            }
            class if class.is_scalar() => self.read().map(|_| ()),
            class => Err(JsonError::structural(format!(
                "Found {class} where a value was expected."
            ))),
        }
    }

    /// Consume the rest of the innermost open container, including its end token
    fn step_out(&mut self) -> JsonResult<()> {
        let depth = self.depth();
        if depth == 0 {
            return Ok(());
        }
        while !(matches!(
            self.token_class(),
            TokenClass::EndObject | TokenClass::EndArray
        ) && self.depth() < depth)
        {
            if self.eof() {
                return Err(JsonError::structural(
                    "Unexpected end of input while stepping out of a container.",
                ));
            }
            self.read()?;
        }
        self.read().map(|_| ())
    }

    /// Materialize the value under the cursor
    fn read_value(&mut self) -> JsonResult<Value> {
        self.move_to_content()?;
        match self.token_class() {
            TokenClass::StartObject => {
                self.read()?;
                let mut map = Map::new();
                while self.token_class() != TokenClass::EndObject {
                    let name = self.read_member()?;
                    let value = self.read_value()?;
                    map.insert(name, value);
                }
                self.read()?;
                Ok(Value::Object(map))
            }
            TokenClass::StartArray => {
                self.read()?;
                let mut items = Vec::new();
                while self.token_class() != TokenClass::EndArray {
                    items.push(self.read_value()?);
                }
                self.read()?;
                Ok(Value::Array(items))
            }
            TokenClass::String => self.read_string().map(Value::String),
            TokenClass::Number => Ok(Value::Number(self.read_number()?.to_serde())),
            TokenClass::Boolean => self.read_boolean().map(Value::Bool),
            TokenClass::Null => self.read_null().map(|_| Value::Null),
            class => Err(JsonError::structural(format!(
                "Found {class} where a value was expected."
            ))),
        }
    }
}

impl<R: JsonReader + ?Sized> JsonReader for &mut R {
    fn read(&mut self) -> JsonResult<bool> {
        (**self).read()
    }

    fn token(&self) -> &Token {
        (**self).token()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }
}

impl<R: JsonReader + ?Sized> JsonReader for Box<R> {
    fn read(&mut self) -> JsonResult<bool> {
        (**self).read()
    }

    fn token(&self) -> &Token {
        (**self).token()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }
}
