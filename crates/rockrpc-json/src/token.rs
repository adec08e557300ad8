//! Token model
//!
//! Every unit produced by a [`JsonReader`](crate::JsonReader) or recorded by a
//! [`BufferEmitter`](crate::buffer::BufferEmitter) is a [`Token`]: a structural
//! class plus, for scalars and member names, the raw lexeme.

use std::fmt;

use crate::number::JsonNumber;

/// Structural category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    BeginOfInput,
    EndOfInput,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// An object member name; always followed by a value token or subtree
    Member,
    String,
    Number,
    Boolean,
    Null,
}

impl TokenClass {
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenClass::String | TokenClass::Number | TokenClass::Boolean | TokenClass::Null
        )
    }

    /// Tokens that close a context rather than open or continue one
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            TokenClass::EndObject | TokenClass::EndArray | TokenClass::EndOfInput
        )
    }

    /// True for tokens that start a value (scalar or container)
    pub fn starts_value(self) -> bool {
        self.is_scalar() || matches!(self, TokenClass::StartObject | TokenClass::StartArray)
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenClass::BeginOfInput => "BOF",
            TokenClass::EndOfInput => "EOF",
            TokenClass::StartObject => "Object",
            TokenClass::EndObject => "EndObject",
            TokenClass::StartArray => "Array",
            TokenClass::EndArray => "EndArray",
            TokenClass::Member => "Member",
            TokenClass::String => "String",
            TokenClass::Number => "Number",
            TokenClass::Boolean => "Boolean",
            TokenClass::Null => "Null",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token: its class and, for scalars and members, the raw text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    class: TokenClass,
    text: Option<String>,
}

impl Token {
    const fn bare(class: TokenClass) -> Self {
        Self { class, text: None }
    }

    pub const fn begin_of_input() -> Self {
        Self::bare(TokenClass::BeginOfInput)
    }

    pub const fn end_of_input() -> Self {
        Self::bare(TokenClass::EndOfInput)
    }

    pub const fn start_object() -> Self {
        Self::bare(TokenClass::StartObject)
    }

    pub const fn end_object() -> Self {
        Self::bare(TokenClass::EndObject)
    }

    pub const fn start_array() -> Self {
        Self::bare(TokenClass::StartArray)
    }

    pub const fn end_array() -> Self {
        Self::bare(TokenClass::EndArray)
    }

    pub fn member(name: impl Into<String>) -> Self {
        Self {
            class: TokenClass::Member,
            text: Some(name.into()),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            class: TokenClass::String,
            text: Some(value.into()),
        }
    }

    pub fn number(value: &JsonNumber) -> Self {
        Self {
            class: TokenClass::Number,
            text: Some(value.as_str().to_string()),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            class: TokenClass::Boolean,
            text: Some(if value { "true" } else { "false" }.to_string()),
        }
    }

    pub fn null() -> Self {
        Self {
            class: TokenClass::Null,
            text: Some("null".to_string()),
        }
    }

    pub fn class(&self) -> TokenClass {
        self.class
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}({:?})", self.class, text),
            None => write!(f, "{}", self.class),
        }
    }
}
