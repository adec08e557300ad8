//! # JSON reading, writing and native value conversion
//!
//! Streaming building blocks used by the rockrpc dispatcher, usable on their own.
//!
//! ## Features
//! - Pull-style [`JsonReader`] with a lenient text tokenizer ([`JsonTextReader`])
//! - Validating [`JsonWriter`] over pluggable emitters (text or token buffer)
//! - [`JsonBuffer`] token recordings for deferred conversion
//! - Import/export registries resolving converters per native type, with
//!   exact registrations and ordered converter families
//! - `#[derive(JsonComponent)]` and `#[derive(JsonEnum)]` for user types

extern crate self as rockrpc_json;

pub mod buffer;
pub mod conversion;
pub mod error;
pub mod number;
pub mod options;
pub mod prelude;
pub mod reader;
pub mod text_reader;
pub mod text_writer;
pub mod token;
pub mod writer;

pub use buffer::{BufferEmitter, JsonBuffer, JsonBufferReader};
pub use conversion::{ExportContext, ImportContext, Reflect, TypeInfo};
pub use error::{Direction, JsonError, JsonResult};
pub use number::JsonNumber;
pub use options::{DEFAULT_MAX_DEPTH, ReaderOptions, WriterOptions};
pub use reader::JsonReader;
pub use text_reader::JsonTextReader;
pub use text_writer::TextEmitter;
pub use token::{Token, TokenClass};
pub use writer::{JsonEmitter, JsonWrite, JsonWriter};

pub use rockrpc_derive::{JsonComponent, JsonEnum};

/// Parse a single JSON text into a `serde_json::Value`
///
/// Anything but whitespace or comments after the value is an error.
pub fn parse(text: &str) -> JsonResult<serde_json::Value> {
    let mut reader = JsonTextReader::new(text);
    let value = reader.read_value()?;
    if !reader.eof() {
        return Err(JsonError::structural(format!(
            "Found {} after the end of the JSON text.",
            reader.token_class()
        )));
    }
    Ok(value)
}

/// Compact JSON text for a `serde_json::Value`
pub fn to_string(value: &serde_json::Value) -> JsonResult<String> {
    let mut writer = JsonWriter::text(String::new());
    writer.write_value(value)?;
    Ok(writer.into_string())
}
