//! Validating JSON writer
//!
//! [`JsonWriter`] tracks the bracket state of the document and rejects any
//! call that would produce malformed output, then hands the call to a
//! [`JsonEmitter`] backend that does the actual formatting or recording.

use serde_json::Value;

use crate::conversion::{ExportContext, Reflect};
use crate::error::{JsonError, JsonResult};
use crate::number::JsonNumber;
use crate::reader::JsonReader;
use crate::token::TokenClass;

/// Format-specific output primitives
///
/// Emitters are only ever called in a valid order; structural checks are the
/// writer's job.
pub trait JsonEmitter {
    fn emit_start_object(&mut self) -> JsonResult<()>;
    fn emit_end_object(&mut self) -> JsonResult<()>;
    fn emit_member(&mut self, name: &str) -> JsonResult<()>;
    fn emit_start_array(&mut self) -> JsonResult<()>;
    fn emit_end_array(&mut self) -> JsonResult<()>;
    fn emit_string(&mut self, value: &str) -> JsonResult<()>;
    fn emit_number(&mut self, value: &JsonNumber) -> JsonResult<()>;
    fn emit_boolean(&mut self, value: bool) -> JsonResult<()>;
    fn emit_null(&mut self) -> JsonResult<()>;

    fn flush(&mut self) -> JsonResult<()> {
        Ok(())
    }
}

/// Object-safe writer facade used by exporters and the dispatcher
pub trait JsonWrite {
    fn write_start_object(&mut self) -> JsonResult<()>;
    fn write_end_object(&mut self) -> JsonResult<()>;
    fn write_member(&mut self, name: &str) -> JsonResult<()>;
    fn write_start_array(&mut self) -> JsonResult<()>;
    fn write_end_array(&mut self) -> JsonResult<()>;
    fn write_string(&mut self, value: &str) -> JsonResult<()>;
    fn write_json_number(&mut self, value: &JsonNumber) -> JsonResult<()>;
    fn write_boolean(&mut self, value: bool) -> JsonResult<()>;
    fn write_null(&mut self) -> JsonResult<()>;

    /// Number of open containers
    fn depth(&self) -> usize;

    /// True once a complete root value has been written
    fn is_closed(&self) -> bool;

    fn flush(&mut self) -> JsonResult<()> {
        Ok(())
    }

    fn write_number<N: Into<JsonNumber>>(&mut self, value: N) -> JsonResult<()>
    where
        Self: Sized,
    {
        self.write_json_number(&value.into())
    }

    fn write_i64(&mut self, value: i64) -> JsonResult<()> {
        self.write_json_number(&value.into())
    }

    fn write_u64(&mut self, value: u64) -> JsonResult<()> {
        self.write_json_number(&value.into())
    }

    fn write_f64(&mut self, value: f64) -> JsonResult<()> {
        let number = JsonNumber::from_f64(value).ok_or_else(|| {
            JsonError::export(format!("The value {value} cannot be written as a JSON number."))
        })?;
        self.write_json_number(&number)
    }

    fn write_f32(&mut self, value: f32) -> JsonResult<()> {
        let number = JsonNumber::from_f32(value).ok_or_else(|| {
            JsonError::export(format!("The value {value} cannot be written as a JSON number."))
        })?;
        self.write_json_number(&number)
    }

    /// Copy the value under the reader's cursor, token by token
    fn write_from_reader(&mut self, reader: &mut dyn JsonReader) -> JsonResult<()> {
        reader.move_to_content()?;
        match reader.token_class() {
            TokenClass::StartObject => {
                reader.read()?;
                self.write_start_object()?;
                while reader.token_class() != TokenClass::EndObject {
                    let name = reader.read_member()?;
                    self.write_member(&name)?;
                    self.write_from_reader(reader)?;
                }
                reader.read()?;
                self.write_end_object()
            }
            TokenClass::StartArray => {
                reader.read()?;
                self.write_start_array()?;
                while reader.token_class() != TokenClass::EndArray {
                    self.write_from_reader(reader)?;
                }
                reader.read()?;
                self.write_end_array()
            }
            TokenClass::String => self.write_string(&reader.read_string()?),
            TokenClass::Number => self.write_json_number(&reader.read_number()?),
            TokenClass::Boolean => self.write_boolean(reader.read_boolean()?),
            TokenClass::Null => {
                reader.read_null()?;
                self.write_null()
            }
            class => Err(JsonError::structural(format!(
                "Found {class} where a value was expected."
            ))),
        }
    }

    fn write_value(&mut self, value: &Value) -> JsonResult<()> {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(b) => self.write_boolean(*b),
            Value::Number(n) => self.write_json_number(&JsonNumber::from_serde(n)),
            Value::String(s) => self.write_string(s),
            Value::Array(items) => {
                self.write_start_array()?;
                for item in items {
                    self.write_value(item)?;
                }
                self.write_end_array()
            }
            Value::Object(map) => {
                self.write_start_object()?;
                for (name, item) in map {
                    self.write_member(name)?;
                    self.write_value(item)?;
                }
                self.write_end_object()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    /// Nothing written yet
    Pending,
    Object,
    ObjectNext,
    /// Member name written, value pending
    Member,
    Array,
    ArrayNext,
    /// Root value complete
    Closed,
}

/// Writer that validates bracket state before delegating to an emitter
#[derive(Debug)]
pub struct JsonWriter<E> {
    emitter: E,
    brackets: Vec<Bracket>,
}

impl<E: JsonEmitter> JsonWriter<E> {
    pub fn new(emitter: E) -> Self {
        Self {
            emitter,
            brackets: vec![Bracket::Pending],
        }
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn into_inner(self) -> E {
        self.emitter
    }

    /// Write any native value through the export registry
    pub fn export<T: Reflect>(&mut self, context: &ExportContext, value: &T) -> JsonResult<()> {
        context.export(value, self)
    }

    fn top(&self) -> Bracket {
        self.brackets.last().copied().unwrap_or(Bracket::Closed)
    }

    fn set_top(&mut self, bracket: Bracket) {
        if let Some(top) = self.brackets.last_mut() {
            *top = bracket;
        }
    }

    fn enter_value(&mut self) -> JsonResult<()> {
        let next = match self.top() {
            Bracket::Pending => Bracket::Closed,
            Bracket::Member => Bracket::ObjectNext,
            Bracket::Array | Bracket::ArrayNext => Bracket::ArrayNext,
            Bracket::Object | Bracket::ObjectNext => {
                return Err(JsonError::structural(
                    "A member name must be written before a value inside an object.",
                ));
            }
            Bracket::Closed => {
                return Err(JsonError::structural(
                    "The JSON document has already ended; a second root value cannot be written.",
                ));
            }
        };
        self.set_top(next);
        Ok(())
    }
}

impl<E: JsonEmitter> JsonWrite for JsonWriter<E> {
    fn write_start_object(&mut self) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_start_object()?;
        self.brackets.push(Bracket::Object);
        Ok(())
    }

    fn write_end_object(&mut self) -> JsonResult<()> {
        match self.top() {
            Bracket::Object | Bracket::ObjectNext => {}
            Bracket::Member => {
                return Err(JsonError::structural(
                    "Cannot end an object while a member value is pending.",
                ));
            }
            _ => {
                return Err(JsonError::structural(
                    "Cannot end an object outside of an object.",
                ));
            }
        }
        self.brackets.pop();
        self.emitter.emit_end_object()?;
        if self.is_closed() {
            self.emitter.flush()?;
        }
        Ok(())
    }

    fn write_member(&mut self, name: &str) -> JsonResult<()> {
        match self.top() {
            Bracket::Object | Bracket::ObjectNext => {}
            Bracket::Member => {
                return Err(JsonError::structural(
                    "A member value must be written before the next member name.",
                ));
            }
            _ => {
                return Err(JsonError::structural(
                    "A member name can only be written inside an object.",
                ));
            }
        }
        self.set_top(Bracket::Member);
        self.emitter.emit_member(name)
    }

    fn write_start_array(&mut self) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_start_array()?;
        self.brackets.push(Bracket::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> JsonResult<()> {
        if !matches!(self.top(), Bracket::Array | Bracket::ArrayNext) {
            return Err(JsonError::structural(
                "Cannot end an array outside of an array.",
            ));
        }
        self.brackets.pop();
        self.emitter.emit_end_array()?;
        if self.is_closed() {
            self.emitter.flush()?;
        }
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_string(value)
    }

    fn write_json_number(&mut self, value: &JsonNumber) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_number(value)
    }

    fn write_boolean(&mut self, value: bool) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_boolean(value)
    }

    fn write_null(&mut self) -> JsonResult<()> {
        self.enter_value()?;
        self.emitter.emit_null()
    }

    fn depth(&self) -> usize {
        self.brackets.len().saturating_sub(1)
    }

    fn is_closed(&self) -> bool {
        self.brackets.as_slice() == [Bracket::Closed]
    }

    fn flush(&mut self) -> JsonResult<()> {
        self.emitter.flush()
    }
}

impl<W: JsonWrite + ?Sized> JsonWrite for &mut W {
    fn write_start_object(&mut self) -> JsonResult<()> {
        (**self).write_start_object()
    }

    fn write_end_object(&mut self) -> JsonResult<()> {
        (**self).write_end_object()
    }

    fn write_member(&mut self, name: &str) -> JsonResult<()> {
        (**self).write_member(name)
    }

    fn write_start_array(&mut self) -> JsonResult<()> {
        (**self).write_start_array()
    }

    fn write_end_array(&mut self) -> JsonResult<()> {
        (**self).write_end_array()
    }

    fn write_string(&mut self, value: &str) -> JsonResult<()> {
        (**self).write_string(value)
    }

    fn write_json_number(&mut self, value: &JsonNumber) -> JsonResult<()> {
        (**self).write_json_number(value)
    }

    fn write_boolean(&mut self, value: bool) -> JsonResult<()> {
        (**self).write_boolean(value)
    }

    fn write_null(&mut self) -> JsonResult<()> {
        (**self).write_null()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn flush(&mut self) -> JsonResult<()> {
        (**self).flush()
    }
}
