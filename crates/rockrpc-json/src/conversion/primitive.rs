use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;

use rust_decimal::Decimal;

use crate::error::{JsonError, JsonResult};
use crate::number::JsonNumber;
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, downcast_ref};
use super::{Exporter, Importer};

/// Numeric types with a JSON number mapping
pub trait JsonNumeric: Any + Send + Copy + fmt::Display {
    fn from_number(number: &JsonNumber) -> Option<Self>;
    fn to_number(self) -> Option<JsonNumber>;
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl JsonNumeric for $ty {
                fn from_number(number: &JsonNumber) -> Option<Self> {
                    number.to_integer()
                }

                fn to_number(self) -> Option<JsonNumber> {
                    Some(self.into())
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl JsonNumeric for f32 {
    fn from_number(number: &JsonNumber) -> Option<Self> {
        number.to_f32()
    }

    fn to_number(self) -> Option<JsonNumber> {
        JsonNumber::from_f32(self)
    }
}

impl JsonNumeric for f64 {
    fn from_number(number: &JsonNumber) -> Option<Self> {
        Some(number.to_f64())
    }

    fn to_number(self) -> Option<JsonNumber> {
        JsonNumber::from_f64(self)
    }
}

/// Parsed from the lexeme itself, so digits beyond `f64` precision survive
impl JsonNumeric for Decimal {
    fn from_number(number: &JsonNumber) -> Option<Self> {
        let text = number.as_str();
        if text.contains(['e', 'E']) {
            Decimal::from_scientific(text).ok()
        } else {
            text.parse().ok()
        }
    }

    fn to_number(self) -> Option<JsonNumber> {
        JsonNumber::parse(&self.to_string())
    }
}

/// Numbers; imports also accept numeric strings and booleans
pub struct NumberConverter<T>(PhantomData<fn() -> T>);

impl<T> NumberConverter<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NumberConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: JsonNumeric> Importer for NumberConverter<T> {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        let number = match reader.token_class() {
            TokenClass::Number => reader.read_number()?,
            TokenClass::String => {
                let text = reader.read_string()?;
                JsonNumber::parse(&text).ok_or_else(|| {
                    JsonError::import(format!("The text '{text}' is not a valid number."))
                })?
            }
            TokenClass::Boolean => JsonNumber::from(u8::from(reader.read_boolean()?)),
            class => {
                return Err(JsonError::import(format!(
                    "Found {class} where a number was expected."
                )));
            }
        };
        let value = T::from_number(&number).ok_or_else(|| {
            JsonError::import(format!(
                "The value {number} is out of range for {}.",
                type_name::<T>()
            ))
        })?;
        Ok(Box::new(value))
    }
}

impl<T: JsonNumeric> Exporter for NumberConverter<T> {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let value = *downcast_ref::<T>(value)?;
        let number = value.to_number().ok_or_else(|| {
            JsonError::export(format!("The value {value} cannot be written as a JSON number."))
        })?;
        writer.write_json_number(&number)
    }
}

/// Strings; imports also take the text of numbers and booleans
pub struct StringConverter;

impl Importer for StringConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        match reader.token_class() {
            TokenClass::String | TokenClass::Number | TokenClass::Boolean => {
                let text = reader.text().unwrap_or_default().to_string();
                reader.read()?;
                Ok(Box::new(text))
            }
            class => Err(JsonError::import(format!(
                "Found {class} where a string was expected."
            ))),
        }
    }
}

impl Exporter for StringConverter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_string(downcast_ref::<String>(value)?)
    }
}

/// Booleans; imports also take numbers (non-zero is true) and "true"/"false"
pub struct BooleanConverter;

impl Importer for BooleanConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        let value = match reader.token_class() {
            TokenClass::Boolean => reader.read_boolean()?,
            TokenClass::Number => reader.read_number()?.to_f64() != 0.0,
            TokenClass::String => {
                let text = reader.read_string()?;
                match text.trim() {
                    t if t.eq_ignore_ascii_case("true") => true,
                    t if t.eq_ignore_ascii_case("false") => false,
                    _ => {
                        return Err(JsonError::import(format!(
                            "The text '{text}' is not a valid boolean."
                        )));
                    }
                }
            }
            class => {
                return Err(JsonError::import(format!(
                    "Found {class} where a boolean was expected."
                )));
            }
        };
        Ok(Box::new(value))
    }
}

impl Exporter for BooleanConverter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_boolean(*downcast_ref::<bool>(value)?)
    }
}

/// `()` maps to JSON `null`
pub struct UnitConverter;

impl Importer for UnitConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        reader.read_null()?;
        Ok(Box::new(()))
    }
}

impl Exporter for UnitConverter {
    fn export(&self, _: &ExportContext, _: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_null()
    }
}
