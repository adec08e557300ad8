//! Conversion between native values and JSON
//!
//! Two registries, one per direction, map native types to converters. Stock
//! converters cover primitives, date/time values, `serde_json::Value`,
//! options, sequences, string-keyed maps, enumerations and components.

mod any;
mod array;
mod component;
mod context;
mod datetime;
mod dictionary;
mod enumeration;
mod nullable;
mod primitive;
mod reflect;
mod registry;
mod self_describing;

use std::any::Any;

use crate::error::JsonResult;
use crate::reader::JsonReader;
use crate::writer::JsonWrite;

pub use any::AnyValueConverter;
pub use array::{ArrayExporter, ArrayFamily, ArrayImporter};
pub use component::{ComponentExporter, ComponentFamily, ComponentImporter};
pub use context::{ExportContext, ImportContext};
pub use datetime::{DateTimeConverter, NaiveDateTimeConverter, UnixTimeExporter};
pub use dictionary::{DictionaryExporter, DictionaryFamily, DictionaryImporter};
pub use enumeration::{EnumExporter, EnumFamily, EnumImporter};
pub use nullable::{NullableExporter, NullableFamily, NullableImporter};
pub use primitive::{BooleanConverter, NumberConverter, StringConverter, UnitConverter};
pub use reflect::{
    AnyBox, ComponentInfo, EnumInfo, JsonExportable, JsonImportable, MapInfo, OptionalInfo,
    PropertyInfo, PropertyValue, Reflect, SelfDescribingInfo, SequenceInfo, TypeInfo, TypeKind,
    downcast_owned, downcast_ref, short_type_name,
};
pub use registry::{ConverterFamily, ConverterRegistry, FnFamily};
pub use self_describing::SelfDescribingFamily;

/// Builds a native value from the JSON value under the reader's cursor
///
/// On success the reader is positioned just past the consumed value.
pub trait Importer: Send + Sync {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox>;
}

/// Writes a native value as exactly one JSON value
pub trait Exporter: Send + Sync {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()>;
}

pub type ImporterRegistry = ConverterRegistry<dyn Importer>;
pub type ExporterRegistry = ConverterRegistry<dyn Exporter>;
