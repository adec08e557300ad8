use std::any::Any;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::debug;

use crate::buffer::JsonBuffer;
use crate::error::{Direction, JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::text_reader::JsonTextReader;
use crate::writer::{JsonWrite, JsonWriter};

use super::any::AnyValueConverter;
use super::array::ArrayFamily;
use super::component::ComponentFamily;
use super::datetime::{DateTimeConverter, NaiveDateTimeConverter};
use super::dictionary::DictionaryFamily;
use super::enumeration::EnumFamily;
use super::nullable::NullableFamily;
use super::primitive::{BooleanConverter, NumberConverter, StringConverter, UnitConverter};
use super::reflect::{AnyBox, Reflect, TypeInfo, downcast_owned};
use super::registry::{ConverterFamily, ConverterRegistry};
use super::self_describing::SelfDescribingFamily;
use super::{Exporter, Importer};

static GLOBAL_IMPORT: Lazy<ImportContext> = Lazy::new(ImportContext::stock);
static GLOBAL_EXPORT: Lazy<ExportContext> = Lazy::new(ExportContext::stock);

/// Entry point for turning JSON into native values
///
/// Clones share one registry.
#[derive(Debug, Clone)]
pub struct ImportContext {
    registry: Arc<ConverterRegistry<dyn Importer>>,
}

impl Default for ImportContext {
    fn default() -> Self {
        Self::stock()
    }
}

impl ImportContext {
    /// Context without any converter
    pub fn empty() -> Self {
        Self {
            registry: Arc::new(ConverterRegistry::new(Direction::Import)),
        }
    }

    /// Fresh context holding the stock converters
    pub fn stock() -> Self {
        let context = Self::empty();
        macro_rules! numbers {
            ($($ty:ty),*) => {
                $(context.register::<$ty>(NumberConverter::<$ty>::new());)*
            };
        }
        numbers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Decimal);
        context.register::<String>(StringConverter);
        context.register::<bool>(BooleanConverter);
        context.register::<()>(UnitConverter);
        context.register::<chrono::DateTime<chrono::Utc>>(DateTimeConverter);
        context.register::<chrono::NaiveDateTime>(NaiveDateTimeConverter);
        context.register::<serde_json::Value>(AnyValueConverter);
        context.register_family(SelfDescribingFamily);
        context.register_family(NullableFamily);
        context.register_family(ArrayFamily);
        context.register_family(DictionaryFamily);
        context.register_family(EnumFamily);
        context.register_family(ComponentFamily);
        debug!("Stock import context created");
        context
    }

    /// Process-wide stock context
    pub fn global() -> &'static ImportContext {
        &GLOBAL_IMPORT
    }

    pub fn registry(&self) -> &ConverterRegistry<dyn Importer> {
        &self.registry
    }

    pub fn register<T: Reflect>(&self, importer: impl Importer + 'static) {
        self.register_for(&T::type_info(), Arc::new(importer));
    }

    pub fn register_for(&self, info: &TypeInfo, importer: Arc<dyn Importer>) {
        self.registry.register(info, importer);
    }

    pub fn register_family(&self, family: impl ConverterFamily<dyn Importer> + 'static) {
        self.registry.register_family(Arc::new(family));
    }

    pub fn find_importer(&self, info: &TypeInfo) -> JsonResult<Arc<dyn Importer>> {
        self.registry.find(info).ok_or(JsonError::NoConverter {
            type_name: info.name(),
            direction: Direction::Import,
        })
    }

    /// Import the value under the cursor as the described type
    pub fn import_type(&self, info: &TypeInfo, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        reader.move_to_content()?;
        self.find_importer(info)?.import(self, reader)
    }

    pub fn import<T: Reflect>(&self, reader: &mut dyn JsonReader) -> JsonResult<T> {
        downcast_owned(self.import_type(&T::type_info(), reader)?)
    }

    pub fn import_str<T: Reflect>(&self, text: &str) -> JsonResult<T> {
        self.import(&mut JsonTextReader::new(text))
    }

    pub fn import_buffer<T: Reflect>(&self, buffer: &JsonBuffer) -> JsonResult<T> {
        self.import(&mut buffer.reader())
    }
}

/// Entry point for turning native values into JSON
#[derive(Debug, Clone)]
pub struct ExportContext {
    registry: Arc<ConverterRegistry<dyn Exporter>>,
}

impl Default for ExportContext {
    fn default() -> Self {
        Self::stock()
    }
}

impl ExportContext {
    pub fn empty() -> Self {
        Self {
            registry: Arc::new(ConverterRegistry::new(Direction::Export)),
        }
    }

    pub fn stock() -> Self {
        let context = Self::empty();
        macro_rules! numbers {
            ($($ty:ty),*) => {
                $(context.register::<$ty>(NumberConverter::<$ty>::new());)*
            };
        }
        numbers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Decimal);
        context.register::<String>(StringConverter);
        context.register::<bool>(BooleanConverter);
        context.register::<()>(UnitConverter);
        context.register::<chrono::DateTime<chrono::Utc>>(DateTimeConverter);
        context.register::<chrono::NaiveDateTime>(NaiveDateTimeConverter);
        context.register::<serde_json::Value>(AnyValueConverter);
        context.register_family(SelfDescribingFamily);
        context.register_family(NullableFamily);
        context.register_family(ArrayFamily);
        context.register_family(DictionaryFamily);
        context.register_family(EnumFamily);
        context.register_family(ComponentFamily);
        debug!("Stock export context created");
        context
    }

    pub fn global() -> &'static ExportContext {
        &GLOBAL_EXPORT
    }

    pub fn registry(&self) -> &ConverterRegistry<dyn Exporter> {
        &self.registry
    }

    pub fn register<T: Reflect>(&self, exporter: impl Exporter + 'static) {
        self.register_for(&T::type_info(), Arc::new(exporter));
    }

    pub fn register_for(&self, info: &TypeInfo, exporter: Arc<dyn Exporter>) {
        self.registry.register(info, exporter);
    }

    pub fn register_family(&self, family: impl ConverterFamily<dyn Exporter> + 'static) {
        self.registry.register_family(Arc::new(family));
    }

    /// Resolve an exporter, falling back to the type's name as a string
    pub fn find_exporter(&self, info: &TypeInfo) -> Arc<dyn Exporter> {
        match self.registry.find(info) {
            Some(exporter) => exporter,
            None => Arc::new(TypeNameExporter(info.short_name())),
        }
    }

    pub fn export_dyn(
        &self,
        info: &TypeInfo,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        self.find_exporter(info).export(self, value, writer)
    }

    pub fn export<T: Reflect>(&self, value: &T, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        self.export_dyn(&T::type_info(), value, writer)
    }

    pub fn export_to_string<T: Reflect>(&self, value: &T) -> JsonResult<String> {
        let mut writer = JsonWriter::text(String::new());
        self.export(value, &mut writer)?;
        Ok(writer.into_string())
    }

    pub fn export_to_buffer<T: Reflect>(&self, value: &T) -> JsonResult<JsonBuffer> {
        let mut writer = JsonWriter::buffer();
        self.export(value, &mut writer)?;
        Ok(writer.into_buffer())
    }
}

/// Writes the short type name of values nothing else can export
struct TypeNameExporter(String);

impl Exporter for TypeNameExporter {
    fn export(&self, _: &ExportContext, _: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_string(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Opaque;

    impl Reflect for Opaque {
        fn type_info() -> TypeInfo {
            TypeInfo::opaque::<Opaque>()
        }
    }

    #[test]
    fn test_import_primitives() {
        let context = ImportContext::stock();
        assert_eq!(context.import_str::<i32>("42").unwrap(), 42);
        assert_eq!(context.import_str::<String>("'x'").unwrap(), "x");
        assert_eq!(
            context.import_str::<Vec<Option<u8>>>("[1, null]").unwrap(),
            vec![Some(1), None]
        );
    }

    #[test]
    fn test_import_without_converter_fails() {
        let context = ImportContext::empty();
        let err = context.import_str::<i32>("1").unwrap_err();
        assert!(matches!(
            err,
            JsonError::NoConverter {
                direction: Direction::Import,
                ..
            }
        ));
        assert!(ImportContext::stock().import_str::<Opaque>("1").is_err());
    }

    #[test]
    fn test_export_fallback_writes_type_name() {
        let context = ExportContext::stock();
        assert_eq!(context.export_to_string(&Opaque).unwrap(), "\"Opaque\"");
    }

    #[test]
    fn test_export_value() {
        let context = ExportContext::global();
        let text = context
            .export_to_string(&json!({"a": [1, null]}))
            .unwrap();
        assert_eq!(text, r#"{"a":[1,null]}"#);
    }

    #[test]
    fn test_contexts_share_registry_when_cloned() {
        let context = ImportContext::stock();
        let clone = context.clone();
        let before = context.registry().generation();
        clone.register::<Opaque>(UnitConverter);
        assert_eq!(context.registry().generation(), before + 1);
    }
}
