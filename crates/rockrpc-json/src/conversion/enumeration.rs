use std::any::Any;
use std::sync::Arc;

use crate::error::{JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, EnumInfo, TypeInfo, TypeKind};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

/// Family for fieldless enumerations, written as variant-name strings
///
/// Bit-flag enumerations are declined.
pub struct EnumFamily;

pub struct EnumImporter {
    info: &'static EnumInfo,
}

impl EnumImporter {
    fn position(&self, name: &str) -> Option<usize> {
        let variants = self.info.variants;
        variants
            .iter()
            .position(|variant| *variant == name)
            .or_else(|| {
                variants
                    .iter()
                    .position(|variant| variant.eq_ignore_ascii_case(name))
            })
    }
}

impl Importer for EnumImporter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        let text = reader.read_string()?;
        let name = text.trim();
        self.position(name)
            .and_then(|index| (self.info.from_index)(index))
            .ok_or_else(|| {
                JsonError::import(format!(
                    "'{name}' is not a valid value for {}.",
                    self.info.name
                ))
            })
    }
}

pub struct EnumExporter {
    info: &'static EnumInfo,
}

impl Exporter for EnumExporter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let name = (self.info.to_index)(value)
            .and_then(|index| self.info.variants.get(index))
            .ok_or_else(|| JsonError::export(format!("Expected a value of type {}.", self.info.name)))?;
        writer.write_string(name)
    }
}

fn accepts(info: &TypeInfo) -> Option<&'static EnumInfo> {
    match info.kind() {
        TypeKind::Enum(enumeration) if !enumeration.flags => Some(*enumeration),
        _ => None,
    }
}

impl ConverterFamily<dyn Importer> for EnumFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        accepts(info).map(|info| Arc::new(EnumImporter { info }) as Arc<dyn Importer>)
    }
}

impl ConverterFamily<dyn Exporter> for EnumFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        accepts(info).map(|info| Arc::new(EnumExporter { info }) as Arc<dyn Exporter>)
    }
}

#[cfg(test)]
mod tests {
    use crate::JsonEnum;
    use crate::conversion::{ExportContext, ImportContext};

    #[derive(Debug, Clone, Copy, PartialEq, JsonEnum)]
    enum Color {
        Red,
        #[json(rename = "dark-green")]
        Green,
    }

    #[derive(Debug, Clone, Copy, PartialEq, JsonEnum)]
    #[json_enum(flags)]
    enum Permission {
        Read,
        Write,
    }

    #[test]
    fn test_enum_round_trip() {
        let context = ImportContext::global();
        assert_eq!(context.import_str::<Color>("'Red'").unwrap(), Color::Red);
        assert_eq!(context.import_str::<Color>("'red'").unwrap(), Color::Red);
        assert_eq!(context.import_str::<Color>("'dark-green'").unwrap(), Color::Green);
        assert!(context.import_str::<Color>("'Blue'").is_err());
        assert!(context.import_str::<Color>("1").is_err());
        assert_eq!(
            ExportContext::global().export_to_string(&Color::Green).unwrap(),
            "\"dark-green\""
        );
    }

    #[test]
    fn test_flags_enum_rejected() {
        assert!(ImportContext::global().import_str::<Permission>("'Read'").is_err());
        let _ = Permission::Write;
    }
}
