use std::any::Any;
use std::sync::Arc;

use crate::error::JsonResult;
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, OptionalInfo, TypeInfo, TypeKind};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

/// Family for `Option<T>`: JSON `null` is `None`, anything else goes to `T`
pub struct NullableFamily;

pub struct NullableImporter {
    info: OptionalInfo,
}

impl Importer for NullableImporter {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        if reader.token_class() == TokenClass::Null {
            reader.read()?;
            return (self.info.wrap)(None);
        }
        let inner = context.import_type(&(self.info.inner)(), reader)?;
        (self.info.wrap)(Some(inner))
    }
}

pub struct NullableExporter {
    info: OptionalInfo,
}

impl Exporter for NullableExporter {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        match (self.info.get)(value) {
            Some(inner) => context.export_dyn(&(self.info.inner)(), inner, writer),
            None => writer.write_null(),
        }
    }
}

impl ConverterFamily<dyn Importer> for NullableFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        match info.kind() {
            TypeKind::Optional(optional) => Some(Arc::new(NullableImporter { info: *optional })),
            _ => None,
        }
    }
}

impl ConverterFamily<dyn Exporter> for NullableFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        match info.kind() {
            TypeKind::Optional(optional) => Some(Arc::new(NullableExporter { info: *optional })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conversion::{ExportContext, ImportContext};

    #[test]
    fn test_option_round_trip() {
        let import = ImportContext::global();
        assert_eq!(import.import_str::<Option<i32>>("null").unwrap(), None);
        assert_eq!(import.import_str::<Option<i32>>("7").unwrap(), Some(7));
        assert_eq!(
            import.import_str::<Option<Option<String>>>("'x'").unwrap(),
            Some(Some("x".to_string()))
        );

        let export = ExportContext::global();
        assert_eq!(export.export_to_string(&Some(1u8)).unwrap(), "1");
        assert_eq!(export.export_to_string(&None::<u8>).unwrap(), "null");
    }
}
