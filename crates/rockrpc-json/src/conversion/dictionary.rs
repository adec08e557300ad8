use std::any::Any;
use std::sync::Arc;

use crate::error::{JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, MapInfo, TypeInfo, TypeKind};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

/// Family for string-keyed maps, written as JSON objects
pub struct DictionaryFamily;

pub struct DictionaryImporter {
    info: MapInfo,
}

impl Importer for DictionaryImporter {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        let value_type = (self.info.value)();
        let mut entries = Vec::new();
        match reader.token_class() {
            TokenClass::Null => {
                reader.read()?;
            }
            TokenClass::StartObject => {
                reader.read()?;
                while reader.token_class() != TokenClass::EndObject {
                    let key = reader.read_member()?;
                    let value = context.import_type(&value_type, reader)?;
                    entries.push((key, value));
                }
                reader.read()?;
            }
            class => {
                return Err(JsonError::import(format!(
                    "Found {class} where Object was expected."
                )));
            }
        }
        (self.info.build)(entries)
    }
}

pub struct DictionaryExporter {
    info: MapInfo,
}

impl Exporter for DictionaryExporter {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        let value_type = (self.info.value)();
        writer.write_start_object()?;
        for (key, entry) in (self.info.entries)(value) {
            writer.write_member(&key)?;
            context.export_dyn(&value_type, entry, writer)?;
        }
        writer.write_end_object()
    }
}

impl ConverterFamily<dyn Importer> for DictionaryFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        match info.kind() {
            TypeKind::Map(map) => Some(Arc::new(DictionaryImporter { info: *map })),
            _ => None,
        }
    }
}

impl ConverterFamily<dyn Exporter> for DictionaryFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        match info.kind() {
            TypeKind::Map(map) => Some(Arc::new(DictionaryExporter { info: *map })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use crate::conversion::{ExportContext, ImportContext};

    #[test]
    fn test_import_map() {
        let map: HashMap<String, Vec<i32>> = ImportContext::global()
            .import_str(r#"{"a": [1], "b": [], "a": [2]}"#)
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], vec![2]);
        assert!(ImportContext::global()
            .import_str::<HashMap<String, i32>>("[1]")
            .is_err());
    }

    #[test]
    fn test_export_map() {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), true);
        map.insert("y".to_string(), false);
        assert_eq!(
            ExportContext::global().export_to_string(&map).unwrap(),
            r#"{"x":true,"y":false}"#
        );
    }
}
