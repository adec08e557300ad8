use std::any::Any;
use std::sync::Arc;

use crate::error::{JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, SequenceInfo, TypeInfo, TypeKind};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

/// Family for single-dimension sequences
pub struct ArrayFamily;

/// Imports a JSON array; `null` yields an empty sequence and any other
/// value becomes a single-element sequence
pub struct ArrayImporter {
    info: SequenceInfo,
}

impl Importer for ArrayImporter {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        let element = (self.info.element)();
        let mut items = Vec::new();
        match reader.token_class() {
            TokenClass::Null => {
                reader.read()?;
            }
            TokenClass::StartArray => {
                reader.read()?;
                while reader.token_class() != TokenClass::EndArray {
                    if reader.eof() {
                        return Err(JsonError::structural("Unexpected end of input inside an array."));
                    }
                    items.push(context.import_type(&element, reader)?);
                }
                reader.read()?;
            }
            _ => items.push(context.import_type(&element, reader)?),
        }
        (self.info.build)(items)
    }
}

pub struct ArrayExporter {
    info: SequenceInfo,
}

impl Exporter for ArrayExporter {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        let element = (self.info.element)();
        writer.write_start_array()?;
        for item in (self.info.items)(value) {
            context.export_dyn(&element, item, writer)?;
        }
        writer.write_end_array()
    }
}

impl ConverterFamily<dyn Importer> for ArrayFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        match info.kind() {
            TypeKind::Sequence(sequence) => Some(Arc::new(ArrayImporter { info: *sequence })),
            _ => None,
        }
    }
}

impl ConverterFamily<dyn Exporter> for ArrayFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        match info.kind() {
            TypeKind::Sequence(sequence) => Some(Arc::new(ArrayExporter { info: *sequence })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};

    use crate::conversion::{ExportContext, ImportContext};

    #[test]
    fn test_import_arrays() {
        let context = ImportContext::global();
        assert_eq!(context.import_str::<Vec<i32>>("[1, 2, 3]").unwrap(), vec![1, 2, 3]);
        assert_eq!(context.import_str::<Vec<i32>>("[]").unwrap(), Vec::<i32>::new());
        assert_eq!(context.import_str::<Vec<i32>>("null").unwrap(), Vec::<i32>::new());
        assert_eq!(
            context.import_str::<Vec<Vec<String>>>("[['a'], []]").unwrap(),
            vec![vec!["a".to_string()], vec![]]
        );
        let set: BTreeSet<u8> = context.import_str("[3, 1, 3]").unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_scalar_promoted_to_single_element() {
        let context = ImportContext::global();
        assert_eq!(context.import_str::<Vec<i32>>("5").unwrap(), vec![5]);
        assert_eq!(
            context.import_str::<VecDeque<String>>("'only'").unwrap(),
            VecDeque::from(vec!["only".to_string()])
        );
    }

    #[test]
    fn test_element_failure_propagates() {
        assert!(ImportContext::global().import_str::<Vec<u8>>("[1, -1]").is_err());
    }

    #[test]
    fn test_export_arrays() {
        let context = ExportContext::global();
        assert_eq!(context.export_to_string(&vec![1, 2]).unwrap(), "[1,2]");
        assert_eq!(
            context.export_to_string(&vec![Some("a".to_string()), None]).unwrap(),
            r#"["a",null]"#
        );
        assert_eq!(context.export_to_string(&Vec::<bool>::new()).unwrap(), "[]");
    }
}
