use std::any::Any;
use std::sync::Arc;

use crate::buffer::JsonBuffer;
use crate::error::JsonResult;
use crate::reader::JsonReader;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{
    AnyBox, JsonExportable, JsonImportable, Reflect, SelfDescribingInfo, TypeInfo, TypeKind,
};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

/// Family for types carrying their own import and export code
pub struct SelfDescribingFamily;

struct SelfDescribingConverter(SelfDescribingInfo);

impl Importer for SelfDescribingConverter {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        (self.0.import)(context, reader)
    }
}

impl Exporter for SelfDescribingConverter {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        (self.0.export)(context, value, writer)
    }
}

fn converter(info: &TypeInfo) -> Option<Arc<SelfDescribingConverter>> {
    match info.kind() {
        TypeKind::SelfDescribing(converter) => Some(Arc::new(SelfDescribingConverter(*converter))),
        _ => None,
    }
}

impl ConverterFamily<dyn Importer> for SelfDescribingFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        converter(info).map(|c| c as Arc<dyn Importer>)
    }
}

impl ConverterFamily<dyn Exporter> for SelfDescribingFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        converter(info).map(|c| c as Arc<dyn Exporter>)
    }
}

// Raw JSON passes through untouched in both directions.

impl JsonImportable for JsonBuffer {
    fn import_json(_: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<Self> {
        JsonBuffer::from_reader(reader)
    }
}

impl JsonExportable for JsonBuffer {
    fn export_json(&self, _: &ExportContext, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_from_reader(&mut self.reader())
    }
}

impl Reflect for JsonBuffer {
    fn type_info() -> TypeInfo {
        TypeInfo::self_describing::<JsonBuffer>()
    }
}
