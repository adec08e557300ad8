use std::any::Any;

use serde_json::Value;

use crate::error::JsonResult;
use crate::reader::JsonReader;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, downcast_ref};
use super::{Exporter, Importer};

/// Any JSON value as a `serde_json::Value`
pub struct AnyValueConverter;

impl Importer for AnyValueConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        Ok(Box::new(reader.read_value()?))
    }
}

impl Exporter for AnyValueConverter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_value(downcast_ref::<Value>(value)?)
    }
}
