//! Struct conversion through exposed properties
//!
//! Export writes one member per property whose value is not logically null;
//! a component without properties is written as its text representation.
//! Import requires an object, matches members to properties by exact name
//! and then case-insensitively, and skips members that match nothing.

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use crate::error::JsonResult;
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, ComponentInfo, PropertyInfo, TypeInfo, TypeKind};
use super::registry::ConverterFamily;
use super::{Exporter, Importer};

pub struct ComponentFamily;

pub struct ComponentImporter {
    info: &'static ComponentInfo,
}

impl ComponentImporter {
    fn property(&self, name: &str) -> Option<&'static PropertyInfo> {
        let properties = self.info.properties;
        properties
            .iter()
            .find(|property| property.name == name)
            .or_else(|| {
                properties
                    .iter()
                    .find(|property| property.name.eq_ignore_ascii_case(name))
            })
    }
}

impl Importer for ComponentImporter {
    fn import(&self, context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        reader.read_token(TokenClass::StartObject)?;
        let mut instance = (self.info.construct)();
        while reader.token_class() != TokenClass::EndObject {
            let name = reader.read_member()?;
            match self.property(&name) {
                Some(property) => {
                    let value = context.import_type(&(property.type_info)(), reader)?;
                    (property.set)(instance.as_mut(), value)?;
                }
                None => {
                    trace!(component = self.info.name, member = %name, "Skipping unmatched member");
                    reader.skip()?;
                }
            }
        }
        reader.read()?;
        Ok(instance)
    }
}

pub struct ComponentExporter {
    info: &'static ComponentInfo,
}

impl Exporter for ComponentExporter {
    fn export(
        &self,
        context: &ExportContext,
        value: &dyn Any,
        writer: &mut dyn JsonWrite,
    ) -> JsonResult<()> {
        if self.info.properties.is_empty() {
            return writer.write_string(&(self.info.to_text)(value));
        }
        writer.write_start_object()?;
        for property in self.info.properties {
            let Some(property_value) = (property.get)(value) else {
                continue;
            };
            let type_info = (property.type_info)();
            let property_value = property_value.as_any();
            if type_info.is_logical_null(property_value) {
                continue;
            }
            writer.write_member(property.name)?;
            context.export_dyn(&type_info, property_value, writer)?;
        }
        writer.write_end_object()
    }
}

fn accepts(info: &TypeInfo) -> Option<&'static ComponentInfo> {
    match info.kind() {
        TypeKind::Component(component) => Some(*component),
        _ => None,
    }
}

impl ConverterFamily<dyn Importer> for ComponentFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Importer>> {
        accepts(info).map(|info| Arc::new(ComponentImporter { info }) as Arc<dyn Importer>)
    }
}

impl ConverterFamily<dyn Exporter> for ComponentFamily {
    fn find(&self, info: &TypeInfo) -> Option<Arc<dyn Exporter>> {
        accepts(info).map(|info| Arc::new(ComponentExporter { info }) as Arc<dyn Exporter>)
    }
}
