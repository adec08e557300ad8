//! Commonly used items

pub use crate::buffer::JsonBuffer;
pub use crate::conversion::{
    ExportContext, Exporter, ImportContext, Importer, JsonExportable, JsonImportable, Reflect,
    TypeInfo,
};
pub use crate::error::{JsonError, JsonResult};
pub use crate::reader::JsonReader;
pub use crate::text_reader::JsonTextReader;
pub use crate::token::TokenClass;
pub use crate::writer::{JsonWrite, JsonWriter};
pub use crate::{JsonComponent, JsonEnum};
