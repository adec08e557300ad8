//! Date/time conversion
//!
//! Imports accept an ISO-8601 string or a number of seconds since the Unix
//! epoch. Exports write ISO-8601 text unless [`UnixTimeExporter`] is
//! registered in its place.

use std::any::Any;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::token::TokenClass;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};
use super::reflect::{AnyBox, downcast_ref};
use super::{Exporter, Importer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

fn read_date_time(reader: &mut dyn JsonReader) -> JsonResult<DateTime<Utc>> {
    match reader.token_class() {
        TokenClass::String => {
            let text = reader.read_string()?;
            parse_text(&text).ok_or_else(|| {
                JsonError::import(format!("The text '{text}' is not a valid date/time."))
            })
        }
        TokenClass::Number => {
            let number = reader.read_number()?;
            from_epoch_seconds(number.to_f64()).ok_or_else(|| {
                JsonError::import(format!("The value {number} is out of range for a date/time."))
            })
        }
        class => Err(JsonError::import(format!(
            "Found {class} where a date/time was expected."
        ))),
    }
}

/// `DateTime<Utc>` as RFC 3339 text
pub struct DateTimeConverter;

impl Importer for DateTimeConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        Ok(Box::new(read_date_time(reader)?))
    }
}

impl Exporter for DateTimeConverter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let value = downcast_ref::<DateTime<Utc>>(value)?;
        writer.write_string(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// `NaiveDateTime`, read and written as if in UTC
pub struct NaiveDateTimeConverter;

impl Importer for NaiveDateTimeConverter {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        Ok(Box::new(read_date_time(reader)?.naive_utc()))
    }
}

impl Exporter for NaiveDateTimeConverter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let value = downcast_ref::<NaiveDateTime>(value)?;
        writer.write_string(&value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }
}

/// Writes either date/time type as whole seconds since the Unix epoch
pub struct UnixTimeExporter;

impl Exporter for UnixTimeExporter {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let seconds = if let Some(value) = value.downcast_ref::<DateTime<Utc>>() {
            value.timestamp()
        } else {
            downcast_ref::<NaiveDateTime>(value)?.and_utc().timestamp()
        };
        writer.write_i64(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Reflect;
    use chrono::TimeZone;

    #[test]
    fn test_import_iso_and_epoch() {
        let context = ImportContext::stock();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let parsed: DateTime<Utc> = context.import_str("'2024-03-01T12:30:00Z'").unwrap();
        assert_eq!(parsed, expected);
        let parsed: DateTime<Utc> = context.import_str("'2024-03-01T14:30:00+02:00'").unwrap();
        assert_eq!(parsed, expected);
        let parsed: DateTime<Utc> = context.import_str(&expected.timestamp().to_string()).unwrap();
        assert_eq!(parsed, expected);
        let naive: NaiveDateTime = context.import_str("'2024-03-01T12:30:00'").unwrap();
        assert_eq!(naive, expected.naive_utc());
        assert!(context.import_str::<DateTime<Utc>>("'yesterday'").is_err());
    }

    #[test]
    fn test_export_iso_and_unix() {
        let context = ExportContext::stock();
        let value = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            context.export_to_string(&value).unwrap(),
            "\"2024-03-01T12:30:00Z\""
        );
        assert_eq!(
            context.export_to_string(&value.naive_utc()).unwrap(),
            "\"2024-03-01T12:30:00\""
        );

        context.register_for(&DateTime::<Utc>::type_info(), std::sync::Arc::new(UnixTimeExporter));
        assert_eq!(context.export_to_string(&value).unwrap(), "1709296200");
    }
}
