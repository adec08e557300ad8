use std::fmt::Write;

use crate::error::JsonResult;
use crate::number::JsonNumber;
use crate::options::WriterOptions;
use crate::writer::{JsonEmitter, JsonWriter};

/// Emitter producing JSON text, compact or pretty printed
#[derive(Debug)]
pub struct TextEmitter<W> {
    out: W,
    options: WriterOptions,
    /// Item count per open container
    levels: Vec<usize>,
    after_member: bool,
}

impl<W: Write> TextEmitter<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Self {
            out,
            options,
            levels: Vec::new(),
            after_member: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn newline_indent(&mut self, level: usize) -> JsonResult<()> {
        if self.options.pretty_print {
            self.out.write_str(&self.options.newline)?;
            for _ in 0..level {
                self.out.write_str(&self.options.indent)?;
            }
        }
        Ok(())
    }

    fn separate(&mut self) -> JsonResult<()> {
        if self.after_member {
            self.after_member = false;
            return Ok(());
        }
        let depth = self.levels.len();
        if let Some(count) = self.levels.last_mut() {
            let first = *count == 0;
            *count += 1;
            if !first {
                self.out.write_char(',')?;
            }
            self.newline_indent(depth)?;
        }
        Ok(())
    }

    fn open(&mut self, bracket: char) -> JsonResult<()> {
        self.separate()?;
        self.out.write_char(bracket)?;
        self.levels.push(0);
        Ok(())
    }

    fn close(&mut self, bracket: char) -> JsonResult<()> {
        let count = self.levels.pop().unwrap_or_default();
        if count > 0 {
            let depth = self.levels.len();
            self.newline_indent(depth)?;
        }
        self.out.write_char(bracket)?;
        Ok(())
    }

    fn quoted(&mut self, value: &str) -> JsonResult<()> {
        write_quoted(&mut self.out, value)?;
        Ok(())
    }
}

/// Write `value` as a double-quoted JSON string literal
pub fn write_quoted<W: Write>(out: &mut W, value: &str) -> std::fmt::Result {
    out.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            '\u{8}' => out.write_str("\\b")?,
            '\u{c}' => out.write_str("\\f")?,
            c if c < ' ' => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

impl<W: Write> JsonEmitter for TextEmitter<W> {
    fn emit_start_object(&mut self) -> JsonResult<()> {
        self.open('{')
    }

    fn emit_end_object(&mut self) -> JsonResult<()> {
        self.close('}')
    }

    fn emit_member(&mut self, name: &str) -> JsonResult<()> {
        self.separate()?;
        self.quoted(name)?;
        self.out
            .write_str(if self.options.pretty_print { ": " } else { ":" })?;
        self.after_member = true;
        Ok(())
    }

    fn emit_start_array(&mut self) -> JsonResult<()> {
        self.open('[')
    }

    fn emit_end_array(&mut self) -> JsonResult<()> {
        self.close(']')
    }

    fn emit_string(&mut self, value: &str) -> JsonResult<()> {
        self.separate()?;
        self.quoted(value)
    }

    fn emit_number(&mut self, value: &JsonNumber) -> JsonResult<()> {
        self.separate()?;
        self.out.write_str(value.as_str())?;
        Ok(())
    }

    fn emit_boolean(&mut self, value: bool) -> JsonResult<()> {
        self.separate()?;
        self.out.write_str(if value { "true" } else { "false" })?;
        Ok(())
    }

    fn emit_null(&mut self) -> JsonResult<()> {
        self.separate()?;
        self.out.write_str("null")?;
        Ok(())
    }
}

impl<W: Write> JsonWriter<TextEmitter<W>> {
    /// Compact text writer over `out`
    pub fn text(out: W) -> Self {
        JsonWriter::new(TextEmitter::new(out))
    }

    pub fn text_with_options(out: W, options: WriterOptions) -> Self {
        JsonWriter::new(TextEmitter::with_options(out, options))
    }
}

impl JsonWriter<TextEmitter<String>> {
    /// Text written so far
    pub fn as_text(&self) -> &str {
        self.emitter().get_ref()
    }

    pub fn into_string(self) -> String {
        self.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::JsonWrite;

    #[test]
    fn test_compact_object() {
        let mut writer = JsonWriter::text(String::new());
        writer.write_start_object().unwrap();
        writer.write_member("Name").unwrap();
        writer.write_string("John Doe").unwrap();
        writer.write_member("Salary").unwrap();
        writer.write_number(123456789).unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(
            writer.into_string(),
            r#"{"Name":"John Doe","Salary":123456789}"#
        );
    }

    #[test]
    fn test_nested_arrays() {
        let mut writer = JsonWriter::text(String::new());
        writer.write_start_array().unwrap();
        writer.write_start_array().unwrap();
        writer.write_end_array().unwrap();
        writer.write_boolean(false).unwrap();
        writer.write_null().unwrap();
        writer.write_end_array().unwrap();
        assert_eq!(writer.as_text(), "[[],false,null]");
    }

    #[test]
    fn test_escaping() {
        let mut writer = JsonWriter::text(String::new());
        writer.write_string("a\"b\\c\n\u{1}").unwrap();
        assert_eq!(writer.into_string(), r#""a\"b\\c\n\u0001""#);
    }

    #[test]
    fn test_pretty_print() {
        let mut writer = JsonWriter::text_with_options(String::new(), WriterOptions::pretty());
        writer.write_start_object().unwrap();
        writer.write_member("a").unwrap();
        writer.write_start_array().unwrap();
        writer.write_number(1).unwrap();
        writer.write_number(2).unwrap();
        writer.write_end_array().unwrap();
        writer.write_member("b").unwrap();
        writer.write_start_object().unwrap();
        writer.write_end_object().unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(
            writer.into_string(),
            "{\n    \"a\": [\n        1,\n        2\n    ],\n    \"b\": {}\n}"
        );
    }
}
