use rockrpc_json::{
    JsonBuffer, JsonError, JsonReader, JsonResult, JsonWrite, JsonWriter, TokenClass,
};
use serde_json::Value;

use crate::error::DispatchError;

/// Parameters of a request, buffered until the method is known
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    Array(Vec<JsonBuffer>),
    Object(Vec<(String, JsonBuffer)>),
}

impl RequestParams {
    /// Split a recorded `params` value; `null` means no params
    pub fn from_buffer(buffer: JsonBuffer) -> Result<Option<Self>, DispatchError> {
        let invalid = |err: JsonError| DispatchError::InvalidRequest(err.to_string());
        if buffer.is_null() {
            Ok(None)
        } else if buffer.is_array() {
            Ok(Some(RequestParams::Array(buffer.elements().map_err(invalid)?)))
        } else if buffer.is_object() {
            Ok(Some(RequestParams::Object(buffer.members().map_err(invalid)?)))
        } else {
            Err(DispatchError::InvalidRequest(
                "The params member must be an array or an object.".to_string(),
            ))
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> JsonResult<Self> {
        values
            .into_iter()
            .map(|value| JsonBuffer::from_value(&value))
            .collect::<JsonResult<_>>()
            .map(RequestParams::Array)
    }

    pub fn from_named(members: impl IntoIterator<Item = (String, Value)>) -> JsonResult<Self> {
        members
            .into_iter()
            .map(|(name, value)| Ok((name, JsonBuffer::from_value(&value)?)))
            .collect::<JsonResult<_>>()
            .map(RequestParams::Object)
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Array(items) => items.len(),
            RequestParams::Object(members) => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        match self {
            RequestParams::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    writer.write_from_reader(&mut item.reader())?;
                }
                writer.write_end_array()
            }
            RequestParams::Object(members) => {
                writer.write_start_object()?;
                for (name, value) in members {
                    writer.write_member(name)?;
                    writer.write_from_reader(&mut value.reader())?;
                }
                writer.write_end_object()
            }
        }
    }
}

/// A JSON-RPC call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonRpcRequest {
    /// Value of the `jsonrpc` member when present
    pub version: Option<String>,
    pub id: Option<JsonBuffer>,
    pub method: Option<String>,
    pub params: Option<RequestParams>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>) -> JsonResult<Self> {
        Ok(Self {
            version: None,
            id: Some(JsonBuffer::from_value(&id.into())?),
            method: Some(method.into()),
            params: None,
        })
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// An absent or null `id` marks a notification
    pub fn is_notification(&self) -> bool {
        self.id.as_ref().is_none_or(JsonBuffer::is_null)
    }

    /// Read one request object; members may come in any order and unknown
    /// members are skipped
    pub fn read(reader: &mut dyn JsonReader) -> Result<Self, DispatchError> {
        if !reader.move_to_content().map_err(classify)? {
            return Err(DispatchError::InvalidRequest(
                "The request is empty.".to_string(),
            ));
        }
        if reader.token_class() != TokenClass::StartObject {
            return Err(DispatchError::InvalidRequest(format!(
                "A request must be a JSON object, not {}.",
                reader.token_class()
            )));
        }
        reader.read().map_err(classify)?;

        let mut request = Self::default();
        let mut params = None;
        while reader.token_class() != TokenClass::EndObject {
            let name = reader.read_member().map_err(classify)?;
            match name.as_str() {
                "id" => request.id = Some(JsonBuffer::from_reader(reader).map_err(classify)?),
                "method" => request.method = Some(read_text(reader, "method")?),
                "params" => params = Some(JsonBuffer::from_reader(reader).map_err(classify)?),
                "jsonrpc" => request.version = Some(read_text(reader, "jsonrpc")?),
                _ => reader.skip().map_err(classify)?,
            }
        }
        reader.read().map_err(classify)?;

        if let Some(buffer) = params {
            request.params = RequestParams::from_buffer(buffer)?;
        }
        Ok(request)
    }

    /// Write the request as a JSON object
    pub fn write(&self, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_start_object()?;
        if let Some(version) = &self.version {
            writer.write_member("jsonrpc")?;
            writer.write_string(version)?;
        }
        if let Some(id) = &self.id {
            writer.write_member("id")?;
            writer.write_from_reader(&mut id.reader())?;
        }
        if let Some(method) = &self.method {
            writer.write_member("method")?;
            writer.write_string(method)?;
        }
        if let Some(params) = &self.params {
            writer.write_member("params")?;
            params.write(writer)?;
        }
        writer.write_end_object()
    }

    pub fn to_text(&self) -> JsonResult<String> {
        let mut writer = JsonWriter::text(String::new());
        self.write(&mut writer)?;
        Ok(writer.into_string())
    }
}

fn classify(err: JsonError) -> DispatchError {
    if err.is_parse() {
        DispatchError::Parse(err)
    } else {
        DispatchError::InvalidRequest(err.to_string())
    }
}

fn read_text(reader: &mut dyn JsonReader, member: &str) -> Result<String, DispatchError> {
    if reader.token_class() != TokenClass::String {
        return Err(DispatchError::InvalidRequest(format!(
            "The {member} member must be a string."
        )));
    }
    reader.read_string().map_err(classify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockrpc_json::JsonTextReader;
    use serde_json::json;

    fn read(text: &str) -> Result<JsonRpcRequest, DispatchError> {
        JsonRpcRequest::read(&mut JsonTextReader::new(text))
    }

    #[test]
    fn test_read_members_in_any_order() {
        let request =
            read(r#"{"params":[2,3],"extra":{"x":[1]},"method":"Sum","id":1,"jsonrpc":"2.0"}"#)
                .unwrap();
        assert_eq!(request.method.as_deref(), Some("Sum"));
        assert_eq!(request.version.as_deref(), Some("2.0"));
        assert_eq!(request.id.as_ref().unwrap().to_value().unwrap(), json!(1));
        match request.params.unwrap() {
            RequestParams::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].to_value().unwrap(), json!(3));
            }
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn test_named_params() {
        let request = read(r#"{"id":"a","method":"m","params":{"x":1,"y":[true]}}"#).unwrap();
        let Some(RequestParams::Object(members)) = request.params else {
            panic!("expected named params");
        };
        assert_eq!(members[0].0, "x");
        assert_eq!(members[1].1.to_value().unwrap(), json!([true]));
    }

    #[test]
    fn test_null_or_missing_params() {
        assert!(read(r#"{"id":1,"method":"m","params":null}"#).unwrap().params.is_none());
        assert!(read(r#"{"id":1,"method":"m"}"#).unwrap().params.is_none());
    }

    #[test]
    fn test_notification_detection() {
        assert!(read(r#"{"method":"m"}"#).unwrap().is_notification());
        assert!(read(r#"{"id":null,"method":"m"}"#).unwrap().is_notification());
        assert!(!read(r#"{"id":0,"method":"m"}"#).unwrap().is_notification());
    }

    #[test]
    fn test_invalid_requests() {
        assert!(matches!(read("[1,2]"), Err(DispatchError::InvalidRequest(_))));
        assert!(matches!(read(""), Err(DispatchError::InvalidRequest(_))));
        assert!(matches!(
            read(r#"{"id":1,"method":42}"#),
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(matches!(
            read(r#"{"id":1,"method":"m","params":5}"#),
            Err(DispatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            read(r#"{"id":1,"method":"m"#),
            Err(DispatchError::Parse(_))
        ));
    }

    #[test]
    fn test_write_request() {
        let request = JsonRpcRequest::new(7, "Sum")
            .unwrap()
            .with_version("2.0")
            .with_params(RequestParams::from_values([json!(2), json!(3)]).unwrap());
        assert_eq!(
            request.to_text().unwrap(),
            r#"{"jsonrpc":"2.0","id":7,"method":"Sum","params":[2,3]}"#
        );

        let named = JsonRpcRequest::new("x", "greet")
            .unwrap()
            .with_params(RequestParams::from_named([("name".to_string(), json!("Ada"))]).unwrap());
        assert_eq!(
            named.to_text().unwrap(),
            r#"{"id":"x","method":"greet","params":{"name":"Ada"}}"#
        );
        assert_eq!(read(&named.to_text().unwrap()).unwrap(), named);
    }
}
