use rockrpc_json::{JsonBuffer, JsonError, JsonReader, JsonResult, JsonWrite, JsonWriter, TokenClass};
use serde_json::Value;

use crate::error::JsonRpcErrorObject;

/// Outcome carried by a response: exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Result(JsonBuffer),
    Error(JsonRpcErrorObject),
}

/// A JSON-RPC response
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    /// Echo of the request's `jsonrpc` member
    pub version: Option<String>,
    pub id: JsonBuffer,
    pub body: ResponseBody,
}

impl JsonRpcResponse {
    pub fn success(id: Option<JsonBuffer>, result: JsonBuffer) -> Self {
        Self {
            version: None,
            id: id.unwrap_or_else(JsonBuffer::null),
            body: ResponseBody::Result(result),
        }
    }

    pub fn error(id: Option<JsonBuffer>, error: JsonRpcErrorObject) -> Self {
        Self {
            version: None,
            id: id.unwrap_or_else(JsonBuffer::null),
            body: ResponseBody::Error(error),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, ResponseBody::Error(_))
    }

    pub fn result(&self) -> Option<&JsonBuffer> {
        match &self.body {
            ResponseBody::Result(result) => Some(result),
            ResponseBody::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcErrorObject> {
        match &self.body {
            ResponseBody::Result(_) => None,
            ResponseBody::Error(error) => Some(error),
        }
    }

    /// Write `{"id": .., "result": ..}` or `{"id": .., "error": ..}`
    pub fn write(&self, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_start_object()?;
        if let Some(version) = &self.version {
            writer.write_member("jsonrpc")?;
            writer.write_string(version)?;
        }
        writer.write_member("id")?;
        writer.write_from_reader(&mut self.id.reader())?;
        match &self.body {
            ResponseBody::Result(result) => {
                writer.write_member("result")?;
                writer.write_from_reader(&mut result.reader())?;
            }
            ResponseBody::Error(error) => {
                writer.write_member("error")?;
                error.write(writer)?;
            }
        }
        writer.write_end_object()?;
        writer.flush()
    }

    pub fn to_text(&self) -> JsonResult<String> {
        let mut writer = JsonWriter::text(String::new());
        self.write(&mut writer)?;
        Ok(writer.into_string())
    }

    /// Read a response object, as a client would
    pub fn read(reader: &mut dyn JsonReader) -> JsonResult<Self> {
        reader.read_token(TokenClass::StartObject)?;
        let mut version = None;
        let mut id = None;
        let mut result = None;
        let mut error = None;
        while reader.token_class() != TokenClass::EndObject {
            match reader.read_member()?.as_str() {
                "jsonrpc" => version = Some(reader.read_string()?),
                "id" => id = Some(JsonBuffer::from_reader(reader)?),
                "result" => result = Some(JsonBuffer::from_reader(reader)?),
                "error" => {
                    let value = reader.read_value()?;
                    if !value.is_null() {
                        error = Some(serde_json::from_value::<JsonRpcErrorObject>(value)?);
                    }
                }
                _ => reader.skip()?,
            }
        }
        reader.read()?;

        let body = match (error, result) {
            (Some(error), _) => ResponseBody::Error(error),
            (None, Some(result)) => ResponseBody::Result(result),
            (None, None) => {
                return Err(JsonError::structural(
                    "A response must have either a result or an error member.",
                ));
            }
        };
        Ok(Self {
            version,
            id: id.unwrap_or_else(JsonBuffer::null),
            body,
        })
    }

    /// Result materialized as a `serde_json::Value`
    pub fn result_value(&self) -> JsonResult<Option<Value>> {
        self.result().map(JsonBuffer::to_value).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockrpc_json::JsonTextReader;
    use serde_json::json;

    fn id(value: Value) -> Option<JsonBuffer> {
        Some(JsonBuffer::from_value(&value).unwrap())
    }

    #[test]
    fn test_success_response() {
        let response = JsonRpcResponse::success(id(json!(1)), JsonBuffer::from_value(&json!(5)).unwrap());
        assert_eq!(response.to_text().unwrap(), r#"{"id":1,"result":5}"#);
    }

    #[test]
    fn test_version_echoed_first() {
        let response = JsonRpcResponse::success(id(json!("a")), JsonBuffer::null())
            .with_version(Some("2.0".into()));
        assert_eq!(
            response.to_text().unwrap(),
            r#"{"jsonrpc":"2.0","id":"a","result":null}"#
        );
    }

    #[test]
    fn test_error_response_has_no_result() {
        let response =
            JsonRpcResponse::error(None, JsonRpcErrorObject::method_not_found("Nope"));
        let text = response.to_text().unwrap();
        assert!(text.starts_with(r#"{"id":null,"error":{"name":"JSONRPCError","code":-32601"#));
        assert!(!text.contains("result"));
    }

    #[test]
    fn test_read_response() {
        let mut reader = JsonTextReader::new(
            r#"{"id":3,"error":{"code":-32601,"message":"gone"},"extra":1}"#,
        );
        let response = JsonRpcResponse::read(&mut reader).unwrap();
        let error = response.error_object().unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.name, "JSONRPCError");

        let mut reader = JsonTextReader::new(r#"{"result":[1,2],"error":null,"id":3}"#);
        let response = JsonRpcResponse::read(&mut reader).unwrap();
        assert_eq!(response.result_value().unwrap(), Some(json!([1, 2])));

        let mut reader = JsonTextReader::new(r#"{"id":3}"#);
        assert!(JsonRpcResponse::read(&mut reader).unwrap_err().is_structural());
    }
}
