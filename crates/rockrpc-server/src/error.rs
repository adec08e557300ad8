use std::error::Error as StdError;
use std::fmt;

use rockrpc_json::conversion::short_type_name;
use rockrpc_json::{JsonError, JsonResult, JsonWrite};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error_codes;

/// Message sent in place of a failure's own text for untrusted callers
pub const REDACTED_MESSAGE: &str = "An error occurred while executing the method.";

fn default_error_name() -> String {
    "JSONRPCError".to_string()
}

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError(i64), // -32099 to -32000
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError(_) => "Server error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// One link of a failure's cause chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub name: String,
    pub message: String,
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    #[serde(default = "default_error_name")]
    pub name: String,
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            name: default_error_name(),
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            errors: None,
            data,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, Some(message.into()), None)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            Some(format!("The method '{method}' was not found.")),
            None,
        )
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, None)
    }

    /// Server-defined error; codes outside -32099..=-32000 are clamped to -32000
    pub fn server_error(code: i64, message: &str, data: Option<Value>) -> Self {
        let range = error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END;
        let code = if range.contains(&code) {
            code
        } else {
            error_codes::TARGET_METHOD_ERROR
        };
        Self::new(
            JsonRpcErrorCode::ServerError(code),
            Some(message.to_string()),
            data,
        )
    }

    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Write this error object as the current value of `writer`
    pub fn write(&self, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        writer.write_start_object()?;
        writer.write_member("name")?;
        writer.write_string(&self.name)?;
        writer.write_member("code")?;
        writer.write_i64(self.code)?;
        writer.write_member("message")?;
        writer.write_string(&self.message)?;
        if let Some(errors) = &self.errors {
            writer.write_member("errors")?;
            writer.write_start_array()?;
            for detail in errors {
                writer.write_start_object()?;
                writer.write_member("name")?;
                writer.write_string(&detail.name)?;
                writer.write_member("message")?;
                writer.write_string(&detail.message)?;
                writer.write_end_object()?;
            }
            writer.write_end_array()?;
        }
        if let Some(data) = &self.data {
            writer.write_member("data")?;
            writer.write_value(data)?;
        }
        writer.write_end_object()
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

/// Failure categories of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Parse,
    InvalidRequest,
    NotificationUnsupported,
    MethodNotFound,
    Invocation,
    TargetMethod,
    Internal,
}

/// Raised by a method handler
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Argument count or type mismatch
    #[error("{0}")]
    Invocation(String),

    /// The method body itself failed
    #[error("{source}")]
    Target {
        type_name: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl InvokeError {
    pub fn invocation(message: impl Into<String>) -> Self {
        InvokeError::Invocation(message.into())
    }

    /// Wrap a failure returned by a method body, remembering its type name
    pub fn target<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        InvokeError::Target {
            type_name: short_type_name(std::any::type_name::<E>()),
            source: error.into(),
        }
    }
}

/// Classified outcome of a failed dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Parse error: {0}")]
    Parse(#[source] JsonError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Notifications are not supported.")]
    NotificationUnsupported,

    #[error("The method '{method}' was not found.")]
    MethodNotFound { method: String },

    #[error("{message}")]
    Invocation { method: String, message: String },

    #[error("{source}")]
    TargetMethod {
        method: String,
        type_name: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::Parse(_) => FailureKind::Parse,
            DispatchError::InvalidRequest(_) => FailureKind::InvalidRequest,
            DispatchError::NotificationUnsupported => FailureKind::NotificationUnsupported,
            DispatchError::MethodNotFound { .. } => FailureKind::MethodNotFound,
            DispatchError::Invocation { .. } => FailureKind::Invocation,
            DispatchError::TargetMethod { .. } => FailureKind::TargetMethod,
            DispatchError::Internal(_) => FailureKind::Internal,
        }
    }

    pub fn code(&self) -> JsonRpcErrorCode {
        match self.kind() {
            FailureKind::Parse => JsonRpcErrorCode::ParseError,
            FailureKind::InvalidRequest | FailureKind::NotificationUnsupported => {
                JsonRpcErrorCode::InvalidRequest
            }
            FailureKind::MethodNotFound => JsonRpcErrorCode::MethodNotFound,
            FailureKind::Invocation => JsonRpcErrorCode::InvalidParams,
            FailureKind::TargetMethod => {
                JsonRpcErrorCode::ServerError(error_codes::TARGET_METHOD_ERROR)
            }
            FailureKind::Internal => JsonRpcErrorCode::InternalError,
        }
    }

    pub(crate) fn from_invoke(method: &str, error: InvokeError) -> Self {
        match error {
            InvokeError::Invocation(message) => DispatchError::Invocation {
                method: method.to_string(),
                message,
            },
            InvokeError::Target { type_name, source } => DispatchError::TargetMethod {
                method: method.to_string(),
                type_name,
                source,
            },
        }
    }

    /// Build the wire error object; untrusted callers see no failure details
    /// of a method body
    pub fn to_error_object_for(&self, local_execution: bool) -> JsonRpcErrorObject {
        let mut object = JsonRpcErrorObject::new(self.code(), Some(self.to_string()), None);
        if let DispatchError::TargetMethod {
            type_name, source, ..
        } = self
        {
            if local_execution {
                object.errors = Some(cause_chain(type_name, source.as_ref()));
            } else {
                object.message = REDACTED_MESSAGE.to_string();
            }
        }
        object
    }
}

fn cause_chain(type_name: &str, error: &(dyn StdError + 'static)) -> Vec<ErrorDetail> {
    let mut chain = vec![ErrorDetail {
        name: type_name.to_string(),
        message: error.to_string(),
    }];
    let mut current = error.source();
    while let Some(cause) = current {
        chain.push(ErrorDetail {
            name: "Error".to_string(),
            message: cause.to_string(),
        });
        current = cause.source();
    }
    chain
}

/// Service metadata validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("The service '{service}' already has a method named '{method}'.")]
    DuplicateMethod { service: String, method: String },

    #[error("The method '{service}.{method}' must have a non-empty name.")]
    EmptyMethodName { service: String, method: String },

    #[error("Only the last parameter of '{method}' can be variadic; '{parameter}' is not last.")]
    VariadicNotLast { method: String, parameter: String },

    #[error("The variadic parameter '{parameter}' of '{method}' must be a sequence type.")]
    VariadicNotSequence { method: String, parameter: String },

    #[error("The method '{method}' has no invocation handler.")]
    MissingHandler { method: String },
}

/// Convert a domain error into a JSON-RPC error object
pub trait ToJsonRpcError {
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

impl ToJsonRpcError for DispatchError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        self.to_error_object_for(true)
    }
}

impl ToJsonRpcError for JsonError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        if self.is_parse() {
            JsonRpcErrorObject::parse_error(self.to_string())
        } else {
            JsonRpcErrorObject::internal_error(Some(self.to_string()))
        }
    }
}

impl ToJsonRpcError for MetadataError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject::internal_error(Some(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Debug, Error)]
    #[error("cannot save report")]
    struct SaveFailed(#[source] DiskFull);

    #[test]
    fn test_error_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(JsonRpcErrorCode::ServerError(-32001).code(), -32001);
        assert_eq!(
            JsonRpcErrorCode::InvalidParams.code(),
            error_codes::INVALID_PARAMS
        );
        assert_eq!(
            JsonRpcErrorCode::InternalError.code(),
            error_codes::INTERNAL_ERROR
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = JsonRpcErrorObject::method_not_found("test");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("The method 'test' was not found."));
        assert!(json.starts_with(r#"{"name":"JSONRPCError","code":-32601"#));
        assert!(!json.contains("errors"));
    }

    #[test]
    fn test_server_error_code_clamped() {
        assert_eq!(JsonRpcErrorObject::server_error(-1, "x", None).code, -32000);
        assert_eq!(
            JsonRpcErrorObject::server_error(-32050, "x", None).code,
            -32050
        );
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            DispatchError::NotificationUnsupported.kind(),
            FailureKind::NotificationUnsupported
        );
        assert_eq!(
            DispatchError::NotificationUnsupported.code(),
            JsonRpcErrorCode::InvalidRequest
        );
        assert_eq!(
            DispatchError::NotificationUnsupported.to_string(),
            "Notifications are not supported."
        );
        let miss = DispatchError::MethodNotFound {
            method: "nope".into(),
        };
        assert_eq!(miss.code().code(), -32601);
    }

    #[test]
    fn test_target_error_keeps_cause_chain() {
        let error = DispatchError::from_invoke("save", InvokeError::target(SaveFailed(DiskFull)));
        assert_eq!(error.kind(), FailureKind::TargetMethod);
        assert!(StdError::source(&error).is_some());

        let object = error.to_error_object_for(true);
        assert_eq!(object.message, "cannot save report");
        let errors = object.errors.unwrap();
        assert_eq!(errors[0].name, "SaveFailed");
        assert_eq!(errors[1].message, "disk full");
    }

    #[test]
    fn test_target_error_redacted() {
        let error = DispatchError::from_invoke("save", InvokeError::target("secret path /etc"));
        let object = error.to_error_object_for(false);
        assert_eq!(object.message, REDACTED_MESSAGE);
        assert!(object.errors.is_none());
    }

    #[test]
    fn test_invocation_error() {
        let error = DispatchError::from_invoke("add", InvokeError::invocation("Missing argument 'a'."));
        assert_eq!(error.kind(), FailureKind::Invocation);
        assert_eq!(error.to_error_object().code, -32602);
        assert_eq!(error.to_error_object().message, "Missing argument 'a'.");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = JsonError::Parse {
            message: "Unterminated string.".into(),
            line: 1,
            column: 4,
        };
        assert_eq!(parse.to_error_object().code, -32700);
        assert_eq!(
            JsonError::structural("bad").to_error_object().code,
            -32603
        );
    }
}
