//! # JSON-RPC dispatcher over reflected services
//!
//! Binds JSON-RPC calls to the methods of a service described with
//! `#[rpc_service]` (or by hand through [`ServiceClassBuilder`]), converting
//! arguments and results with the `rockrpc-json` registries.
//!
//! ## Features
//! - Positional, named and variadic argument binding
//! - Immutable per-type service metadata with reflector/modifier extension points
//! - Structured error taxonomy mapped onto JSON-RPC error objects
//! - Built-in `system.listMethods`, `system.methodHelp` and `system.about`
//! - Synchronous, transport-agnostic processing of in-memory text

extern crate self as rockrpc_server;

pub mod binding;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod request;
pub mod response;
pub mod service;
pub mod system;

// Re-export main types
pub use binding::transpose_variadic;
pub use config::DispatcherConfig;
pub use dispatcher::{JsonRpcDispatcher, ReaderFactory, WriterFactory};
pub use error::{
    DispatchError, ErrorDetail, FailureKind, InvokeError, JsonRpcErrorCode, JsonRpcErrorObject,
    MetadataError, ToJsonRpcError,
};
pub use handler::{Arguments, FnHandler, MethodHandler};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcResponse, ResponseBody};
pub use service::{
    MetadataExtensions, MethodBuilder, MethodDescriptor, ParameterDescriptor, RpcService,
    ServiceClass, ServiceClassBuilder, ServiceClassModifier, ServiceClassReflector,
    ServiceDefinition, metadata_extensions,
};
pub use system::SystemService;

pub use rockrpc_derive::{rpc_method, rpc_service};
pub use rockrpc_json;
pub use rockrpc_json::conversion::AnyBox;

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
    /// Used for failures raised by a method body
    pub const TARGET_METHOD_ERROR: i64 = -32000;
}
