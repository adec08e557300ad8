//! JSON-RPC dispatcher
//!
//! One call runs parse request, resolve method, bind arguments, invoke and
//! build response in that order. Any classified failure short-circuits to the
//! response with an error object. A panic escaping the method body is logged
//! and resumed; no response is built for it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rockrpc_json::conversion::AnyBox;
use rockrpc_json::{
    ExportContext, ImportContext, JsonBuffer, JsonReader, JsonResult, JsonTextReader, JsonWrite,
    JsonWriter,
};
use tracing::{debug, error, warn};

use crate::binding::{bind_arguments, import_arguments};
use crate::config::DispatcherConfig;
use crate::error::{DispatchError, FailureKind};
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcResponse;
use crate::service::{MethodDescriptor, RpcService, ServiceClass};
use crate::system::{SystemService, system_class};

/// Builds the reader a request text is parsed with
pub type ReaderFactory = Arc<dyn Fn(&str) -> Box<dyn JsonReader> + Send + Sync>;

/// Builds the writer a response is written with
pub type WriterFactory =
    Arc<dyn for<'a> Fn(&'a mut String) -> Box<dyn JsonWrite + 'a> + Send + Sync>;

/// Dispatches JSON-RPC calls to one service instance
pub struct JsonRpcDispatcher {
    service: Arc<dyn RpcService>,
    config: DispatcherConfig,
    import: ImportContext,
    export: ExportContext,
    reader_factory: Option<ReaderFactory>,
    writer_factory: Option<WriterFactory>,
}

impl JsonRpcDispatcher {
    pub fn new(service: Arc<dyn RpcService>) -> Self {
        Self {
            service,
            config: DispatcherConfig::default(),
            import: ImportContext::global().clone(),
            export: ExportContext::global().clone(),
            reader_factory: None,
            writer_factory: None,
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_import_context(mut self, context: ImportContext) -> Self {
        self.import = context;
        self
    }

    pub fn with_export_context(mut self, context: ExportContext) -> Self {
        self.export = context;
        self
    }

    /// Substitute the text reader used by [`process_text`](Self::process_text)
    pub fn with_reader_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Box<dyn JsonReader> + Send + Sync + 'static,
    {
        self.reader_factory = Some(Arc::new(factory));
        self
    }

    /// Substitute the text writer used by [`process_text`](Self::process_text)
    pub fn with_writer_factory<F>(mut self, factory: F) -> Self
    where
        F: for<'a> Fn(&'a mut String) -> Box<dyn JsonWrite + 'a> + Send + Sync + 'static,
    {
        self.writer_factory = Some(Arc::new(factory));
        self
    }

    pub fn service(&self) -> &Arc<dyn RpcService> {
        &self.service
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn import_context(&self) -> &ImportContext {
        &self.import
    }

    pub fn export_context(&self) -> &ExportContext {
        &self.export
    }

    /// Read one request from `reader` and write its response to `writer`
    ///
    /// Errors are only returned when the response itself cannot be written.
    pub fn process(&self, reader: &mut dyn JsonReader, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        self.handle(reader).write(writer)
    }

    /// Run one request text through caller-supplied reader and writer
    pub fn process_with<R, W>(&self, text: &str, make_reader: R, make_writer: W) -> JsonResult<String>
    where
        R: FnOnce(&str) -> Box<dyn JsonReader>,
        W: for<'a> FnOnce(&'a mut String) -> Box<dyn JsonWrite + 'a>,
    {
        let mut reader = make_reader(text);
        let mut out = String::new();
        {
            let mut writer = make_writer(&mut out);
            self.process(&mut *reader, &mut *writer)?;
        }
        Ok(out)
    }

    /// Answer a request text with a response text
    pub fn process_text(&self, text: &str) -> JsonResult<String> {
        let reader_options = self.config.reader.clone();
        let writer_options = self.config.writer.clone();
        match (&self.reader_factory, &self.writer_factory) {
            (Some(reader), Some(writer)) => self.process_with(text, |t| reader(t), |o| writer(o)),
            (Some(reader), None) => self.process_with(
                text,
                |t| reader(t),
                |o| Box::new(JsonWriter::text_with_options(o, writer_options)),
            ),
            (None, Some(writer)) => self.process_with(
                text,
                |t| Box::new(JsonTextReader::with_options(t, reader_options)),
                |o| writer(o),
            ),
            (None, None) => self.process_with(
                text,
                |t| Box::new(JsonTextReader::with_options(t, reader_options)),
                |o| Box::new(JsonWriter::text_with_options(o, writer_options)),
            ),
        }
    }

    /// Run the call to completion, turning classified failures into an
    /// error response
    pub fn handle(&self, reader: &mut dyn JsonReader) -> JsonRpcResponse {
        let request = match JsonRpcRequest::read(reader) {
            Ok(request) => request,
            Err(err) => return self.failure(None, None, err),
        };
        let id = request.id.clone();
        let version = request.version.clone();
        match self.dispatch(request) {
            Ok(result) => JsonRpcResponse::success(id, result).with_version(version),
            Err(err) => self.failure(id, version, err),
        }
    }

    fn failure(
        &self,
        id: Option<JsonBuffer>,
        version: Option<String>,
        err: DispatchError,
    ) -> JsonRpcResponse {
        match err.kind() {
            FailureKind::MethodNotFound => debug!(error = %err, "Method resolution failed"),
            _ => warn!(kind = ?err.kind(), error = %err, "JSON-RPC call failed"),
        }
        let object = err.to_error_object_for(self.config.local_execution);
        JsonRpcResponse::error(id, object).with_version(version)
    }

    fn dispatch(&self, request: JsonRpcRequest) -> Result<JsonBuffer, DispatchError> {
        if request.is_notification() {
            return Err(DispatchError::NotificationUnsupported);
        }
        let name = request
            .method
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                DispatchError::InvalidRequest("The request does not name a method.".to_string())
            })?;

        let class = self
            .service
            .service_class()
            .map_err(|err| DispatchError::Internal(err.to_string()))?;
        let (method, system) = match class.find_method(&name) {
            Some(method) => (Arc::clone(method), None),
            None => self.find_system_method(&name, &class)?,
        };

        let bound = bind_arguments(request.params, &method)?;
        let args = import_arguments(bound, &method, &self.import)?;

        let target: &dyn Any = match &system {
            Some(system) => system,
            None => self.service.as_any(),
        };
        let result = self.invoke(&method, target, args)?;

        let mut writer = JsonWriter::buffer();
        self.export
            .export_dyn(method.result_type(), &*result, &mut writer)
            .map_err(|err| DispatchError::Internal(err.to_string()))?;
        Ok(writer.into_buffer())
    }

    fn find_system_method(
        &self,
        name: &str,
        class: &Arc<ServiceClass>,
    ) -> Result<(Arc<MethodDescriptor>, Option<SystemService>), DispatchError> {
        let not_found = || DispatchError::MethodNotFound {
            method: name.to_string(),
        };
        if !self.config.expose_system_methods {
            return Err(not_found());
        }
        let system = system_class().map_err(|err| DispatchError::Internal(err.to_string()))?;
        let method = system.find_method(name).ok_or_else(not_found)?;
        Ok((Arc::clone(method), Some(SystemService::new(Arc::clone(class)))))
    }

    /// Call the method body; panics are logged and resumed
    fn invoke(
        &self,
        method: &MethodDescriptor,
        target: &dyn Any,
        args: Vec<AnyBox>,
    ) -> Result<AnyBox, DispatchError> {
        match panic::catch_unwind(AssertUnwindSafe(|| method.invoke(target, args))) {
            Ok(outcome) => outcome.map_err(|err| DispatchError::from_invoke(method.name(), err)),
            Err(payload) => {
                error!(
                    method = method.name(),
                    panic = panic_message(payload.as_ref()),
                    "Unclassified failure in RPC method"
                );
                panic::resume_unwind(payload)
            }
        }
    }
}

impl fmt::Debug for JsonRpcDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcDispatcher")
            .field("config", &self.config)
            .field("reader_factory", &self.reader_factory.is_some())
            .field("writer_factory", &self.writer_factory.is_some())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_service;
    use std::panic::catch_unwind;
    use tracing_test::traced_test;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded for {0}")]
    struct QuotaExceeded(String);

    struct Probe;

    #[rpc_service]
    impl Probe {
        #[rpc_method]
        fn echo(&self, value: String) -> String {
            value
        }

        #[rpc_method]
        fn reserve(&self, user: String) -> Result<u32, QuotaExceeded> {
            Err(QuotaExceeded(user))
        }

        #[rpc_method]
        fn crash(&self) -> u32 {
            panic!("sensor crashed")
        }
    }

    fn dispatcher() -> JsonRpcDispatcher {
        JsonRpcDispatcher::new(Arc::new(Probe))
    }

    #[test]
    fn test_echo() {
        let out = dispatcher()
            .process_text(r#"{"id":1,"method":"echo","params":["hi"]}"#)
            .unwrap();
        assert_eq!(out, r#"{"id":1,"result":"hi"}"#);
    }

    #[test]
    #[traced_test]
    fn test_target_failure_is_logged_and_reported() {
        let out = dispatcher()
            .process_text(r#"{"id":2,"method":"reserve","params":["ada"]}"#)
            .unwrap();
        assert_eq!(
            out,
            concat!(
                r#"{"id":2,"error":{"name":"JSONRPCError","code":-32000,"#,
                r#""message":"quota exceeded for ada","#,
                r#""errors":[{"name":"QuotaExceeded","message":"quota exceeded for ada"}]}}"#
            )
        );
        assert!(logs_contain("JSON-RPC call failed"));
    }

    #[test]
    #[traced_test]
    fn test_method_miss_is_logged_at_debug() {
        let out = dispatcher()
            .process_text(r#"{"id":3,"method":"nothing"}"#)
            .unwrap();
        assert!(out.contains(r#""code":-32601"#));
        assert!(logs_contain("Method resolution failed"));
    }

    #[test]
    #[traced_test]
    fn test_panic_is_logged_and_resumed() {
        let dispatcher = dispatcher();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            dispatcher.process_text(r#"{"id":4,"method":"crash"}"#)
        }));
        assert!(outcome.is_err());
        assert!(logs_contain("Unclassified failure in RPC method"));
        assert!(logs_contain("sensor crashed"));
    }

    #[test]
    fn test_handle_returns_response_value() {
        let mut reader = JsonTextReader::new(r#"{"id":"x","method":"echo","params":{"value":"v"}}"#);
        let response = dispatcher().handle(&mut reader);
        assert!(!response.is_error());
        assert_eq!(
            response.result_value().unwrap(),
            Some(serde_json::json!("v"))
        );
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42), "<non-string panic payload>");
    }
}
