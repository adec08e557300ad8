//! Common imports for services and hosts

pub use crate::config::DispatcherConfig;
pub use crate::dispatcher::JsonRpcDispatcher;
pub use crate::error::{DispatchError, InvokeError, JsonRpcErrorObject};
pub use crate::service::{RpcService, ServiceClass};
pub use crate::{rpc_method, rpc_service};
pub use rockrpc_json::prelude::*;
