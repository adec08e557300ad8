//! Binding request parameters to method parameters

use rockrpc_json::conversion::AnyBox;
use rockrpc_json::{ImportContext, JsonBuffer};
use tracing::trace;

use crate::error::DispatchError;
use crate::request::RequestParams;
use crate::service::MethodDescriptor;

/// Fold surplus positional arguments into the final variadic parameter
///
/// Arguments from the fixed-parameter count onward become one array. A
/// trailing region that is already a single array is kept as is, so applying
/// this twice gives the same result as applying it once.
pub fn transpose_variadic(mut args: Vec<JsonBuffer>, method: &MethodDescriptor) -> Vec<JsonBuffer> {
    if !method.is_variadic() {
        return args;
    }
    let fixed = method.fixed_parameter_count();
    if args.len() < fixed {
        return args;
    }
    if args.len() == fixed + 1 && args[fixed].is_array() {
        return args;
    }
    let rest = args.split_off(fixed);
    args.push(JsonBuffer::array(rest));
    args
}

/// Match request params to parameter positions; `None` marks an unbound slot
pub fn bind_arguments(
    params: Option<RequestParams>,
    method: &MethodDescriptor,
) -> Result<Vec<Option<JsonBuffer>>, DispatchError> {
    let count = method.parameters().len();
    match params {
        None => Ok(vec![None; count]),
        Some(RequestParams::Array(items)) => bind_positional(items, method),
        Some(RequestParams::Object(members)) => Ok(bind_named(&members, method)),
    }
}

fn bind_positional(
    items: Vec<JsonBuffer>,
    method: &MethodDescriptor,
) -> Result<Vec<Option<JsonBuffer>>, DispatchError> {
    let count = method.parameters().len();
    let items = transpose_variadic(items, method);
    if items.len() > count {
        return Err(DispatchError::Invocation {
            method: method.name().to_string(),
            message: format!(
                "The method '{}' expects {} argument(s) but received {}.",
                method.name(),
                count,
                items.len()
            ),
        });
    }
    let mut bound: Vec<Option<JsonBuffer>> = items.into_iter().map(Some).collect();
    bound.resize(count, None);
    Ok(bound)
}

fn bind_named(members: &[(String, JsonBuffer)], method: &MethodDescriptor) -> Vec<Option<JsonBuffer>> {
    method
        .parameters()
        .iter()
        .map(|parameter| {
            let named = members
                .iter()
                .rev()
                .find(|(key, _)| key == parameter.name());
            let value = named.or_else(|| {
                members
                    .iter()
                    .rev()
                    .find(|(key, _)| numeric_key(key) == Some(parameter.position()))
            });
            if value.is_none() {
                trace!(method = method.name(), parameter = parameter.name(), "Parameter unbound");
            }
            value.map(|(_, buffer)| buffer.clone())
        })
        .collect()
}

/// Positions addressed by one- or two-digit keys such as `"0"` or `"12"`
fn numeric_key(key: &str) -> Option<usize> {
    if key.is_empty() || key.len() > 2 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Import every bound value with its parameter's declared type; unbound
/// parameters are imported from JSON null
pub fn import_arguments(
    bound: Vec<Option<JsonBuffer>>,
    method: &MethodDescriptor,
    context: &ImportContext,
) -> Result<Vec<AnyBox>, DispatchError> {
    method
        .parameters()
        .iter()
        .zip(bound)
        .map(|(parameter, value)| {
            let buffer = value.unwrap_or_else(JsonBuffer::null);
            context
                .import_type(parameter.type_info(), &mut buffer.reader())
                .map_err(|err| DispatchError::Invocation {
                    method: method.name().to_string(),
                    message: format!("Cannot bind parameter '{}': {err}", parameter.name()),
                })
        })
        .collect()
}
