//! # rockrpc derive macros
//!
//! - `#[derive(JsonComponent)]` - expose struct fields to the conversion registries
//! - `#[derive(JsonEnum)]` - convert fieldless enums as variant-name strings
//! - `#[rpc_service]` - describe an impl block's `#[rpc_method]` functions as a service
//!
//! Generated code refers to `::rockrpc_json` (derives) and `::rockrpc_server`
//! (`#[rpc_service]`), so those crates must be dependencies of the caller.

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, Meta, Token, parse_macro_input, punctuated::Punctuated};

mod component_derive;
mod enum_derive;
mod service_attr;
mod utils;

/// Derive `Reflect` for a struct with named fields, describing it as a component
///
/// The struct must implement `Default`. Public fields are exposed as
/// properties; private fields only with `#[json(include)]`.
///
/// # Attributes
///
/// - `#[json(rename = "...")]` on the struct - component name
/// - `#[json(display)]` on the struct - use `Display` for the text form
/// - `#[json(rename = "...")]` on a field - member name
/// - `#[json(skip)]` - never convert this field
/// - `#[json(via = "Type")]` - convert through another type (`Clone + Into<Type>`,
///   and `Type: Into<Field>`)
///
/// # Example
///
/// ```rust,ignore
/// use rockrpc_json::JsonComponent;
///
/// #[derive(Default, JsonComponent)]
/// struct Employee {
///     pub name: String,
///     #[json(rename = "Salary")]
///     pub salary: i64,
/// }
/// ```
#[proc_macro_derive(JsonComponent, attributes(json))]
pub fn derive_json_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component_derive::derive_json_component_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Derive `Reflect` for a fieldless enum
///
/// Variants convert as their names (`#[json(rename = "...")]` to override).
/// `#[json_enum(flags)]` marks a bit-flag enumeration, which the stock
/// converters refuse.
#[proc_macro_derive(JsonEnum, attributes(json, json_enum))]
pub fn derive_json_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    enum_derive::derive_json_enum_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Describe an inherent impl block as an RPC service
///
/// Every method tagged `#[rpc_method]` becomes an RPC method. Methods take
/// `&self` and owned parameter types implementing `Reflect`; methods
/// returning `Result<T, E>` report `Err` as a failure of the target method.
///
/// # Example
///
/// ```rust,ignore
/// use rockrpc_server::rpc_service;
///
/// struct Calculator;
///
/// #[rpc_service(name = "calculator", description = "Basic arithmetic")]
/// impl Calculator {
///     #[rpc_method(name = "Sum", description = "Add two numbers")]
///     fn sum(&self, a: i64, b: i64) -> i64 {
///         a + b
///     }
///
///     #[rpc_method(obsolete = "Use Sum")]
///     fn add_all(&self, #[rpc_param(variadic)] values: Vec<i64>) -> i64 {
///         values.iter().sum()
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn rpc_service(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input = parse_macro_input!(input as ItemImpl);
    service_attr::rpc_service_impl(args, input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Marks an RPC method inside a `#[rpc_service]` impl block
///
/// Only meaningful under `#[rpc_service]`, which consumes it. Used alone it
/// passes the item through unchanged.
#[proc_macro_attribute]
pub fn rpc_method(_args: TokenStream, input: TokenStream) -> TokenStream {
    input
}
