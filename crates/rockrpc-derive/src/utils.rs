//! Attribute parsing shared by the derive and attribute macros

use syn::{Attribute, LitStr, Result, Type, meta::ParseNestedMeta};

fn string_value(meta: &ParseNestedMeta) -> Result<String> {
    let s: LitStr = meta.value()?.parse()?;
    Ok(s.value())
}

/// `#[json(...)]` on a struct
#[derive(Debug, Default)]
pub struct ContainerMeta {
    pub rename: Option<String>,
    /// Text representation comes from `Display`
    pub display: bool,
}

pub fn extract_container_meta(attrs: &[Attribute]) -> Result<ContainerMeta> {
    let mut result = ContainerMeta::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("json")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                result.rename = Some(string_value(&meta)?);
            } else if meta.path.is_ident("display") {
                result.display = true;
            } else {
                return Err(meta.error("unsupported #[json] container attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

/// `#[json(...)]` on a field or variant
#[derive(Debug, Default)]
pub struct FieldMeta {
    pub rename: Option<String>,
    pub skip: bool,
    /// Expose a non-public field
    pub include: bool,
    /// Remapped property type
    pub via: Option<Type>,
}

pub fn extract_field_meta(attrs: &[Attribute]) -> Result<FieldMeta> {
    let mut result = FieldMeta::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("json")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                result.rename = Some(string_value(&meta)?);
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("include") {
                result.include = true;
            } else if meta.path.is_ident("via") {
                let s: LitStr = meta.value()?.parse()?;
                result.via = Some(s.parse()?);
            } else {
                return Err(meta.error("unsupported #[json] field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

/// `#[json_enum(flags)]`
pub fn extract_enum_flags(attrs: &[Attribute]) -> Result<bool> {
    let mut flags = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("json_enum")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("flags") {
                flags = true;
                Ok(())
            } else {
                Err(meta.error("unsupported #[json_enum] attribute"))
            }
        })?;
    }
    Ok(flags)
}

/// `#[rpc_method(...)]`
#[derive(Debug, Default)]
pub struct MethodMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub obsolete: Option<String>,
}

pub const DEFAULT_OBSOLETE_MESSAGE: &str = "This method is obsolete.";

pub fn extract_method_meta(attr: &Attribute) -> Result<MethodMeta> {
    let mut result = MethodMeta::default();
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(result);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            result.name = Some(string_value(&meta)?);
        } else if meta.path.is_ident("description") {
            result.description = Some(string_value(&meta)?);
        } else if meta.path.is_ident("obsolete") {
            result.obsolete = Some(if meta.input.peek(syn::Token![=]) {
                string_value(&meta)?
            } else {
                DEFAULT_OBSOLETE_MESSAGE.to_string()
            });
        } else {
            return Err(meta.error("unsupported #[rpc_method] attribute"));
        }
        Ok(())
    })?;
    Ok(result)
}

/// `#[rpc_param(...)]`
#[derive(Debug, Default)]
pub struct ParamMeta {
    pub name: Option<String>,
    pub variadic: bool,
}

pub fn extract_param_meta(attrs: &[Attribute]) -> Result<ParamMeta> {
    let mut result = ParamMeta::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("rpc_param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(string_value(&meta)?);
            } else if meta.path.is_ident("variadic") {
                result.variadic = true;
            } else {
                return Err(meta.error("unsupported #[rpc_param] attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

/// `T` of a syntactic `Result<T, E>` (any path ending in `Result`)
pub fn extract_result_ok_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident.to_string().ends_with("Result")
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner_type)) = args.args.first()
    {
        return Some(inner_type);
    }
    None
}
