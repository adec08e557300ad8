//! Implementation of #[derive(JsonComponent)]

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result, Visibility};

use crate::utils::{extract_container_meta, extract_field_meta};

pub fn derive_json_component_impl(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "JsonComponent cannot be derived for generic types",
        ));
    }
    let container = extract_container_meta(&input.attrs)?;
    let component_name = container.rename.unwrap_or_else(|| ident.to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "JsonComponent requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "JsonComponent can only be derived for structs",
            ));
        }
    };

    let mut accessors = Vec::new();
    let mut properties = Vec::new();
    for field in fields {
        let meta = extract_field_meta(&field.attrs)?;
        let exposed = !matches!(field.vis, Visibility::Inherited) || meta.include;
        if meta.skip || !exposed {
            continue;
        }
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_ty = &field.ty;
        let external = meta
            .rename
            .unwrap_or_else(|| field_ident.to_string().trim_start_matches("r#").to_string());
        let getter = format_ident!("__rockrpc_get_{}", field_ident);
        let setter = format_ident!("__rockrpc_set_{}", field_ident);
        let mismatch = format!("Expected a {} instance.", ident);

        let (property_ty, get_body, assign) = match &meta.via {
            Some(via) => (
                quote! { #via },
                quote! {
                    ::rockrpc_json::conversion::PropertyValue::Owned(
                        ::std::boxed::Box::new(::std::convert::Into::<#via>::into(
                            ::std::clone::Clone::clone(&component.#field_ident),
                        )),
                    )
                },
                quote! {
                    target.#field_ident = ::std::convert::Into::<#field_ty>::into(
                        ::rockrpc_json::conversion::downcast_owned::<#via>(value)?,
                    );
                },
            ),
            None => (
                quote! { #field_ty },
                quote! {
                    ::rockrpc_json::conversion::PropertyValue::Borrowed(&component.#field_ident)
                },
                quote! {
                    target.#field_ident =
                        ::rockrpc_json::conversion::downcast_owned::<#field_ty>(value)?;
                },
            ),
        };

        accessors.push(quote! {
            fn #getter(
                value: &dyn ::std::any::Any,
            ) -> ::std::option::Option<::rockrpc_json::conversion::PropertyValue<'_>> {
                let component = value.downcast_ref::<#ident>()?;
                ::std::option::Option::Some(#get_body)
            }

            fn #setter(
                target: &mut dyn ::std::any::Any,
                value: ::rockrpc_json::conversion::AnyBox,
            ) -> ::rockrpc_json::JsonResult<()> {
                let target = target
                    .downcast_mut::<#ident>()
                    .ok_or_else(|| ::rockrpc_json::JsonError::import(#mismatch))?;
                #assign
                ::std::result::Result::Ok(())
            }
        });
        properties.push(quote! {
            ::rockrpc_json::conversion::PropertyInfo {
                name: #external,
                type_info: <#property_ty as ::rockrpc_json::conversion::Reflect>::type_info,
                get: #getter,
                set: #setter,
            }
        });
    }

    let to_text = if container.display {
        quote! {
            value
                .downcast_ref::<#ident>()
                .map(::std::string::ToString::to_string)
                .unwrap_or_default()
        }
    } else {
        quote! { ::std::string::String::from(#component_name) }
    };

    Ok(quote! {
        impl ::rockrpc_json::conversion::Reflect for #ident {
            fn type_info() -> ::rockrpc_json::conversion::TypeInfo {
                #(#accessors)*

                fn __rockrpc_construct() -> ::rockrpc_json::conversion::AnyBox {
                    ::std::boxed::Box::new(<#ident as ::std::default::Default>::default())
                }

                #[allow(unused_variables)]
                fn __rockrpc_to_text(value: &dyn ::std::any::Any) -> ::std::string::String {
                    #to_text
                }

                static PROPERTIES: &[::rockrpc_json::conversion::PropertyInfo] = &[#(#properties),*];
                static COMPONENT: ::rockrpc_json::conversion::ComponentInfo =
                    ::rockrpc_json::conversion::ComponentInfo {
                        name: #component_name,
                        properties: PROPERTIES,
                        construct: __rockrpc_construct,
                        to_text: __rockrpc_to_text,
                    };
                ::rockrpc_json::conversion::TypeInfo::new::<#ident>(
                    ::rockrpc_json::conversion::TypeKind::Component(&COMPONENT),
                )
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_named_struct() {
        let input: DeriveInput = parse_quote! {
            #[derive(Default)]
            struct Employee {
                pub name: String,
                #[json(rename = "Salary", via = "f64")]
                pub salary: f32,
                #[json(skip)]
                pub cache: Vec<u8>,
                hidden: u8,
                #[json(include)]
                shown: u8,
            }
        };
        let tokens = derive_json_component_impl(input).unwrap().to_string();
        assert!(tokens.contains("\"Salary\""));
        assert!(tokens.contains("__rockrpc_get_shown"));
        assert!(!tokens.contains("__rockrpc_get_hidden"));
        assert!(!tokens.contains("__rockrpc_get_cache"));
    }

    #[test]
    fn test_unit_struct() {
        let input: DeriveInput = parse_quote! {
            #[json(display)]
            struct Marker;
        };
        assert!(derive_json_component_impl(input).is_ok());
    }

    #[test]
    fn test_rejects_tuple_and_generic_structs() {
        let tuple: DeriveInput = parse_quote! { struct Pair(u8, u8); };
        assert!(derive_json_component_impl(tuple).is_err());
        let generic: DeriveInput = parse_quote! { struct Wrapper<T> { pub inner: T } };
        assert!(derive_json_component_impl(generic).is_err());
    }
}
