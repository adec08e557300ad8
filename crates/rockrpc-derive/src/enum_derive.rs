//! Implementation of #[derive(JsonEnum)]

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::utils::{extract_container_meta, extract_enum_flags, extract_field_meta};

pub fn derive_json_enum_impl(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "JsonEnum cannot be derived for generic types",
        ));
    }
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "JsonEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "JsonEnum requires at least one variant",
        ));
    }

    let flags = extract_enum_flags(&input.attrs)?;
    let enum_name = extract_container_meta(&input.attrs)?
        .rename
        .unwrap_or_else(|| ident.to_string());

    let mut names = Vec::new();
    let mut to_index = Vec::new();
    let mut from_index = Vec::new();
    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "JsonEnum variants cannot carry fields",
            ));
        }
        let variant_ident = &variant.ident;
        let meta = extract_field_meta(&variant.attrs)?;
        names.push(meta.rename.unwrap_or_else(|| variant_ident.to_string()));
        to_index.push(quote! { #ident::#variant_ident => #index, });
        from_index.push(quote! {
            #index => ::std::option::Option::Some(::std::boxed::Box::new(#ident::#variant_ident)),
        });
    }

    Ok(quote! {
        impl ::rockrpc_json::conversion::Reflect for #ident {
            fn type_info() -> ::rockrpc_json::conversion::TypeInfo {
                fn __rockrpc_to_index(value: &dyn ::std::any::Any) -> ::std::option::Option<usize> {
                    ::std::option::Option::Some(match value.downcast_ref::<#ident>()? {
                        #(#to_index)*
                    })
                }

                fn __rockrpc_from_index(
                    index: usize,
                ) -> ::std::option::Option<::rockrpc_json::conversion::AnyBox> {
                    match index {
                        #(#from_index)*
                        _ => ::std::option::Option::None,
                    }
                }

                static ENUM: ::rockrpc_json::conversion::EnumInfo =
                    ::rockrpc_json::conversion::EnumInfo {
                        name: #enum_name,
                        variants: &[#(#names),*],
                        flags: #flags,
                        to_index: __rockrpc_to_index,
                        from_index: __rockrpc_from_index,
                    };
                ::rockrpc_json::conversion::TypeInfo::new::<#ident>(
                    ::rockrpc_json::conversion::TypeKind::Enum(&ENUM),
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
    fn test_fieldless_enum() {
        let input: DeriveInput = parse_quote! {
            #[json_enum(flags)]
            enum Color {
                Red,
                #[json(rename = "dark-green")]
                Green,
            }
        };
        let tokens = derive_json_enum_impl(input).unwrap().to_string();
        assert!(tokens.contains("\"dark-green\""));
        assert!(tokens.contains("flags : true"));
    }

    #[test]
    fn test_rejects_data_variants() {
        let input: DeriveInput = parse_quote! {
            enum Shape { Circle(f64), Square }
        };
        assert!(derive_json_enum_impl(input).is_err());
        let empty: DeriveInput = parse_quote! { enum Never {} };
        assert!(derive_json_enum_impl(empty).is_err());
    }
}
