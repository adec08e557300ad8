//! Implementation of the #[rpc_service] attribute macro

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    FnArg, ImplItem, ImplItemFn, ItemImpl, Lit, Meta, Pat, Result, ReturnType, Token, Type,
    punctuated::Punctuated,
};

use crate::utils::{extract_method_meta, extract_param_meta, extract_result_ok_type};

pub fn rpc_service_impl(args: Punctuated<Meta, Token![,]>, input: ItemImpl) -> Result<TokenStream> {
    let mut service_name = None;
    let mut service_description = None;

    for arg in args {
        match arg {
            Meta::NameValue(nv) if nv.path.is_ident("name") => {
                if let syn::Expr::Lit(expr_lit) = &nv.value
                    && let Lit::Str(s) = &expr_lit.lit
                {
                    service_name = Some(s.value());
                }
            }
            Meta::NameValue(nv) if nv.path.is_ident("description") => {
                if let syn::Expr::Lit(expr_lit) = &nv.value
                    && let Lit::Str(s) = &expr_lit.lit
                {
                    service_description = Some(s.value());
                }
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected `name = \"...\"` or `description = \"...\"`",
                ));
            }
        }
    }

    if input.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[rpc_service] must be placed on an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[rpc_service] does not support generic impl blocks",
        ));
    }

    let self_ty = &input.self_ty;
    let service_name = match service_name {
        Some(name) => name,
        None => type_display_name(self_ty),
    };
    let description = service_description.map(|d| quote! { builder.set_description(#d); });

    let mut seen = HashSet::new();
    let mut registrations = Vec::new();
    for item in &input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let Some(attr) = method
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("rpc_method"))
        else {
            continue;
        };
        let meta = extract_method_meta(attr)?;
        let internal = method.sig.ident.to_string();
        let external = meta.name.clone().unwrap_or_else(|| internal.clone());
        if !seen.insert(external.clone()) {
            return Err(syn::Error::new_spanned(
                &method.sig.ident,
                format!("duplicate RPC method name '{external}'"),
            ));
        }
        registrations.push(method_registration(self_ty, method, &internal, &external, &meta)?);
    }

    let mut clean_input = input.clone();
    for item in &mut clean_input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| !attr.path().is_ident("rpc_method"));
            for input_arg in &mut method.sig.inputs {
                if let FnArg::Typed(pat_type) = input_arg {
                    pat_type.attrs.retain(|attr| !attr.path().is_ident("rpc_param"));
                }
            }
        }
    }

    Ok(quote! {
        #clean_input

        impl ::rockrpc_server::ServiceDefinition for #self_ty {
            fn describe(builder: &mut ::rockrpc_server::ServiceClassBuilder) {
                builder.set_name(#service_name);
                #description
                #(#registrations)*
            }
        }
    })
}

fn method_registration(
    self_ty: &Type,
    method: &ImplItemFn,
    internal: &str,
    external: &str,
    meta: &crate::utils::MethodMeta,
) -> Result<TokenStream> {
    let sig = &method.sig;
    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "#[rpc_method] requires a `&self` receiver",
            ));
        }
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[rpc_method] does not support async methods",
        ));
    }

    let typed: Vec<_> = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(pat_type),
            FnArg::Receiver(_) => None,
        })
        .collect();

    let mut parameters = Vec::new();
    let mut extractions = Vec::new();
    let mut call_args = Vec::new();
    for (position, pat_type) in typed.iter().enumerate() {
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "#[rpc_method] parameters must be plain identifiers",
            ));
        };
        let ty = pat_type.ty.as_ref();
        if matches!(ty, Type::Reference(_)) {
            return Err(syn::Error::new_spanned(
                ty,
                "#[rpc_method] parameters must be owned types",
            ));
        }
        let param_meta = extract_param_meta(&pat_type.attrs)?;
        let ident = &pat_ident.ident;
        let name = param_meta
            .name
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        if param_meta.variadic {
            if position + 1 != typed.len() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "only the last parameter can be variadic",
                ));
            }
            parameters.push(quote! { .variadic::<#ty>(#name) });
        } else {
            parameters.push(quote! { .param::<#ty>(#name) });
        }
        extractions.push(quote! { let #ident = __rpc_args.take::<#ty>(#name)?; });
        call_args.push(quote! { #ident });
    }

    let method_ident = &sig.ident;
    let call = quote! { __rpc_service.#method_ident(#(#call_args),*) };
    let (result_ty, body) = match &sig.output {
        ReturnType::Default => (
            quote! { () },
            quote! {
                #call;
                ::std::result::Result::Ok(::std::boxed::Box::new(()) as ::rockrpc_server::AnyBox)
            },
        ),
        ReturnType::Type(_, ty) => match extract_result_ok_type(ty) {
            Some(ok_ty) => (
                quote! { #ok_ty },
                quote! {
                    match #call {
                        ::std::result::Result::Ok(value) => ::std::result::Result::Ok(
                            ::std::boxed::Box::new(value) as ::rockrpc_server::AnyBox,
                        ),
                        ::std::result::Result::Err(error) => ::std::result::Result::Err(
                            ::rockrpc_server::InvokeError::target(error),
                        ),
                    }
                },
            ),
            None => (
                quote! { #ty },
                quote! {
                    ::std::result::Result::Ok(::std::boxed::Box::new(#call) as ::rockrpc_server::AnyBox)
                },
            ),
        },
    };

    let description = meta
        .description
        .as_ref()
        .map(|d| quote! { .description(#d) });
    let obsolete = meta.obsolete.as_ref().map(|o| quote! { .obsolete(#o) });

    Ok(quote! {
        builder.add_method(
            ::rockrpc_server::MethodBuilder::new(#external)
                .internal_name(#internal)
                #description
                #obsolete
                .returns::<#result_ty>()
                #(#parameters)*
                .handler(
                    |__rpc_service: &#self_ty, __rpc_args: &mut ::rockrpc_server::Arguments|
                        -> ::std::result::Result<::rockrpc_server::AnyBox, ::rockrpc_server::InvokeError> {
                        #(#extractions)*
                        #body
                    },
                ),
        );
    })
}

/// Last path segment of the impl's self type
fn type_display_name(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => quote!(#other).to_string(),
    }
}
