//! Expansion of `#[derive(FromJson)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, Token};

struct RecordField {
    ident: syn::Ident,
    ty: syn::Type,
    /// The JSON property name this field binds from.
    json_name: String,
    /// Expression for an unseen field; `None` means `Default::default()`.
    default: Option<syn::Expr>,
}

fn record_fields(input: &DeriveInput) -> syn::Result<Vec<RecordField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "FromJson can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "FromJson requires named fields",
        ));
    };

    named
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
            let mut json_name = ident.to_string();
            let mut default = None;
            for attr in &field.attrs {
                if !attr.path().is_ident("json") {
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let value: LitStr = meta.value()?.parse()?;
                        json_name = value.value();
                        Ok(())
                    } else if meta.path.is_ident("default") {
                        // Bare `default` keeps `Default::default()`;
                        // `default = expr` substitutes the expression.
                        if meta.input.peek(Token![=]) {
                            default = Some(meta.value()?.parse()?);
                        }
                        Ok(())
                    } else {
                        Err(meta.error("unsupported json attribute; expected `rename` or `default`"))
                    }
                })?;
            }
            Ok(RecordField {
                ident,
                ty: field.ty.clone(),
                json_name,
                default,
            })
        })
        .collect()
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let fields = record_fields(&input)?;
    let name = &input.ident;
    let partial_name = format_ident!("__JsonkitPartial{}", name);
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let partial_fields = fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        quote! { #ident: ::core::option::Option<#ty> }
    });
    let partial_defaults = fields.iter().map(|f| {
        let ident = &f.ident;
        quote! { #ident: ::core::option::Option::None }
    });

    let sync_arms = fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let json_name = &f.json_name;
        quote! {
            if name.eq_ignore_ascii_case(#json_name) {
                partial.#ident = ::core::option::Option::Some(
                    <#ty as jsonkit::FromJson>::from_json(tokens)?,
                );
                return ::core::result::Result::Ok(true);
            }
        }
    });

    let async_arms = fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let json_name = &f.json_name;
        quote! {
            if name.eq_ignore_ascii_case(#json_name) {
                partial.#ident = ::core::option::Option::Some(
                    <#ty as jsonkit::FromJsonAsync>::from_json_async(tokens).await?,
                );
                return ::core::result::Result::Ok(true);
            }
        }
    });

    let finish_fields = fields.iter().map(|f| {
        let ident = &f.ident;
        match &f.default {
            Some(expr) => quote! {
                #ident: partial.#ident.take().unwrap_or_else(|| #expr)
            },
            None => quote! {
                #ident: partial.#ident.take().unwrap_or_default()
            },
        }
    });

    Ok(quote! {
        #[doc(hidden)]
        #[allow(non_camel_case_types)]
        pub struct #partial_name #generics #where_clause {
            #(#partial_fields,)*
        }

        #[automatically_derived]
        impl #impl_generics ::core::default::Default for #partial_name #ty_generics #where_clause {
            fn default() -> Self {
                Self {
                    #(#partial_defaults,)*
                }
            }
        }

        #[automatically_derived]
        impl #impl_generics jsonkit::JsonRecord for #name #ty_generics #where_clause {
            type Partial = #partial_name #ty_generics;

            fn read_field(
                partial: &mut Self::Partial,
                name: &str,
                tokens: &mut dyn jsonkit::Tokens,
            ) -> jsonkit::ScanResult<bool> {
                #(#sync_arms)*
                let _ = (name, tokens);
                ::core::result::Result::Ok(false)
            }

            fn finish(mut partial: Self::Partial) -> Self {
                Self {
                    #(#finish_fields,)*
                }
            }
        }

        #[automatically_derived]
        impl #impl_generics jsonkit::JsonRecordAsync for #name #ty_generics #where_clause {
            async fn read_field_async<A: jsonkit::AsyncTokens>(
                partial: &mut Self::Partial,
                name: &str,
                tokens: &mut A,
            ) -> jsonkit::ScanResult<bool> {
                #(#async_arms)*
                let _ = (name, tokens);
                ::core::result::Result::Ok(false)
            }
        }

        #[automatically_derived]
        impl #impl_generics jsonkit::FromJson for #name #ty_generics #where_clause {
            fn from_json(tokens: &mut dyn jsonkit::Tokens) -> jsonkit::ScanResult<Self> {
                jsonkit::read::read_record::<Self>(tokens)
            }
        }

        #[automatically_derived]
        impl #impl_generics jsonkit::FromJsonAsync for #name #ty_generics #where_clause {
            async fn from_json_async<A: jsonkit::AsyncTokens>(
                tokens: &mut A,
            ) -> jsonkit::ScanResult<Self> {
                // Boxed so self-referential records stay finitely sized.
                ::std::boxed::Box::pin(jsonkit::read::read_record_async::<Self, A>(tokens)).await
            }
        }
    })
}
