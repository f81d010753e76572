// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Derive macros for actor-instruments
//!
//! This crate provides the derive macros that turn plain Rust types into the
//! closed, compile-time checked tag schemas used by `actor-instruments`.
//!
//! ## MetricLabel Derive Macro
//!
//! `#[derive(MetricLabel)]` applies to fieldless enums. Every variant becomes
//! one tag value. The generated implementation provides:
//! - `COUNT`: the number of variants
//! - `index()`: a dense, zero-based position used to address handle tables
//! - `as_str()`: the static tag value, the variant name unless renamed
//! - an inherent `VARIANTS` constant listing every variant in declaration order
//!
//! ```rust,ignore
//! use actor_instruments::MetricLabel;
//!
//! #[derive(Debug, Clone, Copy, MetricLabel)]
//! enum Lane {
//!     Fast,
//!     #[metric_label(rename = "slow-lane")]
//!     Slow,
//! }
//!
//! assert_eq!(Lane::Slow.as_str(), "slow-lane");
//! assert_eq!(Lane::VARIANTS.len(), 2);
//! ```
//!
//! ## TagSet Derive Macro
//!
//! `#[derive(TagSet)]` applies to structs. Each field names one tag key with
//! `#[tag(key = "...")]`; fields marked `optional` must be `Option<_>` and only
//! emit their label when present.
//!
//! ```rust,ignore
//! use actor_instruments::TagSet;
//!
//! #[derive(TagSet)]
//! struct PeerTags<'a> {
//!     #[tag(key = "Peer")]
//!     peer: &'a str,
//!     #[tag(key = "Zone", optional)]
//!     zone: Option<&'a str>,
//! }
//!
//! assert_eq!(PeerTags::KEYS, &["Peer", "Zone"]);
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derive macro for fieldless enums used as tag values.
///
/// # Limitations
///
/// - Only works on enums whose variants carry no data
/// - The enum must have at least one variant
#[proc_macro_derive(MetricLabel, attributes(metric_label))]
pub fn derive_metric_label(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match derive_metric_label_impl(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    };

    TokenStream::from(expanded)
}

fn derive_metric_label_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "MetricLabel derive macro can only be used on enums",
            ))
        }
    };

    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "MetricLabel derive macro requires at least one variant",
        ));
    }

    let mut idents = Vec::with_capacity(data.variants.len());
    let mut values = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "MetricLabel variants cannot carry data",
            ));
        }

        let mut value = variant.ident.to_string();
        for attr in &variant.attrs {
            if !attr.path().is_ident("metric_label") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let renamed: LitStr = meta.value()?.parse()?;
                    value = renamed.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported metric_label attribute, expected `rename`"))
                }
            })?;
        }

        idents.push(&variant.ident);
        values.push(value);
    }

    let count = idents.len();
    let indices = 0..count;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::actor_instruments::MetricLabel for #name #ty_generics #where_clause {
            const COUNT: usize = #count;

            #[inline]
            fn index(&self) -> usize {
                match self {
                    #( #name::#idents => #indices, )*
                }
            }

            #[inline]
            fn as_str(&self) -> &'static str {
                match self {
                    #( #name::#idents => #values, )*
                }
            }
        }

        impl #impl_generics ::actor_instruments::TagValue for #name #ty_generics #where_clause {
            #[inline]
            fn tag_value(&self) -> ::actor_instruments::SharedString {
                ::actor_instruments::SharedString::from(
                    <Self as ::actor_instruments::MetricLabel>::as_str(self),
                )
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            /// Every variant in declaration order.
            pub const VARIANTS: &'static [Self] = &[ #( #name::#idents ),* ];
        }
    })
}

/// Derive macro for structs describing the tag schema of one instrument.
///
/// Every field needs `#[tag(key = "...")]`. Add `optional` for `Option<_>`
/// fields whose label is only emitted when the value is present. Field types
/// must implement `actor_instruments::TagValue`.
#[proc_macro_derive(TagSet, attributes(tag))]
pub fn derive_tag_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match derive_tag_set_impl(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    };

    TokenStream::from(expanded)
}

fn derive_tag_set_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "TagSet derive macro requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "TagSet derive macro can only be used on structs",
            ))
        }
    };

    let mut keys = Vec::with_capacity(fields.len());
    let mut pushes = Vec::with_capacity(fields.len());

    for field in fields {
        let mut key: Option<LitStr> = None;
        let mut optional = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("tag") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    key = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("optional") {
                    optional = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported tag attribute, expected `key` or `optional`"))
                }
            })?;
        }

        let key = key.ok_or_else(|| {
            syn::Error::new_spanned(field, "missing `#[tag(key = \"...\")]` on TagSet field")
        })?;
        // Named fields always carry an identifier.
        let ident = field.ident.as_ref();

        pushes.push(if optional {
            quote! {
                if let ::std::option::Option::Some(value) = &self.#ident {
                    labels.push(::actor_instruments::Label::new(
                        #key,
                        ::actor_instruments::TagValue::tag_value(value),
                    ));
                }
            }
        } else {
            quote! {
                labels.push(::actor_instruments::Label::new(
                    #key,
                    ::actor_instruments::TagValue::tag_value(&self.#ident),
                ));
            }
        });
        keys.push(key);
    }

    let capacity = keys.len();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::actor_instruments::TagSet for #name #ty_generics #where_clause {
            const KEYS: &'static [&'static str] = &[ #( #keys ),* ];

            #[allow(unused_mut)]
            fn labels(&self) -> ::std::vec::Vec<::actor_instruments::Label> {
                let mut labels = ::std::vec::Vec::with_capacity(#capacity);
                #( #pushes )*
                labels
            }
        }
    })
}
