// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides procedural macros for the Lumen entity database.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident};

/// A derive macro that implements the `lumen_core::Implementer` trait.
///
/// The trait carries no methods; deriving it marks a struct as an aggregate
/// that may be reserved into bucket storage.
#[proc_macro_derive(Implementer)]
pub fn derive_implementer(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::lumen_core::Implementer for #name #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}

/// A derive macro that implements the `lumen_core::EntityView` trait.
///
/// The identifier field is the one marked `#[egid]`, or else the field named
/// `egid`. Only structs with named fields are supported.
#[proc_macro_derive(EntityView, attributes(egid))]
pub fn derive_entity_view(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field = match find_egid_field(&input) {
        Ok(field) => field,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics ::lumen_core::EntityView for #name #ty_generics #where_clause {
            #[inline]
            fn egid(&self) -> ::lumen_core::Egid {
                self.#field
            }

            #[inline]
            fn set_egid(&mut self, egid: ::lumen_core::Egid) {
                self.#field = egid;
            }
        }
    };

    TokenStream::from(expanded)
}

fn find_egid_field(input: &DeriveInput) -> syn::Result<Ident> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "EntityView can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "EntityView requires named fields",
        ));
    };

    let marked = fields
        .named
        .iter()
        .find(|f| f.attrs.iter().any(|a| a.path().is_ident("egid")));
    let named = fields
        .named
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == "egid"));

    marked
        .or(named)
        .and_then(|f| f.ident.clone())
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "EntityView needs a field named `egid` or a field marked #[egid]",
            )
        })
}
