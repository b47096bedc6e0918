//! Derive macro implementation for fieldconf

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Visibility, parse_macro_input};

mod attrs;

use attrs::{FieldAttrs, Role};

/// `Configure` derive macro
///
/// Implements `fieldconf::Configure` for a struct with named fields by
/// registering each `pub` field. Private fields are not configurable and are
/// left alone.
///
/// # Field attributes
///
/// - `#[conf("default:8080,short:p")]`: annotation string for a leaf
/// - `#[conf(nested)]`: a named substructure, its fields prefixed by this one
/// - `#[conf(flatten)]`: an embedded substructure, fields lifted into this one
/// - `#[conf(skip)]`: keep the field out of configuration (no annotation
///   string allowed)
/// - `#[conf(rename = "name")]`: path segment to use instead of the identifier
#[proc_macro_derive(Configure, attributes(conf))]
pub fn derive_configure(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Configure only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Configure only supports structs",
            ));
        }
    };

    let mut registrations = Vec::new();
    for field in fields {
        if !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = FieldAttrs::from_field(field)?;
        let name = match &attrs.rename {
            Some(rename) => rename.value(),
            None => ident.unraw().to_string(),
        };

        registrations.push(match attrs.role {
            Role::Leaf => {
                let tag = attrs.tag.map(|t| t.value()).unwrap_or_default();
                quote! { __registry.field(#name, &mut self.#ident, #tag); }
            }
            Role::Nested => quote! { __registry.nested(#name, &mut self.#ident); },
            Role::Flatten => quote! { __registry.flatten(&mut self.#ident); },
            Role::Skip => quote! { __registry.skip(#name); },
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fieldconf::Configure for #struct_name #ty_generics #where_clause {
            fn register<'__conf>(&'__conf mut self, __registry: &mut ::fieldconf::Registry<'__conf>) {
                #(#registrations)*
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expanded(input: DeriveInput) -> String {
        expand(&input).unwrap().to_string()
    }

    #[test]
    fn registers_public_fields_in_order() {
        let out = expanded(parse_quote! {
            struct Config {
                #[conf("default:8080")]
                pub port: u16,
                pub debug: bool,
                secret: String,
            }
        });
        let port = out.find("\"port\"").unwrap();
        let debug = out.find("\"debug\"").unwrap();
        assert!(port < debug);
        assert!(out.contains("\"default:8080\""));
        assert!(!out.contains("secret"));
    }

    #[test]
    fn roles_map_to_registry_calls() {
        let out = expanded(parse_quote! {
            struct Config {
                #[conf(nested)]
                pub ip: Ip,
                #[conf(flatten)]
                pub embed: Embed,
                #[conf(skip)]
                pub cache: String,
            }
        });
        assert!(out.contains("__registry . nested (\"ip\""));
        assert!(out.contains("__registry . flatten (& mut self . embed)"));
        assert!(out.contains("__registry . skip (\"cache\")"));
    }

    #[test]
    fn raw_identifiers_and_rename() {
        let out = expanded(parse_quote! {
            struct Config {
                pub r#type: String,
                #[conf(rename = "host_name")]
                pub host: String,
            }
        });
        assert!(out.contains("\"type\""));
        assert!(out.contains("\"host_name\""));
    }

    #[test]
    fn generics_carried_through() {
        let out = expanded(parse_quote! {
            struct Config<T: Default> {
                pub value: T,
            }
        });
        assert!(out.contains("T : Default"));
        assert!(out.contains("Configure for Config < T >"));
    }

    #[test]
    fn skipped_field_with_mask_is_compile_error() {
        let input: DeriveInput = parse_quote! {
            struct Secretive {
                pub port: u16,
                #[conf(skip, "mask")]
                pub token: String,
            }
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn enums_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Mode { A, B }
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn tuple_structs_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Pair(pub u8, pub u8);
        };
        assert!(expand(&input).is_err());
    }
}
