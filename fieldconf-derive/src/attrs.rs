//! Attribute parsing for `#[conf(...)]` annotations.
//!
//! A field attribute holds, comma separated, at most one annotation string
//! plus the markers `nested`, `flatten`, `skip` and `rename = "..."`.

use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Field, Ident, LitStr, Token};

/// How a field is handed to the registry.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Leaf,
    Nested,
    Flatten,
    Skip,
}

/// Parsed `#[conf(...)]` attributes from a struct field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub role: Role,
    /// Annotation string, e.g. `"default:8080,short:p"`.
    pub tag: Option<LitStr>,
    /// Replaces the field identifier as the path segment.
    pub rename: Option<LitStr>,
}

enum Item {
    Tag(LitStr),
    Marker(Ident),
    Rename(LitStr),
}

impl Parse for Item {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(Item::Tag(input.parse()?));
        }
        let ident: Ident = input.parse()?;
        if ident == "rename" {
            input.parse::<Token![=]>()?;
            return Ok(Item::Rename(input.parse()?));
        }
        Ok(Item::Marker(ident))
    }
}

impl FieldAttrs {
    /// Collect every `#[conf(...)]` on `field`. Other attributes are left to
    /// the macros that own them.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();

        for attr in &field.attrs {
            if !attr.path().is_ident("conf") {
                continue;
            }
            let items = attr.parse_args_with(Punctuated::<Item, Token![,]>::parse_terminated)?;
            for item in items {
                match item {
                    Item::Tag(tag) => {
                        if attrs.tag.is_some() {
                            return Err(syn::Error::new_spanned(tag, "duplicate annotation string"));
                        }
                        attrs.tag = Some(tag);
                    }
                    Item::Rename(name) => {
                        if name.value().is_empty() {
                            return Err(syn::Error::new_spanned(name, "rename must not be empty"));
                        }
                        attrs.rename = Some(name);
                    }
                    Item::Marker(ident) => {
                        let role = match ident.to_string().as_str() {
                            "nested" => Role::Nested,
                            "flatten" => Role::Flatten,
                            "skip" => Role::Skip,
                            _ => return Err(syn::Error::new_spanned(ident, "unsupported conf attribute")),
                        };
                        if attrs.role != Role::Leaf && attrs.role != role {
                            return Err(syn::Error::new_spanned(
                                ident,
                                "nested, flatten and skip are mutually exclusive",
                            ));
                        }
                        attrs.role = role;
                    }
                }
            }
        }

        attrs.check(field)?;
        Ok(attrs)
    }

    fn check(&self, field: &Field) -> syn::Result<()> {
        match self.role {
            Role::Nested | Role::Flatten if self.tag.is_some() => Err(syn::Error::new_spanned(
                field,
                "nested and flattened structures take no annotation string",
            )),
            Role::Flatten if self.rename.is_some() => Err(syn::Error::new_spanned(
                field,
                "a flattened structure has no name to rename",
            )),
            Role::Skip if self.tag.is_some() => Err(syn::Error::new_spanned(
                field,
                "a skipped field takes no annotation string",
            )),
            _ => Ok(()),
        }
    }
}
