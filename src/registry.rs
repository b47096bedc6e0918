//! Field registration: how a configuration struct exposes its leaves.
//!
//! A type implements [`Configure`] by handing each field to a [`Registry`],
//! usually through `#[derive(Configure)]`. The registry records the path,
//! a mutable borrow of the field and its options; nothing is resolved until
//! the walk.
//!
//! ```ignore
//! impl Configure for Server {
//!     fn register<'a>(&'a mut self, r: &mut Registry<'a>) {
//!         r.field("port", &mut self.port, "default:8080,short:p");
//!         r.nested("tls", &mut self.tls);
//!         r.skip("handle");
//!     }
//! }
//! ```

use crate::error::ConfError;
use crate::tag::{FieldOptions, parse_tag};
use crate::value::Value;

/// A structure whose fields can be discovered and resolved.
pub trait Configure {
    fn register<'a>(&'a mut self, r: &mut Registry<'a>);
}

pub(crate) struct Binding<'a> {
    pub path: Vec<String>,
    /// `None` for skipped fields.
    pub value: Option<&'a mut dyn Value>,
    pub options: FieldOptions,
}

/// Collects field bindings in declaration order.
///
/// Problems found while registering (bad annotations, empty names) are kept
/// and reported by the walk, so `register` itself never fails.
pub struct Registry<'a> {
    prefix: Vec<String>,
    pub(crate) bindings: Vec<Binding<'a>>,
    pub(crate) problems: Vec<ConfError>,
}

impl<'a> Registry<'a> {
    pub(crate) fn new() -> Self {
        Self {
            prefix: Vec::new(),
            bindings: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Register a leaf with an annotation string such as
    /// `"default:9,short:n"`.
    pub fn field(&mut self, name: &str, value: &'a mut dyn Value, tag: &str) {
        let Some(path) = self.path_for(name) else {
            return;
        };
        match parse_tag(tag) {
            Ok(options) => self.push(path, Some(value), options),
            Err(source) => self.problems.push(ConfError::MalformedTag {
                field: path.join("."),
                source,
            }),
        }
    }

    /// Register a leaf with an options object.
    pub fn field_with(&mut self, name: &str, value: &'a mut dyn Value, options: FieldOptions) {
        let Some(path) = self.path_for(name) else {
            return;
        };
        if let Err(source) = options.check() {
            self.problems.push(ConfError::MalformedTag {
                field: path.join("."),
                source,
            });
            return;
        }
        self.push(path, Some(value), options);
    }

    /// Register a named substructure. Its fields are prefixed with `name`.
    pub fn nested<C: Configure + ?Sized>(&mut self, name: &str, sub: &'a mut C) {
        if self.path_for(name).is_none() {
            return;
        }
        self.prefix.push(name.to_string());
        sub.register(self);
        self.prefix.pop();
    }

    /// Register an embedded substructure whose fields join this level.
    pub fn flatten<C: Configure + ?Sized>(&mut self, sub: &'a mut C) {
        sub.register(self);
    }

    /// Record a field that takes no part in resolution.
    pub fn skip(&mut self, name: &str) {
        self.skip_with(name, FieldOptions::new().skip());
    }

    /// Record a skipped field with explicit options. Combining `skip` with
    /// `masked` fails the walk.
    pub fn skip_with(&mut self, name: &str, options: FieldOptions) {
        let Some(path) = self.path_for(name) else {
            return;
        };
        let options = FieldOptions {
            skip: true,
            ..options
        };
        self.push(path, None, options);
    }

    fn path_for(&mut self, name: &str) -> Option<Vec<String>> {
        if name.trim().is_empty() {
            let at = if self.prefix.is_empty() {
                "the root".to_string()
            } else {
                format!("'{}'", self.prefix.join("."))
            };
            self.problems.push(ConfError::InvalidConfig(format!(
                "field with an empty name registered under {at}"
            )));
            return None;
        }
        let mut path = self.prefix.clone();
        path.push(name.to_string());
        Some(path)
    }

    fn push(&mut self, path: Vec<String>, value: Option<&'a mut dyn Value>, options: FieldOptions) {
        self.bindings.push(Binding {
            path,
            value,
            options,
        });
    }
}
