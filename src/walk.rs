//! Turns registered bindings into field descriptors.
//!
//! The walk derives flag names, short aliases and environment keys, expands
//! map fields into one descriptor per existing key, and rejects invalid
//! shapes before any value is read.

use std::collections::HashMap;

use crate::error::{ConfError, NameKind};
use crate::names::{env_name, flag_name, namespaced};
use crate::registry::{Configure, Registry};
use crate::tag::FieldOptions;
use crate::types::Kind;
use crate::value::Value;

/// One configuration leaf with its derived names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Structural names from the root. Map entries end with the map key.
    pub path: Vec<String>,
    pub flag_name: String,
    pub short: Option<char>,
    /// Namespaced environment key.
    pub env_key: String,
    pub options: FieldOptions,
    pub kind: Kind,
    pub(crate) slot: usize,
    pub(crate) entry: Option<String>,
}

impl Field {
    /// Dotted path, as used in error messages.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    /// The key this descriptor addresses inside its map, if it is a map
    /// entry.
    pub fn map_key(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    /// Args and Version fields carry metadata, not configuration.
    pub fn is_special(&self) -> bool {
        matches!(self.kind, Kind::Args | Kind::Version)
    }
}

pub(crate) struct Walked<'a> {
    pub fields: Vec<Field>,
    pub slots: Vec<&'a mut dyn Value>,
    pub args: Option<usize>,
    pub version: Option<usize>,
}

impl Walked<'_> {
    pub fn version_text(&self) -> Option<String> {
        self.version
            .and_then(|slot| self.slots[slot].as_version())
            .map(|v| v.text())
    }

    /// Descriptors that appear as flags: everything except Args/Version.
    pub fn flag_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_special())
    }
}

/// Register `cfg` and walk its bindings.
pub(crate) fn discover<'a, C: Configure + ?Sized>(
    namespace: &str,
    cfg: &'a mut C,
) -> Result<Walked<'a>, ConfError> {
    let mut registry = Registry::new();
    cfg.register(&mut registry);
    walk(namespace, registry)
}

pub(crate) fn walk<'a>(namespace: &str, registry: Registry<'a>) -> Result<Walked<'a>, ConfError> {
    if let Some(problem) = registry.problems.into_iter().next() {
        return Err(problem);
    }

    let mut walked = Walked {
        fields: Vec::new(),
        slots: Vec::new(),
        args: None,
        version: None,
    };
    let mut args_field: Option<String> = None;

    for binding in registry.bindings {
        let name = binding.path.join(".");
        let options = binding.options;
        if options.skip {
            if options.masked {
                return Err(ConfError::MaskedSkip { field: name });
            }
            continue;
        }
        let Some(value) = binding.value else {
            continue;
        };

        let kind = value.kind();
        let slot = walked.slots.len();
        match kind {
            Kind::Args => {
                if let Some(first) = &args_field {
                    return Err(ConfError::MultipleArgs {
                        first: first.clone(),
                        second: name,
                    });
                }
                args_field = Some(name.clone());
                walked.args = Some(slot);
            }
            Kind::Version => {
                if walked.version.is_some() {
                    return Err(ConfError::InvalidConfig(format!(
                        "only one Version field is allowed, found another at '{name}'"
                    )));
                }
                walked.version = Some(slot);
            }
            _ => {}
        }

        let flag = options
            .flag
            .clone()
            .unwrap_or_else(|| flag_name(&binding.path));
        if flag.is_empty() {
            return Err(ConfError::InvalidConfig(format!(
                "field '{name}' derives an empty flag name"
            )));
        }
        let env_base = options
            .env
            .clone()
            .unwrap_or_else(|| env_name(&binding.path));

        let entries = match kind {
            Kind::Map(inner) => value
                .keys()
                .into_iter()
                .map(|key| {
                    let mut path = binding.path.clone();
                    path.push(key.clone());
                    Field {
                        flag_name: format!("{flag}-{}", key.to_lowercase()),
                        short: None,
                        env_key: namespaced(namespace, &format!("{env_base}_{key}")),
                        options: FieldOptions {
                            immutable: options.immutable,
                            masked: options.masked,
                            ..FieldOptions::default()
                        },
                        kind: Kind::Scalar(inner),
                        slot,
                        entry: Some(key),
                        path,
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        walked.fields.push(Field {
            path: binding.path,
            flag_name: flag,
            short: options.short,
            env_key: namespaced(namespace, &env_base),
            options,
            kind,
            slot,
            entry: None,
        });
        walked.fields.extend(entries);
        walked.slots.push(value);
    }

    if walked.fields.is_empty() {
        return Err(ConfError::NoExportedFields);
    }
    check_collisions(&walked)?;
    Ok(walked)
}

/// Flag names and short aliases share one command-line namespace, so a
/// one-letter flag name also collides with a short alias.
fn check_collisions(walked: &Walked<'_>) -> Result<(), ConfError> {
    let mut cli: HashMap<String, (NameKind, String)> = HashMap::new();
    let mut env: HashMap<&str, String> = HashMap::new();

    cli.insert("help".into(), (NameKind::Flag, "--help".into()));
    cli.insert("h".into(), (NameKind::Short, "-h".into()));
    if walked.version.is_some() {
        cli.insert("version".into(), (NameKind::Flag, "--version".into()));
        cli.insert("v".into(), (NameKind::Short, "-v".into()));
    }

    for field in walked.flag_fields() {
        let name = field.name();
        let mut names = vec![(NameKind::Flag, field.flag_name.clone())];
        if let Some(c) = field.short {
            names.push((NameKind::Short, c.to_string()));
        }
        for (kind, key) in names {
            if let Some((_, first)) = cli.get(&key) {
                return Err(ConfError::Collision {
                    kind,
                    name: key,
                    first: first.clone(),
                    second: name,
                });
            }
            cli.insert(key, (kind, name.clone()));
        }

        if let Some(first) = env.get(field.env_key.as_str()) {
            return Err(ConfError::Collision {
                kind: NameKind::Env,
                name: field.env_key.clone(),
                first: first.clone(),
                second: name,
            });
        }
        env.insert(&field.env_key, name);
    }
    Ok(())
}
