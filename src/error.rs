use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Every way a parse, usage or string call can fail.
///
/// Messages are meant for operators: they name the field path (dotted, e.g.
/// `ip.name`), the flag, or the document that caused the problem.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfError {
    #[error("Invalid configuration target: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::invalid_config)))]
    InvalidConfig(String),

    #[error("Configuration has no exported fields to resolve")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(fieldconf::no_exported_fields),
            help("register at least one field, or mark struct fields `pub` for the derive")
        )
    )]
    NoExportedFields,

    #[error("Malformed annotation on field '{field}': {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::malformed_tag)))]
    MalformedTag {
        field: String,
        #[source]
        source: TagError,
    },

    #[error("Field '{field}' is both masked and skipped")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(fieldconf::masked_skip),
            help("a skipped field is never resolved or rendered; drop one of the two options")
        )
    )]
    MaskedSkip { field: String },

    #[error("Only one Args field is allowed, found '{first}' and '{second}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::multiple_args)))]
    MultipleArgs { first: String, second: String },

    #[error("Duplicate {kind} '{name}' derived for '{first}' and '{second}'")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(fieldconf::collision),
            help("rename one of the fields with the `flag:`, `short:` or `env:` option")
        )
    )]
    Collision {
        kind: NameKind,
        name: String,
        first: String,
        second: String,
    },

    #[error("Required field '{field}' is missing a value")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::missing_required)))]
    MissingRequired { field: String },

    #[error("Field '{field}' is set to its zero value")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::zero_value)))]
    ZeroValue { field: String },

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::invalid_value)))]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unrecognized flag: {0}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(fieldconf::unrecognized_flag), help("run with --help to list flags"))
    )]
    UnrecognizedFlag(String),

    #[error("Flag {0} requires a value")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::missing_flag_value)))]
    MissingFlagValue(String),

    #[error("Failed to parse {origin}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::document)))]
    Document { origin: String, reason: String },

    #[error("Unknown keys in {origin}: {}", keys.join(", "))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::unknown_keys)))]
    UnknownKeys { origin: String, keys: Vec<String> },

    #[error("Failed to read {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(fieldconf::io)))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which derived name two fields collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Flag,
    Short,
    Env,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Flag => write!(f, "flag name"),
            NameKind::Short => write!(f, "short alias"),
            NameKind::Env => write!(f, "environment key"),
        }
    }
}

/// Problems found while parsing a field annotation string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("option '{0}' requires a value")]
    MissingValue(String),

    #[error("option '{0}' has an empty value")]
    EmptyValue(String),

    #[error("option '{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("short alias '{0}' must be a single ASCII character")]
    InvalidShort(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("'-' cannot be combined with other options")]
    SkipWithOptions,
}
