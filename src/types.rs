use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// Outcome of a successful parse call.
///
/// Help and version requests are not failures, so they travel on the `Ok`
/// side with the text the caller should print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Every field was resolved and assigned.
    Resolved,
    /// `-h`/`--help` was given. Holds the rendered usage text.
    Help(String),
    /// `-v`/`--version` was given and the config has a [`Version`] field.
    Version(String),
}

impl Parsed {
    /// The text to print for help/version requests, `None` when resolved.
    pub fn info(&self) -> Option<&str> {
        match self {
            Parsed::Resolved => None,
            Parsed::Help(text) | Parsed::Version(text) => Some(text),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Parsed::Resolved)
    }
}

/// Positional command-line tokens left over after flag parsing.
///
/// A config may hold at most one `Args` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(pub Vec<String>);

impl Args {
    /// The number of captured arguments.
    pub fn num(&self) -> usize {
        self.0.len()
    }

    /// The argument at position `i`, if any.
    pub fn num_at(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }
}

impl Deref for Args {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Args {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Args {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Args(iter.into_iter().map(Into::into).collect())
    }
}

/// Build and description metadata, printed for `-v`/`--version`.
///
/// Never sourced from defaults, environment or flags. Its presence enables
/// the version flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub build: String,
    pub desc: String,
}

impl Version {
    pub fn new(build: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            build: build.into(),
            desc: desc.into(),
        }
    }

    /// `Version: <build>` followed by the description, each only when set.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        if !self.build.is_empty() {
            lines.push(format!("Version: {}", self.build));
        }
        if !self.desc.is_empty() {
            lines.push(self.desc.clone());
        }
        lines.join("\n")
    }
}

/// The primitive shape a scalar value is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Duration,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Duration => "duration",
        }
    }
}

/// What a field holds, as far as resolution and rendering care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar(ScalarKind),
    /// A `;`-delimited sequence of scalars.
    Slice(ScalarKind),
    /// String keys to scalar values.
    Map(ScalarKind),
    /// A user type that parses and renders itself.
    Custom,
    Args,
    Version,
}

impl Kind {
    /// Boolean fields are switches on the command line.
    pub fn is_bool(self) -> bool {
        matches!(self, Kind::Scalar(ScalarKind::Bool))
    }

    /// The value placeholder shown in usage text.
    pub fn placeholder(self) -> String {
        match self {
            Kind::Scalar(k) => format!("<{}>", k.name()),
            Kind::Slice(k) => format!("<{0}>;[{0}...]", k.name()),
            Kind::Map(k) => format!("<key:{0}>;[key:{0}...]", k.name()),
            Kind::Custom => "<value>".to_string(),
            Kind::Args | Kind::Version => String::new(),
        }
    }
}
