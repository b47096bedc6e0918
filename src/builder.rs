use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document::Document;
use crate::env::Environment;
use crate::error::ConfError;
use crate::registry::Configure;
use crate::render;
use crate::resolve::{self, ResolveInput};
use crate::source::Source;
use crate::types::Parsed;
use crate::walk;

/// Entry point for building a fieldconf parse.
pub struct Conf;

impl Conf {
    pub fn builder() -> ConfBuilder {
        ConfBuilder::new()
    }
}

/// Builder for one resolution pass.
///
/// Every input has a process default: argv from [`std::env::args`], the
/// environment read key by key at lookup time. Override them to run against
/// synthetic data.
pub struct ConfBuilder {
    namespace: String,
    args: Option<Vec<String>>,
    env: Environment,
    sources: Vec<Box<dyn Source>>,
    documents: Vec<Document>,
    strict_flags: bool,
    strict_documents: bool,
}

impl ConfBuilder {
    fn new() -> Self {
        Self {
            namespace: String::new(),
            args: None,
            env: Environment::Process,
            sources: Vec::new(),
            documents: Vec::new(),
            strict_flags: false,
            strict_documents: false,
        }
    }

    /// Prefix for every environment key (`APP` → `APP_PORT`). Empty by
    /// default.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// The full argv, program name first.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Use a fixed environment instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Environment::fixed(vars);
        self
    }

    /// Add a lookup source. Sources sit between defaults and the
    /// environment; a later source overrides an earlier one.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add a document to seed the config with before resolution. Documents
    /// apply in order; use [`load`](Self::load) to honour them.
    pub fn document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    /// Reject unrecognized flags (default: `false`, they are skipped).
    pub fn strict_flags(mut self, strict: bool) -> Self {
        self.strict_flags = strict;
        self
    }

    /// Reject document keys the config does not consume (default: `false`).
    pub fn strict_documents(mut self, strict: bool) -> Self {
        self.strict_documents = strict;
        self
    }

    fn argv(&self) -> Vec<String> {
        match &self.args {
            Some(args) => args.clone(),
            None => std::env::args().collect(),
        }
    }

    /// Resolve every field of `cfg` from defaults, sources, environment and
    /// flags.
    ///
    /// Fails with [`ConfError::InvalidConfig`] when documents were added;
    /// those need [`load`](Self::load).
    pub fn parse<C: Configure + ?Sized>(self, cfg: &mut C) -> Result<Parsed, ConfError> {
        if !self.documents.is_empty() {
            return Err(ConfError::InvalidConfig(
                "documents were added to the builder; resolve with load()".into(),
            ));
        }
        self.run(cfg)
    }

    /// Seed `cfg` from the added documents, then resolve it like
    /// [`parse`](Self::parse).
    pub fn load<C>(self, cfg: &mut C) -> Result<Parsed, ConfError>
    where
        C: Configure + Serialize + DeserializeOwned,
    {
        for document in &self.documents {
            if self.strict_documents {
                document.seed_strict(cfg)?;
            } else {
                document.seed(cfg)?;
            }
        }
        self.run(cfg)
    }

    /// Render usage text for `cfg` without resolving it.
    pub fn usage<C: Configure + ?Sized>(self, cfg: &mut C) -> Result<String, ConfError> {
        let argv = self.argv();
        let program = argv.first().map(String::as_str).unwrap_or_default();
        let walked = walk::discover(&self.namespace, cfg)?;
        Ok(render::usage(program, &walked))
    }

    fn run<C: Configure + ?Sized>(&self, cfg: &mut C) -> Result<Parsed, ConfError> {
        let argv = self.argv();
        let (program, tokens) = match argv.split_first() {
            Some((program, tokens)) => (program.as_str(), tokens),
            None => ("", &argv[..]),
        };
        let input = ResolveInput {
            namespace: &self.namespace,
            program,
            tokens,
            env: &self.env,
            sources: &self.sources,
            strict_flags: self.strict_flags,
        };
        resolve::resolve(&input, cfg)
    }
}

/// Resolve `cfg` against the process arguments and environment.
pub fn parse<C: Configure + ?Sized>(namespace: &str, cfg: &mut C) -> Result<Parsed, ConfError> {
    Conf::builder().namespace(namespace).parse(cfg)
}

/// Usage text for `cfg`, using the process's program name.
pub fn usage<C: Configure + ?Sized>(namespace: &str, cfg: &mut C) -> Result<String, ConfError> {
    Conf::builder().namespace(namespace).usage(cfg)
}

/// One `--flag=value` line per field with masked values redacted. Reads the
/// values already in `cfg`; nothing is parsed.
pub fn string<C: Configure + ?Sized>(cfg: &mut C) -> Result<String, ConfError> {
    let walked = walk::discover("", cfg)?;
    Ok(render::string(&walked))
}
