//! Structured documents that pre-seed a config before field resolution.
//!
//! Seeding behaves like decoding onto an existing value: the config is
//! serialized, the document is deep-merged over it and the result is
//! deserialized back. Keys the document leaves out keep their current value,
//! and whatever ends up non-zero is the baseline the resolver starts from,
//! so a seeded value beats a field's compiled default.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::ConfError;
use crate::merge::deep_merge;
use crate::validate::deserialize_checked;

/// The syntax a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    #[cfg(feature = "toml")]
    Toml,
    #[cfg(feature = "yaml")]
    Yaml,
}

impl Format {
    /// Pick a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            #[cfg(feature = "toml")]
            "toml" => Some(Format::Toml),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "JSON"),
            #[cfg(feature = "toml")]
            Format::Toml => write!(f, "TOML"),
            #[cfg(feature = "yaml")]
            Format::Yaml => write!(f, "YAML"),
        }
    }
}

/// A parsed document, ready to seed a config.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    origin: String,
    tree: Value,
}

impl Document {
    /// Parse `text` in the given format. `origin` names the document in
    /// error messages.
    pub fn parse(format: Format, text: &str, origin: impl Into<String>) -> Result<Self, ConfError> {
        let origin = origin.into();
        let parsed: Result<Value, String> = match format {
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            #[cfg(feature = "toml")]
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml")]
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };
        let tree = match parsed {
            Ok(Value::Null) => Value::Object(Default::default()),
            Ok(tree @ Value::Object(_)) => tree,
            Ok(_) => {
                return Err(ConfError::Document {
                    origin,
                    reason: "top level must be a table of keys".into(),
                });
            }
            Err(reason) => return Err(ConfError::Document { origin, reason }),
        };
        Ok(Self { origin, tree })
    }

    pub fn json(text: &str) -> Result<Self, ConfError> {
        Self::parse(Format::Json, text, "JSON document")
    }

    #[cfg(feature = "toml")]
    pub fn toml(text: &str) -> Result<Self, ConfError> {
        Self::parse(Format::Toml, text, "TOML document")
    }

    #[cfg(feature = "yaml")]
    pub fn yaml(text: &str) -> Result<Self, ConfError> {
        Self::parse(Format::Yaml, text, "YAML document")
    }

    /// Read and parse a file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfError> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| ConfError::Document {
                origin: path.display().to_string(),
                reason: "unsupported or missing file extension".into(),
            })?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), %format, "loaded config document");
        Self::parse(format, &text, path.display().to_string())
    }

    /// Where this document came from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Merge this document over `cfg`. Unknown keys are ignored.
    pub fn seed<C: Serialize + DeserializeOwned>(&self, cfg: &mut C) -> Result<(), ConfError> {
        self.seed_inner(cfg, false)
    }

    /// Like [`seed`](Self::seed), but keys `C` does not consume fail with
    /// [`ConfError::UnknownKeys`].
    pub fn seed_strict<C: Serialize + DeserializeOwned>(
        &self,
        cfg: &mut C,
    ) -> Result<(), ConfError> {
        self.seed_inner(cfg, true)
    }

    fn seed_inner<C: Serialize + DeserializeOwned>(
        &self,
        cfg: &mut C,
        strict: bool,
    ) -> Result<(), ConfError> {
        let current = serde_json::to_value(&*cfg).map_err(|e| ConfError::Document {
            origin: self.origin.clone(),
            reason: format!("config cannot be serialized: {e}"),
        })?;
        let merged = match (current, &self.tree) {
            (Value::Object(base), Value::Object(overlay)) => {
                Value::Object(deep_merge(base, overlay.clone()))
            }
            _ => {
                return Err(ConfError::InvalidConfig(
                    "a document can only seed a struct-like config".into(),
                ));
            }
        };
        *cfg = deserialize_checked(merged, &self.origin, strict)?;
        debug!(origin = %self.origin, strict, "config seeded from document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Db {
        url: String,
        pool: u32,
    }

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct App {
        port: u16,
        name: String,
        tags: Vec<String>,
        db: Db,
    }

    fn app() -> App {
        App {
            port: 8080,
            name: "svc".into(),
            tags: vec![],
            db: Db {
                url: "postgres://localhost".into(),
                pool: 5,
            },
        }
    }

    #[test]
    fn partial_json_touches_only_named_keys() {
        let mut cfg = app();
        Document::json(r#"{"port": 9000, "db": {"pool": 20}}"#)
            .unwrap()
            .seed(&mut cfg)
            .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.name, "svc");
        assert_eq!(cfg.db.url, "postgres://localhost");
        assert_eq!(cfg.db.pool, 20);
    }

    #[test]
    fn lenient_seed_ignores_unknown_keys() {
        let mut cfg = app();
        Document::json(r#"{"typo": 1, "name": "x"}"#)
            .unwrap()
            .seed(&mut cfg)
            .unwrap();
        assert_eq!(cfg.name, "x");
    }

    #[test]
    fn strict_seed_reports_unknown_keys() {
        let mut cfg = app();
        let err = Document::json(r#"{"typo": 1, "db": {"poool": 2}}"#)
            .unwrap()
            .seed_strict(&mut cfg)
            .unwrap_err();
        match err {
            ConfError::UnknownKeys { keys, .. } => assert_eq!(keys, vec!["db.poool", "typo"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cfg, app());
    }

    #[test]
    fn wrong_type_is_document_error() {
        let mut cfg = app();
        let err = Document::json(r#"{"port": "high"}"#)
            .unwrap()
            .seed(&mut cfg)
            .unwrap_err();
        assert!(matches!(err, ConfError::Document { .. }));
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            Document::json("{"),
            Err(ConfError::Document { .. })
        ));
        assert!(Document::json("[1]").is_err());
    }

    #[test]
    fn null_document_is_empty() {
        let mut cfg = app();
        Document::json("null").unwrap().seed(&mut cfg).unwrap();
        assert_eq!(cfg, app());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_document() {
        let mut cfg = app();
        Document::toml("name = \"from-toml\"\ntags = [\"a\", \"b\"]\n[db]\npool = 7\n")
            .unwrap()
            .seed(&mut cfg)
            .unwrap();
        assert_eq!(cfg.name, "from-toml");
        assert_eq!(cfg.tags, vec!["a", "b"]);
        assert_eq!(cfg.db.pool, 7);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_document() {
        let mut cfg = app();
        Document::yaml("port: 1234\ndb:\n  url: postgres://remote\n")
            .unwrap()
            .seed(&mut cfg)
            .unwrap();
        assert_eq!(cfg.port, 1234);
        assert_eq!(cfg.db.url, "postgres://remote");
        assert_eq!(cfg.db.pool, 5);
    }

    #[test]
    fn from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, r#"{"name": "from-file"}"#).unwrap();
        let doc = Document::from_path(&path).unwrap();
        assert_eq!(doc.origin(), path.display().to_string());
        let mut cfg = app();
        doc.seed(&mut cfg).unwrap();
        assert_eq!(cfg.name, "from-file");
    }

    #[test]
    fn from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::from_path(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, ConfError::IoError { .. }));
    }

    #[test]
    fn from_path_unknown_extension() {
        let err = Document::from_path("settings.ini").unwrap_err();
        assert!(matches!(err, ConfError::Document { .. }));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_extension("JSON"), Some(Format::Json));
        assert_eq!(Format::from_extension("ini"), None);
    }
}
