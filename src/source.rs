//! Lookup sources: extra layers consulted by field between defaults and the
//! environment.
//!
//! A [`Source`] answers one question per field: is there a raw value for it?
//! [`FlatSource`] covers the common case of a flat key/value document, and
//! any `Fn(&Field) -> Option<String>` closure is a source too.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as Json;

use crate::error::ConfError;
use crate::names::split_words;
use crate::value::DELIMITER;
use crate::walk::Field;

/// A provider of raw values keyed by field.
pub trait Source {
    fn source(&self, field: &Field) -> Option<String>;
}

impl<F> Source for F
where
    F: Fn(&Field) -> Option<String>,
{
    fn source(&self, field: &Field) -> Option<String> {
        self(field)
    }
}

/// A flat map from normalized keys to raw values.
///
/// Keys are lowercased with `-` replaced by `_`. A field is looked up by its
/// short alias first, then its flag name, then its path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatSource {
    values: HashMap<String, String>,
}

impl FlatSource {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), v.into()))
                .collect(),
        }
    }

    /// Flatten a JSON object. Nested objects join their keys with `_`.
    pub fn from_json(text: &str) -> Result<Self, ConfError> {
        let doc: Json = serde_json::from_str(text).map_err(|e| ConfError::Document {
            origin: "JSON source".into(),
            reason: e.to_string(),
        })?;
        Self::from_document("JSON source", doc)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self, ConfError> {
        let doc: Json = toml::from_str(text).map_err(|e| ConfError::Document {
            origin: "TOML source".into(),
            reason: e.to_string(),
        })?;
        Self::from_document("TOML source", doc)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml(text: &str) -> Result<Self, ConfError> {
        let doc: Json = serde_yaml::from_str(text).map_err(|e| ConfError::Document {
            origin: "YAML source".into(),
            reason: e.to_string(),
        })?;
        Self::from_document("YAML source", doc)
    }

    /// Flatten any serializable value, such as a clap-parsed argument
    /// struct. `None` fields are left out.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, ConfError> {
        let doc = serde_json::to_value(value).map_err(|e| ConfError::Document {
            origin: "serialized source".into(),
            reason: e.to_string(),
        })?;
        Self::from_document("serialized source", doc)
    }

    fn from_document(origin: &str, doc: Json) -> Result<Self, ConfError> {
        let Json::Object(map) = doc else {
            return Err(ConfError::Document {
                origin: origin.into(),
                reason: "top level must be a table of keys".into(),
            });
        };
        let mut values = HashMap::new();
        for (key, value) in map {
            flatten_into(&mut values, normalize(&key), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for FlatSource {
    fn source(&self, field: &Field) -> Option<String> {
        if let Some(c) = field.short
            && let Some(value) = self.get(&c.to_string())
        {
            return Some(value.to_string());
        }
        if let Some(value) = self.get(&field.flag_name) {
            return Some(value.to_string());
        }
        let by_path = field
            .path
            .iter()
            .flat_map(|s| split_words(s))
            .collect::<Vec<_>>()
            .join("_");
        self.get(&by_path).map(str::to_string)
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase().replace('-', "_")
}

fn flatten_into(out: &mut HashMap<String, String>, key: String, value: Json) {
    match value {
        Json::Object(map) => {
            for (sub, value) in map {
                flatten_into(out, format!("{key}_{}", normalize(&sub)), value);
            }
        }
        Json::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(scalar_text).collect();
            out.insert(key, parts.join(DELIMITER));
        }
        other => {
            if let Some(text) = scalar_text(other) {
                out.insert(key, text);
            }
        }
    }
}

/// Stringify a scalar. Floats drop trailing zeros and a trailing `.`.
fn scalar_text(value: Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s),
        Json::Bool(b) => Some(b.to_string()),
        Json::Number(n) if n.is_f64() => n.as_f64().map(|f| {
            let text = format!("{f:.6}");
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }),
        Json::Number(n) => Some(n.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::FieldOptions;
    use crate::types::{Kind, ScalarKind};

    fn field(path: &[&str], flag: &str, short: Option<char>) -> Field {
        Field {
            path: path.iter().map(|s| s.to_string()).collect(),
            flag_name: flag.to_string(),
            short,
            env_key: String::new(),
            options: FieldOptions::default(),
            kind: Kind::Scalar(ScalarKind::String),
            slot: 0,
            entry: None,
        }
    }

    #[test]
    fn json_scalars_stringified() {
        let src =
            FlatSource::from_json(r#"{"a_string": "s", "bool": true, "n": 3, "f": 1.50, "x": null}"#)
                .unwrap();
        assert_eq!(src.get("a_string"), Some("s"));
        assert_eq!(src.get("bool"), Some("true"));
        assert_eq!(src.get("n"), Some("3"));
        assert_eq!(src.get("f"), Some("1.5"));
        assert_eq!(src.get("x"), None);
    }

    #[test]
    fn whole_float_drops_decimal_point() {
        let src = FlatSource::from_json(r#"{"ratio": 2.0}"#).unwrap();
        assert_eq!(src.get("ratio"), Some("2"));
    }

    #[test]
    fn nested_objects_flatten_with_underscore() {
        let src = FlatSource::from_json(r#"{"ip": {"name": "local", "endpoints": ["a", "b"]}}"#)
            .unwrap();
        assert_eq!(src.get("ip_name"), Some("local"));
        assert_eq!(src.get("ip-endpoints"), Some("a;b"));
    }

    #[test]
    fn keys_are_normalized() {
        let src = FlatSource::from_pairs([("A-String", "x")]);
        assert_eq!(src.get("a_string"), Some("x"));
        assert_eq!(src.len(), 1);
    }

    #[test]
    fn short_alias_looked_up_first() {
        let src = FlatSource::from_pairs([("d", "1m"), ("e_dur", "2m")]);
        let f = field(&["duration"], "e-dur", Some('d'));
        assert_eq!(src.source(&f).as_deref(), Some("1m"));
    }

    #[test]
    fn flag_name_then_path() {
        let by_flag = FlatSource::from_pairs([("e_dur", "2m")]);
        let by_path = FlatSource::from_pairs([("duration", "3m")]);
        let f = field(&["duration"], "e-dur", None);
        assert_eq!(by_flag.source(&f).as_deref(), Some("2m"));
        assert_eq!(by_path.source(&f).as_deref(), Some("3m"));
    }

    #[test]
    fn non_object_document_rejected() {
        assert!(matches!(
            FlatSource::from_json("[1, 2]"),
            Err(ConfError::Document { .. })
        ));
        assert!(FlatSource::from_json("{").is_err());
    }

    #[test]
    fn from_serialize_skips_none() {
        #[derive(Serialize)]
        struct Cli {
            port: Option<u16>,
            host: Option<String>,
        }
        let src = FlatSource::from_serialize(&Cli {
            port: Some(9000),
            host: None,
        })
        .unwrap();
        assert_eq!(src.get("port"), Some("9000"));
        assert_eq!(src.get("host"), None);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_tables_flatten() {
        let src = FlatSource::from_toml("an_int = 4\n[ip]\nname = \"t\"\n").unwrap();
        assert_eq!(src.get("an_int"), Some("4"));
        assert_eq!(src.get("ip_name"), Some("t"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_document() {
        let src = FlatSource::from_yaml("a_string: y\nbool: false\n").unwrap();
        assert_eq!(src.get("a_string"), Some("y"));
        assert_eq!(src.get("bool"), Some("false"));
    }

    #[test]
    fn closure_is_a_source() {
        let src = |f: &Field| (f.flag_name == "port").then(|| "1".to_string());
        assert_eq!(src.source(&field(&["port"], "port", None)).as_deref(), Some("1"));
        assert_eq!(src.source(&field(&["host"], "host", None)), None);
    }
}
