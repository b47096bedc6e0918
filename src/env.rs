//! Environment lookup for the resolver.
//!
//! Keys arrive fully derived and namespaced (`APP_IP_NAME`); this module only
//! answers whether a key is set.

use std::collections::HashMap;

/// Where environment keys are looked up.
///
/// The process environment is read at lookup time, key by key. A fixed map
/// lets tests inject variables without touching the process.
#[derive(Debug, Clone, Default)]
pub(crate) enum Environment {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl Environment {
    /// Build a fixed environment from key/value pairs.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of
    /// `std::env::vars()`.
    pub fn fixed<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Environment::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The value of `key`. A set-but-empty variable is found with an empty
    /// value; a variable holding invalid unicode is treated as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Environment::Process => std::env::var(key).ok(),
            Environment::Fixed(vars) => vars.get(key).cloned(),
        }
    }
}
