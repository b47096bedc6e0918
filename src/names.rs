//! Flag and environment key derivation from a field path.
//!
//! Every path segment is broken into words, then the words of all segments
//! are joined: lowercase with `-` for flags, uppercase with `_` for
//! environment keys.
//!
//! | Path | Flag | Env (namespace `APP`) |
//! |------|------|-----------------------|
//! | `an_int` | `an-int` | `APP_AN_INT` |
//! | `ip`, `name` | `ip-name` | `APP_IP_NAME` |
//! | `DebugHost` | `debug-host` | `APP_DEBUG_HOST` |
//! | `IPAddr` | `ip-addr` | `APP_IP_ADDR` |

/// Split one path segment into words.
///
/// Breaks on `_`, `-` and spaces, on a lower-to-upper case change, and before
/// the last capital of an acronym run (`IPAddr` → `IP`, `Addr`). Digits stay
/// with the word they follow.
pub fn split_words(segment: &str) -> Vec<String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn path_words(path: &[String]) -> Vec<String> {
    path.iter().flat_map(|s| split_words(s)).collect()
}

/// The kebab-case flag name for a path.
pub fn flag_name(path: &[String]) -> String {
    path_words(path)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// The upper-snake-case environment key for a path, without namespace.
pub fn env_name(path: &[String]) -> String {
    path_words(path)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Apply the namespace prefix to an environment key.
///
/// The key is uppercased and `-` becomes `_`.
pub fn namespaced(namespace: &str, key: &str) -> String {
    let key = key.to_uppercase().replace('-', "_");
    if namespace.is_empty() {
        key
    } else {
        format!("{}_{key}", namespace.to_uppercase())
    }
}
