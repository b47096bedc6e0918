//! Command-line scanning.
//!
//! Accepts `--name=value`, `--name value`, `-x=value`, `-x value` and bare
//! boolean switches. A single dash with a long name (`-version`) is read as
//! the long form. `--` ends flag parsing.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ConfError;
use crate::walk::Field;

/// Flag values keyed by canonical flag name, plus leftover positionals.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CommandLine {
    pub values: HashMap<String, String>,
    pub positional: Vec<String>,
}

impl CommandLine {
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Scan {
    Help,
    Version,
    Flags(CommandLine),
}

/// Scan `tokens` (program name excluded) against the known fields.
///
/// Help and version requests win as soon as they are seen. With `strict`
/// an unknown flag is an error; otherwise it is skipped along with its value.
pub(crate) fn scan<'f>(
    tokens: &[String],
    fields: impl Iterator<Item = &'f Field>,
    has_version: bool,
    strict: bool,
) -> Result<Scan, ConfError> {
    let mut known: HashMap<String, (&'f str, bool)> = HashMap::new();
    for field in fields {
        let entry = (field.flag_name.as_str(), field.kind.is_bool());
        known.insert(field.flag_name.clone(), entry);
        if let Some(c) = field.short {
            known.insert(c.to_string(), entry);
        }
    }

    let mut line = CommandLine::default();
    let mut rest = tokens.iter();

    while let Some(token) = rest.next() {
        if token == "--" {
            line.positional.extend(rest.by_ref().cloned());
            break;
        }
        let body = match token.strip_prefix("--").or_else(|| token.strip_prefix('-')) {
            Some(body) if !body.is_empty() => body,
            _ => {
                line.positional.push(token.clone());
                continue;
            }
        };
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        if name == "help" || name == "h" {
            return Ok(Scan::Help);
        }
        if has_version && (name == "version" || name == "v") {
            return Ok(Scan::Version);
        }

        let dashed = token.split_once('=').map_or(token.as_str(), |(d, _)| d);
        let Some(&(flag, is_bool)) = known.get(name) else {
            if strict {
                return Err(ConfError::UnrecognizedFlag(dashed.to_string()));
            }
            debug!(flag = dashed, "ignoring unrecognized flag");
            if inline.is_none() {
                let mut peek = rest.clone();
                if peek.next().is_some_and(|next| !next.starts_with('-')) {
                    rest = peek;
                }
            }
            continue;
        };

        let value = match inline {
            Some(value) => value.to_string(),
            None if is_bool => "true".to_string(),
            None => rest
                .next()
                .cloned()
                .ok_or_else(|| ConfError::MissingFlagValue(dashed.to_string()))?,
        };
        line.values.insert(flag.to_string(), value);
    }

    Ok(Scan::Flags(line))
}
