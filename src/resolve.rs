//! Core resolution pipeline: walk the fields, then assign each one from its
//! layers.
//!
//! Operates on pre-loaded inputs (`ResolveInput`), so the whole pipeline is
//! testable with synthetic argv and environment. Per field, in declaration
//! order:
//!
//! 1. The current value is the baseline (zero, or whatever a document seeded)
//! 2. The default applies if the baseline is still zero
//! 3. Lookup sources, in registration order (later wins)
//! 4. The environment key
//! 5. The command-line flag or short alias
//!
//! Steps 3-5 are ignored for immutable fields. Required and notzero are
//! checked once the field is assigned; positional arguments are captured
//! last.

use tracing::{debug, trace};

use crate::env::Environment;
use crate::error::ConfError;
use crate::flags::{self, Scan};
use crate::registry::Configure;
use crate::render::{self, mask};
use crate::source::Source;
use crate::types::Parsed;
use crate::value::Value;
use crate::walk::{self, Field};

/// Everything resolution reads besides the config itself. No I/O happens
/// here apart from process environment lookups.
pub(crate) struct ResolveInput<'s> {
    pub namespace: &'s str,
    /// argv\[0\], shown in usage text.
    pub program: &'s str,
    /// Command-line tokens after the program name.
    pub tokens: &'s [String],
    pub env: &'s Environment,
    pub sources: &'s [Box<dyn Source>],
    /// Reject unrecognized flags instead of skipping them.
    pub strict_flags: bool,
}

pub(crate) fn resolve<C: Configure + ?Sized>(
    input: &ResolveInput<'_>,
    cfg: &mut C,
) -> Result<Parsed, ConfError> {
    let mut walked = walk::discover(input.namespace, cfg)?;

    let line = match flags::scan(
        input.tokens,
        walked.flag_fields(),
        walked.version.is_some(),
        input.strict_flags,
    )? {
        Scan::Help => {
            debug!("help requested");
            return Ok(Parsed::Help(render::usage(input.program, &walked)));
        }
        Scan::Version => {
            debug!("version requested");
            return Ok(Parsed::Version(walked.version_text().unwrap_or_default()));
        }
        Scan::Flags(line) => line,
    };

    for field in walked.fields.iter().filter(|f| !f.is_special()) {
        let value: &mut dyn Value = &mut *walked.slots[field.slot];
        let name = field.name();
        let opts = &field.options;

        if field.entry.is_none()
            && let Some(default) = &opts.default
            && value.is_zero()
        {
            assign(field, value, default)?;
            trace!(field = %name, "default applied");
        }

        let mut raw: Option<(&str, String)> = None;
        for source in input.sources {
            if let Some(text) = source.source(field) {
                trace!(field = %name, "value found in lookup source");
                raw = Some(("source", text));
            }
        }
        if let Some(text) = input.env.get(&field.env_key) {
            raw = Some(("env", text));
        }
        if let Some(text) = line.get(&field.flag_name) {
            raw = Some(("flag", text.to_string()));
        }

        let found = match raw {
            Some((layer, _)) if opts.immutable => {
                debug!(field = %name, layer, "ignoring override of immutable field");
                false
            }
            Some((layer, text)) => {
                assign(field, value, &text)?;
                if opts.masked {
                    debug!(field = %name, layer, "field resolved");
                } else {
                    debug!(field = %name, layer, value = %text, "field resolved");
                }
                true
            }
            None => false,
        };

        if opts.required && !found && opts.default.is_none() && value.is_zero() {
            return Err(ConfError::MissingRequired { field: name });
        }
        if opts.not_zero && value.is_zero() {
            return Err(ConfError::ZeroValue { field: name });
        }
    }

    if let Some(slot) = walked.args
        && let Some(args) = walked.slots[slot].as_args()
    {
        debug!(count = line.positional.len(), "positional arguments captured");
        args.0 = line.positional;
    }

    debug!(fields = walked.fields.len(), "configuration resolved");
    Ok(Parsed::Resolved)
}

/// Coerce `raw` into the field's slot, naming the field on failure.
fn assign(field: &Field, value: &mut dyn Value, raw: &str) -> Result<(), ConfError> {
    let result = match &field.entry {
        Some(key) => value.set_entry(key, raw),
        None => value.set(raw),
    };
    result.map_err(|e| ConfError::InvalidValue {
        field: field.name(),
        value: if field.options.masked {
            mask(raw)
        } else {
            raw.to_string()
        },
        reason: e.to_string(),
    })
}
