//! Text coercion for every supported field type.
//!
//! [`Value`] is the seam between the engine and a field: parse from text,
//! render to text, and report whether the current value is the type's zero
//! value. Scalars, `Vec`, `Option` and string-keyed maps are covered here;
//! any other type implements [`Value`] itself and shows up as a custom
//! (`<value>`) field.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{Args, Kind, ScalarKind, Version};

/// Error returned by a field's own parsing.
pub type SetError = Box<dyn std::error::Error + Send + Sync>;

/// Separates elements of slices and pairs of whole-map values.
pub const DELIMITER: &str = ";";

/// A configuration leaf that can be set from, and rendered to, text.
pub trait Value {
    fn kind(&self) -> Kind {
        Kind::Custom
    }

    /// Replace the value with one parsed from `raw`.
    fn set(&mut self, raw: &str) -> Result<(), SetError>;

    /// Render the current value as text.
    fn render(&self) -> String;

    fn is_zero(&self) -> bool;

    /// Existing keys, for map values. Sorted.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Set one existing map entry.
    fn set_entry(&mut self, key: &str, _raw: &str) -> Result<(), SetError> {
        Err(format!("no entry '{key}'").into())
    }

    #[doc(hidden)]
    fn as_args(&mut self) -> Option<&mut Args> {
        None
    }

    #[doc(hidden)]
    fn as_version(&self) -> Option<&Version> {
        None
    }
}

/// A single textual value: the element type of slices, maps and options.
pub trait Scalar: Sized {
    const KIND: ScalarKind;

    fn parse_text(raw: &str) -> Result<Self, SetError>;

    fn render_text(&self) -> String;

    fn is_zero_value(&self) -> bool;
}

macro_rules! int_scalar {
    ($kind:ident: $($t:ty),*) => {$(
        impl Scalar for $t {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn parse_text(raw: &str) -> Result<Self, SetError> {
                Ok(raw.trim().parse::<$t>()?)
            }

            fn render_text(&self) -> String {
                self.to_string()
            }

            fn is_zero_value(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

int_scalar!(Int: i8, i16, i32, i64, i128, isize);
int_scalar!(Uint: u8, u16, u32, u64, u128, usize);

macro_rules! float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const KIND: ScalarKind = ScalarKind::Float;

            fn parse_text(raw: &str) -> Result<Self, SetError> {
                Ok(raw.trim().parse::<$t>()?)
            }

            fn render_text(&self) -> String {
                self.to_string()
            }

            fn is_zero_value(&self) -> bool {
                *self == 0.0
            }
        }
    )*};
}

float_scalar!(f32, f64);

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn parse_text(raw: &str) -> Result<Self, SetError> {
        parse_bool(raw)
    }

    fn render_text(&self) -> String {
        self.to_string()
    }

    fn is_zero_value(&self) -> bool {
        !*self
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_text(raw: &str) -> Result<Self, SetError> {
        Ok(raw.to_string())
    }

    fn render_text(&self) -> String {
        self.clone()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl Scalar for PathBuf {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_text(raw: &str) -> Result<Self, SetError> {
        Ok(PathBuf::from(raw))
    }

    fn render_text(&self) -> String {
        self.display().to_string()
    }

    fn is_zero_value(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl Scalar for Duration {
    const KIND: ScalarKind = ScalarKind::Duration;

    fn parse_text(raw: &str) -> Result<Self, SetError> {
        parse_duration(raw)
    }

    fn render_text(&self) -> String {
        format_duration(*self)
    }

    fn is_zero_value(&self) -> bool {
        self.is_zero()
    }
}

macro_rules! scalar_value {
    ($($t:ty),*) => {$(
        impl Value for $t {
            fn kind(&self) -> Kind {
                Kind::Scalar(<$t as Scalar>::KIND)
            }

            fn set(&mut self, raw: &str) -> Result<(), SetError> {
                *self = <$t as Scalar>::parse_text(raw)?;
                Ok(())
            }

            fn render(&self) -> String {
                self.render_text()
            }

            fn is_zero(&self) -> bool {
                self.is_zero_value()
            }
        }
    )*};
}

scalar_value!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, String,
    PathBuf, Duration
);

impl<T: Scalar> Value for Option<T> {
    fn kind(&self) -> Kind {
        Kind::Scalar(T::KIND)
    }

    fn set(&mut self, raw: &str) -> Result<(), SetError> {
        *self = Some(T::parse_text(raw)?);
        Ok(())
    }

    fn render(&self) -> String {
        self.as_ref().map(Scalar::render_text).unwrap_or_default()
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Scalar> Value for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::Slice(T::KIND)
    }

    /// An empty string clears the sequence.
    fn set(&mut self, raw: &str) -> Result<(), SetError> {
        if raw.is_empty() {
            self.clear();
            return Ok(());
        }
        *self = raw
            .split(DELIMITER)
            .map(T::parse_text)
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn render(&self) -> String {
        self.iter()
            .map(Scalar::render_text)
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Split `key:value;key:value` into pairs.
fn split_pairs(raw: &str) -> Result<Vec<(&str, &str)>, SetError> {
    raw.split(DELIMITER)
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            pair.split_once(':')
                .map(|(k, v)| (k.trim(), v))
                .ok_or_else(|| format!("invalid map entry '{pair}', expected key:value").into())
        })
        .collect()
}

fn render_pairs<'m, T: Scalar + 'm>(entries: impl Iterator<Item = (&'m String, &'m T)>) -> String {
    entries
        .map(|(k, v)| format!("{k}:{}", v.render_text()))
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

impl<T: Scalar> Value for BTreeMap<String, T> {
    fn kind(&self) -> Kind {
        Kind::Map(T::KIND)
    }

    /// Fills an empty map from the whole-map form. On a non-empty map only
    /// keys already present are updated.
    fn set(&mut self, raw: &str) -> Result<(), SetError> {
        let fill = self.is_empty();
        for (key, text) in split_pairs(raw)? {
            if fill || self.contains_key(key) {
                self.insert(key.to_string(), T::parse_text(text)?);
            }
        }
        Ok(())
    }

    fn render(&self) -> String {
        render_pairs(self.iter())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn set_entry(&mut self, key: &str, raw: &str) -> Result<(), SetError> {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = T::parse_text(raw)?;
                Ok(())
            }
            None => Err(format!("no entry '{key}'").into()),
        }
    }
}

impl<T: Scalar, S: BuildHasher> Value for HashMap<String, T, S> {
    fn kind(&self) -> Kind {
        Kind::Map(T::KIND)
    }

    fn set(&mut self, raw: &str) -> Result<(), SetError> {
        let fill = self.is_empty();
        for (key, text) in split_pairs(raw)? {
            if fill || self.contains_key(key) {
                self.insert(key.to_string(), T::parse_text(text)?);
            }
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        render_pairs(entries.into_iter())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = HashMap::keys(self).cloned().collect();
        keys.sort();
        keys
    }

    fn set_entry(&mut self, key: &str, raw: &str) -> Result<(), SetError> {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = T::parse_text(raw)?;
                Ok(())
            }
            None => Err(format!("no entry '{key}'").into()),
        }
    }
}

impl Value for Args {
    fn kind(&self) -> Kind {
        Kind::Args
    }

    fn set(&mut self, raw: &str) -> Result<(), SetError> {
        self.0 = raw.split_whitespace().map(String::from).collect();
        Ok(())
    }

    fn render(&self) -> String {
        self.0.join(" ")
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn as_args(&mut self) -> Option<&mut Args> {
        Some(self)
    }
}

impl Value for Version {
    fn kind(&self) -> Kind {
        Kind::Version
    }

    fn set(&mut self, _raw: &str) -> Result<(), SetError> {
        Err("version metadata is not configurable".into())
    }

    fn render(&self) -> String {
        self.text()
    }

    fn is_zero(&self) -> bool {
        self.build.is_empty() && self.desc.is_empty()
    }

    fn as_version(&self) -> Option<&Version> {
        Some(self)
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, SetError> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(format!("invalid boolean '{other}'").into()),
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Each component is a decimal number followed by one of `ns`, `us` (`µs`),
/// `ms`, `s`, `m`, `h`. A bare `0` is zero. Negative values are rejected.
pub fn parse_duration(raw: &str) -> Result<Duration, SetError> {
    let text = raw.trim();
    let body = text.strip_prefix('+').unwrap_or(text);
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.starts_with('-') {
        return Err(format!("negative duration '{text}'").into());
    }
    if body.is_empty() {
        return Err("empty duration".into());
    }

    let mut total: u128 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, after) = rest.split_at(num_end);
        if number.is_empty() || number == "." {
            return Err(format!("invalid duration '{text}'").into());
        }
        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_end);
        if unit.is_empty() {
            return Err(format!("missing unit in duration '{text}'").into());
        }
        let scale =
            unit_nanos(unit).ok_or_else(|| format!("unknown unit '{unit}' in duration '{text}'"))?;

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| format!("invalid duration '{text}'"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("duration '{text}' overflows"))?;
        if !frac.is_empty() {
            let digits = frac.len().min(18) as u32;
            let frac_value: u128 = frac[..digits as usize]
                .parse()
                .map_err(|_| format!("invalid duration '{text}'"))?;
            nanos += frac_value * scale / 10u128.pow(digits);
        }
        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration '{text}' overflows"))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| format!("duration '{text}' overflows"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Render a duration in the same grammar [`parse_duration`] reads:
/// `0s`, `1.5ms`, `1m0s`, `1h30m0s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos / 1_000, nanos % 1_000, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos / 1_000_000, nanos % 1_000_000, 6));
    }

    let secs = nanos / NANOS_PER_SEC;
    let (hours, minutes, seconds) = (secs / 3_600, secs % 3_600 / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&decimal(seconds, nanos % NANOS_PER_SEC, 9));
    out.push('s');
    out
}

fn decimal(whole: u128, frac: u128, digits: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0digits$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
