//! Typed encode/decode primitives for single fixed-width fields.
//!
//! Every CWR field is one of six kinds (alphanumeric, numeric, date, time,
//! enum, flag), each with its own padding, justification and default-on-empty
//! rules. This module knows nothing about records: it operates on one field
//! at a time, driven by a [`FieldDescriptor`].
//!
//! Widths are character counts, not byte counts. Padding is computed from
//! the character length so a value holding multi-byte characters still
//! occupies the declared number of characters and downstream fixed-offset
//! slicing stays aligned.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;

use crate::error::{FieldError, FieldResult};

/// Date format used by every CWR date field.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Time format used by every CWR time field.
pub const TIME_FORMAT: &str = "%H%M%S";

// =============================================================================
// Field Descriptors
// =============================================================================

/// Default applied when a date field is encoded without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDate {
    /// Render literal zeros ("00000000").
    Zeros,
    /// Render the current date.
    Today,
}

/// Default applied when a time field is encoded without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyTime {
    /// Render literal zeros ("000000").
    Zeros,
    /// Render the current time.
    Now,
}

/// The six CWR field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Uppercased printable-ASCII text, left-justified, space-padded.
    AlphaNumeric,
    /// Right-justified, zero-filled unsigned integer.
    Numeric,
    /// YYYYMMDD calendar date.
    Date(EmptyDate),
    /// HHMMSS time of day.
    Time(EmptyTime),
    /// Value from a closed code set.
    Enum(&'static [&'static str]),
    /// 'Y'/'N' boolean, optionally accepting 'U' for unknown.
    Flag { tri_state: bool },
}

/// Immutable description of one field inside a record layout.
///
/// Offsets are absolute byte offsets in the rendered line; for prefix-bearing
/// records the first data field starts at offset 19.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
    pub required: bool,
}

// =============================================================================
// Field Values
// =============================================================================

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Date(NaiveDate),
    Time(NaiveTime),
    /// `Some(true)` = 'Y', `Some(false)` = 'N', `None` = 'U'.
    Flag(Option<bool>),
    Empty,
}

impl FieldValue {
    /// Convenience constructor for text values.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Named field values for one record.
///
/// Fields are addressed by descriptor name, never by position, so the
/// mapping between declaration order and rendering order lives in the
/// profile alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: HashMap<String, FieldValue>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style `set`, handy in tests and record construction.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text content of a field, if it holds non-blank text.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.values.get(name) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        match self.values.get(name) {
            Some(FieldValue::Time(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<Option<bool>> {
        match self.values.get(name) {
            Some(FieldValue::Flag(f)) => Some(*f),
            _ => None,
        }
    }

    /// True when the field is absent, `Empty`, or blank text.
    pub fn is_blank(&self, name: &str) -> bool {
        self.values.get(name).map_or(true, FieldValue::is_empty)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Render one field value at its declared width.
pub fn encode_field(desc: &FieldDescriptor, value: &FieldValue) -> FieldResult<String> {
    match desc.kind {
        FieldKind::AlphaNumeric => encode_alpha(desc, value),
        FieldKind::Numeric => encode_numeric(desc, value),
        FieldKind::Date(default) => encode_date(desc, value, default),
        FieldKind::Time(default) => encode_time(desc, value, default),
        FieldKind::Enum(codes) => encode_enum(desc, value, codes),
        FieldKind::Flag { tri_state } => encode_flag(desc, value, tri_state),
    }
}

fn invalid(desc: &FieldDescriptor, value: &FieldValue) -> FieldError {
    FieldError::InvalidField {
        field: desc.name.to_string(),
        value: format!("{value:?}"),
    }
}

/// Left-justify and space-pad to `width` characters.
///
/// Padding counts characters, not bytes, so multi-byte content keeps the
/// declared character width. Overlong values are cut at the width.
fn pad_alpha(text: &str, width: usize) -> String {
    let chars = text.chars().count();
    if chars >= width {
        return text.chars().take(width).collect();
    }
    let mut out = String::with_capacity(text.len() + (width - chars));
    out.push_str(text);
    for _ in chars..width {
        out.push(' ');
    }
    out
}

fn encode_alpha(desc: &FieldDescriptor, value: &FieldValue) -> FieldResult<String> {
    let text = match value {
        FieldValue::Text(s) => s.trim().to_uppercase(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Empty => String::new(),
        _ => return Err(invalid(desc, value)),
    };
    for ch in text.chars() {
        if !('\u{20}'..='\u{7e}').contains(&ch) {
            return Err(FieldError::InvalidField {
                field: desc.name.to_string(),
                value: text.clone(),
            });
        }
    }
    Ok(pad_alpha(&text, desc.width))
}

fn encode_numeric(desc: &FieldDescriptor, value: &FieldValue) -> FieldResult<String> {
    let digits = match value {
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                "0".to_string()
            } else {
                t.parse::<u64>()
                    .map_err(|_| FieldError::InvalidField {
                        field: desc.name.to_string(),
                        value: t.to_string(),
                    })?
                    .to_string()
            }
        }
        FieldValue::Empty => "0".to_string(),
        _ => return Err(invalid(desc, value)),
    };
    if digits.len() > desc.width {
        // A wider value would shift every later offset in the line.
        return Err(FieldError::InvalidField {
            field: desc.name.to_string(),
            value: digits,
        });
    }
    Ok(format!("{digits:0>width$}", width = desc.width))
}

fn encode_date(
    desc: &FieldDescriptor,
    value: &FieldValue,
    default: EmptyDate,
) -> FieldResult<String> {
    let date = match value {
        FieldValue::Date(d) => *d,
        FieldValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(empty_date(desc, default));
            }
            NaiveDate::parse_from_str(t, DATE_FORMAT).map_err(|_| FieldError::InvalidDate {
                field: desc.name.to_string(),
                value: t.to_string(),
            })?
        }
        FieldValue::Empty => return Ok(empty_date(desc, default)),
        _ => {
            return Err(FieldError::InvalidDate {
                field: desc.name.to_string(),
                value: format!("{value:?}"),
            })
        }
    };
    Ok(date.format(DATE_FORMAT).to_string())
}

fn empty_date(desc: &FieldDescriptor, default: EmptyDate) -> String {
    match default {
        EmptyDate::Zeros => "0".repeat(desc.width),
        EmptyDate::Today => Utc::now().date_naive().format(DATE_FORMAT).to_string(),
    }
}

fn encode_time(
    desc: &FieldDescriptor,
    value: &FieldValue,
    default: EmptyTime,
) -> FieldResult<String> {
    let time = match value {
        FieldValue::Time(t) => *t,
        FieldValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(empty_time(desc, default));
            }
            NaiveTime::parse_from_str(t, TIME_FORMAT).map_err(|_| FieldError::InvalidTime {
                field: desc.name.to_string(),
                value: t.to_string(),
            })?
        }
        FieldValue::Empty => return Ok(empty_time(desc, default)),
        _ => {
            return Err(FieldError::InvalidTime {
                field: desc.name.to_string(),
                value: format!("{value:?}"),
            })
        }
    };
    Ok(time.format(TIME_FORMAT).to_string())
}

fn empty_time(desc: &FieldDescriptor, default: EmptyTime) -> String {
    match default {
        EmptyTime::Zeros => "0".repeat(desc.width),
        EmptyTime::Now => Utc::now().time().format(TIME_FORMAT).to_string(),
    }
}

fn encode_enum(
    desc: &FieldDescriptor,
    value: &FieldValue,
    codes: &'static [&'static str],
) -> FieldResult<String> {
    match value {
        FieldValue::Text(s) => {
            let code = s.trim().to_uppercase();
            if codes.contains(&code.as_str()) {
                Ok(pad_alpha(&code, desc.width))
            } else {
                Err(FieldError::InvalidEnumValue {
                    field: desc.name.to_string(),
                    value: code,
                })
            }
        }
        FieldValue::Empty => Ok(" ".repeat(desc.width)),
        _ => Err(invalid(desc, value)),
    }
}

fn encode_flag(desc: &FieldDescriptor, value: &FieldValue, tri_state: bool) -> FieldResult<String> {
    let literal = match value {
        FieldValue::Flag(Some(true)) => "Y",
        FieldValue::Flag(Some(false)) => "N",
        FieldValue::Flag(None) if tri_state => "U",
        FieldValue::Text(s) => {
            let t = s.trim().to_uppercase();
            match t.as_str() {
                "Y" => "Y",
                "N" => "N",
                "U" if tri_state => "U",
                _ => {
                    return Err(FieldError::InvalidFlag {
                        field: desc.name.to_string(),
                        value: t,
                    })
                }
            }
        }
        FieldValue::Empty => return Ok(" ".repeat(desc.width)),
        _ => {
            return Err(FieldError::InvalidFlag {
                field: desc.name.to_string(),
                value: format!("{value:?}"),
            })
        }
    };
    Ok(pad_alpha(literal, desc.width))
}

// =============================================================================
// Decoding
// =============================================================================

/// Interpret one already-sliced field region.
///
/// Padding is right-trimmed; blank regions decode to [`FieldValue::Empty`],
/// and all-zero dates and times do too.
pub fn decode_field(desc: &FieldDescriptor, raw: &str) -> FieldResult<FieldValue> {
    match desc.kind {
        FieldKind::AlphaNumeric | FieldKind::Enum(_) => {
            let trimmed = raw.trim_end();
            if trimmed.trim().is_empty() {
                Ok(FieldValue::Empty)
            } else {
                Ok(FieldValue::Text(trimmed.to_string()))
            }
        }
        FieldKind::Numeric => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Empty);
            }
            trimmed
                .parse::<u64>()
                .map(FieldValue::Number)
                .map_err(|_| FieldError::InvalidField {
                    field: desc.name.to_string(),
                    value: trimmed.to_string(),
                })
        }
        FieldKind::Date(_) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.chars().all(|c| c == '0') {
                return Ok(FieldValue::Empty);
            }
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(FieldValue::Date)
                .map_err(|_| FieldError::InvalidDate {
                    field: desc.name.to_string(),
                    value: trimmed.to_string(),
                })
        }
        FieldKind::Time(_) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.chars().all(|c| c == '0') {
                return Ok(FieldValue::Empty);
            }
            NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
                .map(FieldValue::Time)
                .map_err(|_| FieldError::InvalidTime {
                    field: desc.name.to_string(),
                    value: trimmed.to_string(),
                })
        }
        FieldKind::Flag { .. } => {
            let trimmed = raw.trim();
            match trimmed {
                "" => Ok(FieldValue::Empty),
                "Y" => Ok(FieldValue::Flag(Some(true))),
                "N" => Ok(FieldValue::Flag(Some(false))),
                "U" => Ok(FieldValue::Flag(None)),
                other => Err(FieldError::InvalidFlag {
                    field: desc.name.to_string(),
                    value: other.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn alpha(width: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: "creation_title",
            offset: 0,
            width,
            kind: FieldKind::AlphaNumeric,
            required: false,
        }
    }

    fn numeric(width: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: "group_id",
            offset: 0,
            width,
            kind: FieldKind::Numeric,
            required: false,
        }
    }

    #[test]
    fn test_alpha_trims_uppercases_and_pads() {
        let out = encode_field(&alpha(10), &FieldValue::text("  hello ")).unwrap();
        assert_eq!(out, "HELLO     ");
    }

    #[test]
    fn test_alpha_rejects_control_chars() {
        let err = encode_field(&alpha(10), &FieldValue::text("bad\u{7}value")).unwrap_err();
        assert!(matches!(err, FieldError::InvalidField { .. }));
    }

    #[test]
    fn test_alpha_rejects_non_ascii() {
        let err = encode_field(&alpha(10), &FieldValue::text("CAFÉ")).unwrap_err();
        match err {
            FieldError::InvalidField { field, value } => {
                assert_eq!(field, "creation_title");
                assert!(value.contains("CAF"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_alpha_truncates_overlong() {
        let out = encode_field(&alpha(4), &FieldValue::text("TOOLONG")).unwrap();
        assert_eq!(out, "TOOL");
    }

    #[test]
    fn test_pad_alpha_counts_characters_not_bytes() {
        // 4 characters, 7 bytes; padded result must be 10 characters.
        let out = pad_alpha("CAFÉS™", 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with("    "));
    }

    #[test]
    fn test_numeric_zero_fills() {
        let out = encode_field(&numeric(5), &FieldValue::Number(42)).unwrap();
        assert_eq!(out, "00042");
    }

    #[test]
    fn test_numeric_empty_is_zero() {
        assert_eq!(encode_field(&numeric(8), &FieldValue::Empty).unwrap(), "00000000");
        assert_eq!(
            encode_field(&numeric(8), &FieldValue::text("  ")).unwrap(),
            "00000000"
        );
    }

    #[test]
    fn test_numeric_overflow_is_rejected() {
        let err = encode_field(&numeric(3), &FieldValue::Number(12345)).unwrap_err();
        assert!(matches!(err, FieldError::InvalidField { .. }));
    }

    #[test]
    fn test_numeric_rejects_non_digits() {
        let err = encode_field(&numeric(5), &FieldValue::text("12a")).unwrap_err();
        assert!(matches!(err, FieldError::InvalidField { .. }));
    }

    #[test]
    fn test_date_roundtrip() {
        let desc = FieldDescriptor {
            name: "creation_date",
            offset: 0,
            width: 8,
            kind: FieldKind::Date(EmptyDate::Zeros),
            required: false,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let out = encode_field(&desc, &FieldValue::Date(date)).unwrap();
        assert_eq!(out, "20240315");
        assert_eq!(decode_field(&desc, &out).unwrap(), FieldValue::Date(date));
    }

    #[test]
    fn test_date_empty_policies() {
        let zeros = FieldDescriptor {
            name: "d",
            offset: 0,
            width: 8,
            kind: FieldKind::Date(EmptyDate::Zeros),
            required: false,
        };
        assert_eq!(encode_field(&zeros, &FieldValue::Empty).unwrap(), "00000000");

        let today = FieldDescriptor {
            kind: FieldKind::Date(EmptyDate::Today),
            ..zeros
        };
        let out = encode_field(&today, &FieldValue::Empty).unwrap();
        assert_eq!(out.len(), 8);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(out, "00000000");
    }

    #[test]
    fn test_date_rejects_bad_calendar_value() {
        let desc = FieldDescriptor {
            name: "d",
            offset: 0,
            width: 8,
            kind: FieldKind::Date(EmptyDate::Zeros),
            required: false,
        };
        let err = encode_field(&desc, &FieldValue::text("20241332")).unwrap_err();
        assert!(matches!(err, FieldError::InvalidDate { .. }));
    }

    #[test]
    fn test_time_roundtrip_and_zeros() {
        let desc = FieldDescriptor {
            name: "creation_time",
            offset: 0,
            width: 6,
            kind: FieldKind::Time(EmptyTime::Zeros),
            required: false,
        };
        let time = NaiveTime::from_hms_opt(13, 45, 9).unwrap();
        let out = encode_field(&desc, &FieldValue::Time(time)).unwrap();
        assert_eq!(out, "134509");
        assert_eq!(decode_field(&desc, &out).unwrap(), FieldValue::Time(time));
        assert_eq!(decode_field(&desc, "000000").unwrap(), FieldValue::Empty);
    }

    #[test]
    fn test_enum_resolves_against_code_set() {
        static CODES: &[&str] = &["ORI", "MOD", "EXC"];
        let desc = FieldDescriptor {
            name: "version_type",
            offset: 0,
            width: 3,
            kind: FieldKind::Enum(CODES),
            required: false,
        };
        assert_eq!(encode_field(&desc, &FieldValue::text("ori")).unwrap(), "ORI");
        let err = encode_field(&desc, &FieldValue::text("XXX")).unwrap_err();
        match err {
            FieldError::InvalidEnumValue { field, value } => {
                assert_eq!(field, "version_type");
                assert_eq!(value, "XXX");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_flag_tri_state() {
        let strict = FieldDescriptor {
            name: "recorded",
            offset: 0,
            width: 1,
            kind: FieldKind::Flag { tri_state: false },
            required: false,
        };
        assert_eq!(encode_field(&strict, &FieldValue::Flag(Some(true))).unwrap(), "Y");
        assert!(encode_field(&strict, &FieldValue::Flag(None)).is_err());
        assert!(encode_field(&strict, &FieldValue::text("U")).is_err());

        let tri = FieldDescriptor {
            kind: FieldKind::Flag { tri_state: true },
            ..strict
        };
        assert_eq!(encode_field(&tri, &FieldValue::Flag(None)).unwrap(), "U");
        assert_eq!(decode_field(&tri, "U").unwrap(), FieldValue::Flag(None));
    }

    #[test]
    fn test_decode_blank_is_empty() {
        assert_eq!(decode_field(&alpha(5), "     ").unwrap(), FieldValue::Empty);
        assert_eq!(decode_field(&numeric(5), "     ").unwrap(), FieldValue::Empty);
    }

    #[test]
    fn test_decode_numeric_zero() {
        assert_eq!(decode_field(&numeric(5), "00000").unwrap(), FieldValue::Number(0));
    }

    #[test]
    fn test_field_values_typed_getters() {
        let mut values = FieldValues::new();
        values.set("title", FieldValue::text("SONG"));
        values.set("seq", FieldValue::Number(7));
        assert_eq!(values.text("title"), Some("SONG"));
        assert_eq!(values.number("seq"), Some(7));
        assert!(values.is_blank("missing"));
        assert!(!values.is_blank("title"));
    }
}
