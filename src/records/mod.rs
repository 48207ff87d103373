//! Fixed-width record engine.
//!
//! A record is an ordered set of field values selected by a per-(version,
//! record-type) profile. The engine renders and parses complete lines and
//! owns the 19-character record prefix shared by all non-control record
//! types. Field tables live in [`profiles`]; this module holds the generic
//! machinery.
//!
//! One engine instance is parameterized by a [`CwrVersion`] picked once per
//! transmission; there is no per-version record code anywhere else.

pub mod profiles;

use crate::error::{RecordError, RecordResult};
use crate::fields::{decode_field, encode_field, FieldDescriptor, FieldKind, FieldValue, FieldValues};
use crate::version::CwrVersion;

/// Length of the record prefix on non-control records.
pub const PREFIX_LEN: usize = 19;

/// Length of the 3-character record type tag.
pub const RECORD_TYPE_LEN: usize = 3;

// =============================================================================
// Record Prefix
// =============================================================================

/// The 19-character key carried by every non-control record line:
/// type (3) + transaction sequence (8) + record sequence (8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPrefix {
    pub record_type: String,
    pub transaction_sequence: u32,
    pub record_sequence: u32,
}

impl RecordPrefix {
    pub fn new(record_type: impl Into<String>, transaction_sequence: u32, record_sequence: u32) -> Self {
        Self {
            record_type: record_type.into(),
            transaction_sequence,
            record_sequence,
        }
    }

    /// Render as exactly 19 ASCII characters, numerics zero-padded.
    pub fn render(&self) -> String {
        format!(
            "{:<3.3}{:08}{:08}",
            self.record_type, self.transaction_sequence, self.record_sequence
        )
    }

    /// Parse the prefix off the front of a line.
    pub fn parse(line: &str) -> RecordResult<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < PREFIX_LEN {
            return Err(RecordError::InvalidPrefix(format!(
                "line is {} bytes, prefix needs {}",
                bytes.len(),
                PREFIX_LEN
            )));
        }
        let record_type = String::from_utf8_lossy(&bytes[..RECORD_TYPE_LEN]).to_string();
        if record_type.trim().len() != RECORD_TYPE_LEN
            || !record_type.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(RecordError::InvalidPrefix(format!(
                "bad record type tag '{record_type}'"
            )));
        }
        let transaction_sequence = parse_prefix_number(&bytes[3..11], "transaction sequence")?;
        let record_sequence = parse_prefix_number(&bytes[11..19], "record sequence")?;
        Ok(Self {
            record_type,
            transaction_sequence,
            record_sequence,
        })
    }
}

fn parse_prefix_number(raw: &[u8], what: &str) -> RecordResult<u32> {
    let text = String::from_utf8_lossy(raw);
    text.trim().parse::<u32>().map_err(|_| {
        RecordError::InvalidPrefix(format!("bad {what} '{text}'"))
    })
}

// =============================================================================
// Record Profiles
// =============================================================================

/// Layout of one record type for one protocol version.
///
/// `fields` are ordered by ascending offset; `total_width` is the full line
/// width including the type tag or prefix region.
#[derive(Debug)]
pub struct RecordProfile {
    pub record_type: &'static str,
    pub total_width: usize,
    pub has_prefix: bool,
    pub fields: &'static [FieldDescriptor],
}

/// A decoded line: the prefix (when the record type carries one) plus the
/// named field values.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub prefix: Option<RecordPrefix>,
    pub values: FieldValues,
}

// =============================================================================
// Record Engine
// =============================================================================

/// Renders and parses complete fixed-width record lines.
#[derive(Debug, Clone, Copy)]
pub struct RecordEngine {
    version: CwrVersion,
}

impl RecordEngine {
    pub fn new(version: CwrVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> CwrVersion {
        self.version
    }

    /// Field table for a record type under this engine's version.
    pub fn profile(&self, record_type: &str) -> Option<&'static RecordProfile> {
        profiles::profile(self.version, record_type)
    }

    /// Render a complete line.
    ///
    /// Prefix-bearing records must be given their prefix. Required fields
    /// must be present unless the field kind has a defined rendering for
    /// emptiness (dates and times with a default-to-now policy). Fields are
    /// concatenated in ascending offset order.
    pub fn encode(
        &self,
        profile: &RecordProfile,
        values: &FieldValues,
        prefix: Option<&RecordPrefix>,
    ) -> RecordResult<String> {
        let mut line = String::with_capacity(profile.total_width);
        if profile.has_prefix {
            let prefix = prefix
                .ok_or_else(|| RecordError::MissingPrefix(profile.record_type.to_string()))?;
            if prefix.record_type != profile.record_type {
                return Err(RecordError::InvalidPrefix(format!(
                    "prefix type '{}' does not match record type '{}'",
                    prefix.record_type, profile.record_type
                )));
            }
            line.push_str(&prefix.render());
        } else {
            line.push_str(profile.record_type);
        }

        check_cross_fields(profile, values)?;

        for desc in profile.fields {
            if desc.required && values.is_blank(desc.name) && !defaults_when_empty(desc) {
                return Err(RecordError::MissingField(desc.name.to_string()));
            }
            // Tables are contiguous, but tolerate declared gaps.
            while line.chars().count() < desc.offset {
                line.push(' ');
            }
            let value = values.get(desc.name).unwrap_or(&FieldValue::Empty);
            line.push_str(&encode_field(desc, value)?);
        }
        while line.chars().count() < profile.total_width {
            line.push(' ');
        }
        Ok(line)
    }

    /// Parse a complete line into named values.
    ///
    /// Slicing is byte-based, matching how lines were written. A line that
    /// cuts off a required field fails with `TruncatedRecord` naming the
    /// first such field; a line ending where only optional trailing fields
    /// remain is accepted, those fields decoding as empty (real 2.1 senders
    /// drop the HDR character-set tail, ending the header at 86 bytes).
    pub fn decode(&self, profile: &RecordProfile, line: &str) -> RecordResult<DecodedRecord> {
        let line = line.trim_end_matches(['\r', '\n']);
        let bytes = line.as_bytes();

        let prefix = if profile.has_prefix {
            Some(RecordPrefix::parse(line)?)
        } else {
            None
        };

        let padded;
        let bytes = if bytes.len() < profile.total_width {
            if let Some(desc) = profile
                .fields
                .iter()
                .find(|d| d.required && d.offset + d.width > bytes.len())
            {
                return Err(RecordError::TruncatedRecord {
                    missing_field: desc.name.to_string(),
                    expected: profile.total_width,
                    actual: bytes.len(),
                });
            }
            padded = {
                let mut buf = bytes.to_vec();
                buf.resize(profile.total_width, b' ');
                buf
            };
            &padded[..]
        } else {
            bytes
        };

        let mut values = FieldValues::new();
        for desc in profile.fields {
            let raw = String::from_utf8_lossy(&bytes[desc.offset..desc.offset + desc.width]);
            values.set(desc.name, decode_field(desc, &raw)?);
        }
        Ok(DecodedRecord { prefix, values })
    }
}

/// Empty required dates/times with a default-to-now policy render themselves.
fn defaults_when_empty(desc: &FieldDescriptor) -> bool {
    matches!(
        desc.kind,
        FieldKind::Date(crate::fields::EmptyDate::Today)
            | FieldKind::Time(crate::fields::EmptyTime::Now)
    )
}

/// Record-specific checks spanning more than one field.
fn check_cross_fields(profile: &RecordProfile, values: &FieldValues) -> RecordResult<()> {
    match profile.record_type {
        "NWR" | "REV" => {
            let composite = !values.is_blank("composite_type");
            let count = !values.is_blank("composite_component_count");
            if composite != count {
                return Err(RecordError::InvalidRecord {
                    record_type: profile.record_type.to_string(),
                    message: "composite_type and composite_component_count must both be \
                              present or both be absent"
                        .to_string(),
                });
            }
        }
        "REC" => {
            let populated = profile
                .fields
                .iter()
                .filter(|d| !d.required)
                .any(|d| !values.is_blank(d.name));
            if !populated {
                return Err(RecordError::InvalidRecord {
                    record_type: "REC".to_string(),
                    message: "at least one optional field must be populated".to_string(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldValue;
    use chrono::{NaiveDate, NaiveTime};

    fn engine21() -> RecordEngine {
        RecordEngine::new(CwrVersion::V21)
    }

    fn engine22() -> RecordEngine {
        RecordEngine::new(CwrVersion::V22)
    }

    fn ack_values() -> FieldValues {
        FieldValues::new()
            .with("creation_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()))
            .with("creation_time", FieldValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()))
            .with("original_group_id", FieldValue::Number(1))
            .with("original_transaction_sequence", FieldValue::Number(0))
            .with("original_transaction_type", FieldValue::text("NWR"))
            .with("creation_title", FieldValue::text("My Song"))
            .with("submitter_creation_number", FieldValue::text("SUB001"))
            .with("processing_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()))
            .with("transaction_status", FieldValue::text("AS"))
    }

    #[test]
    fn test_prefix_renders_19_chars() {
        let prefix = RecordPrefix::new("ACK", 3, 12);
        let rendered = prefix.render();
        assert_eq!(rendered, "ACK0000000300000012");
        assert_eq!(rendered.len(), PREFIX_LEN);
        assert_eq!(RecordPrefix::parse(&rendered).unwrap(), prefix);
    }

    #[test]
    fn test_prefix_parse_rejects_short_line() {
        let err = RecordPrefix::parse("ACK001").unwrap_err();
        assert!(matches!(err, RecordError::InvalidPrefix(_)));
    }

    #[test]
    fn test_prefix_parse_rejects_non_numeric_sequence() {
        let err = RecordPrefix::parse("ACK0000000X00000001").unwrap_err();
        assert!(matches!(err, RecordError::InvalidPrefix(_)));
    }

    #[test]
    fn test_encode_without_prefix_fails() {
        let engine = engine21();
        let profile = engine.profile("ACK").unwrap();
        let err = engine.encode(profile, &ack_values(), None).unwrap_err();
        assert!(matches!(err, RecordError::MissingPrefix(_)));
    }

    #[test]
    fn test_encode_prefix_type_must_match() {
        let engine = engine21();
        let profile = engine.profile("ACK").unwrap();
        let prefix = RecordPrefix::new("MSG", 0, 0);
        let err = engine.encode(profile, &ack_values(), Some(&prefix)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPrefix(_)));
    }

    #[test]
    fn test_ack_roundtrip() {
        let engine = engine21();
        let profile = engine.profile("ACK").unwrap();
        let prefix = RecordPrefix::new("ACK", 0, 0);
        let line = engine.encode(profile, &ack_values(), Some(&prefix)).unwrap();
        assert_eq!(line.len(), profile.total_width);

        let decoded = engine.decode(profile, &line).unwrap();
        assert_eq!(decoded.prefix.unwrap(), prefix);
        assert_eq!(decoded.values.text("original_transaction_type"), Some("NWR"));
        assert_eq!(decoded.values.text("creation_title"), Some("MY SONG"));
        assert_eq!(decoded.values.number("original_group_id"), Some(1));
        assert_eq!(decoded.values.text("transaction_status"), Some("AS"));
    }

    #[test]
    fn test_missing_required_field() {
        let engine = engine21();
        let profile = engine.profile("ACK").unwrap();
        let mut values = ack_values();
        values.set("transaction_status", FieldValue::Empty);
        let prefix = RecordPrefix::new("ACK", 0, 0);
        let err = engine.encode(profile, &values, Some(&prefix)).unwrap_err();
        assert_eq!(err, RecordError::MissingField("transaction_status".into()));
    }

    #[test]
    fn test_decode_truncated_names_cut_field() {
        let engine = engine21();
        let profile = engine.profile("ACK").unwrap();
        let prefix = RecordPrefix::new("ACK", 0, 0);
        let line = engine.encode(profile, &ack_values(), Some(&prefix)).unwrap();
        let err = engine.decode(profile, &line[..40]).unwrap_err();
        match err {
            RecordError::TruncatedRecord { missing_field, expected, actual } => {
                assert_eq!(missing_field, "original_transaction_sequence");
                assert_eq!(expected, profile.total_width);
                assert_eq!(actual, 40);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hdr_21_and_22_widths() {
        let values = FieldValues::new()
            .with("sender_type", FieldValue::text("PB"))
            .with("sender_id", FieldValue::Number(123456789))
            .with("sender_name", FieldValue::text("Acme Publishing"))
            .with("edi_version", FieldValue::text("01.10"))
            .with("creation_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()))
            .with("creation_time", FieldValue::Time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()))
            .with("transmission_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));

        let engine = engine21();
        let profile = engine.profile("HDR").unwrap();
        let line = engine.encode(profile, &values, None).unwrap();
        assert_eq!(line.len(), 101);
        assert!(line.starts_with("HDRPB123456789ACME PUBLISHING"));

        let v22 = values
            .clone()
            .with("cwr_version", FieldValue::text("2.2"))
            .with("revision", FieldValue::Number(0));
        let engine = engine22();
        let profile = engine.profile("HDR").unwrap();
        let line = engine.encode(profile, &v22, None).unwrap();
        assert_eq!(line.len(), 167);
    }

    #[test]
    fn test_hdr_21_without_character_set_tail() {
        // 2.1 senders that omit the optional character set end the line
        // at 86 bytes; only a cut required field is a truncation.
        let values = FieldValues::new()
            .with("sender_type", FieldValue::text("SO"))
            .with("sender_id", FieldValue::Number(12345678))
            .with("sender_name", FieldValue::text("Test Society"))
            .with("edi_version", FieldValue::text("01.10"))
            .with("creation_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()))
            .with("creation_time", FieldValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()))
            .with("transmission_date", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));

        let engine = engine21();
        let profile = engine.profile("HDR").unwrap();
        let line = engine.encode(profile, &values, None).unwrap();

        let decoded = engine.decode(profile, &line[..86]).unwrap();
        assert_eq!(decoded.values.text("sender_name"), Some("TEST SOCIETY"));
        assert!(decoded.values.is_blank("character_set"));

        // One byte less cuts the required transmission date.
        let err = engine.decode(profile, &line[..85]).unwrap_err();
        match err {
            RecordError::TruncatedRecord { missing_field, actual, .. } => {
                assert_eq!(missing_field, "transmission_date");
                assert_eq!(actual, 85);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nwr_composite_cross_field_check() {
        let engine = engine21();
        let profile = engine.profile("NWR").unwrap();
        let prefix = RecordPrefix::new("NWR", 0, 1);
        let values = FieldValues::new()
            .with("work_title", FieldValue::text("My Song"))
            .with("submitter_work_number", FieldValue::text("SUB001"))
            .with("musical_work_distribution_category", FieldValue::text("POP"))
            .with("recorded_indicator", FieldValue::Flag(Some(true)))
            .with("version_type", FieldValue::text("ORI"))
            .with("composite_type", FieldValue::text("MED"));
        let err = engine.encode(profile, &values, Some(&prefix)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidRecord { .. }));

        let values = values.with("composite_component_count", FieldValue::Number(3));
        let line = engine.encode(profile, &values, Some(&prefix)).unwrap();
        assert_eq!(line.len(), profile.total_width);
    }

    #[test]
    fn test_rec_requires_one_populated_optional() {
        let engine = engine21();
        let profile = engine.profile("REC").unwrap();
        let prefix = RecordPrefix::new("REC", 0, 4);
        let err = engine
            .encode(profile, &FieldValues::new(), Some(&prefix))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidRecord { .. }));

        let values = FieldValues::new().with("isrc", FieldValue::text("USRC17607839"));
        let line = engine.encode(profile, &values, Some(&prefix)).unwrap();
        assert_eq!(line.len(), profile.total_width);
    }

    #[test]
    fn test_grt_line_matches_expected_layout() {
        let engine = engine21();
        let profile = engine.profile("GRT").unwrap();
        let values = FieldValues::new()
            .with("group_id", FieldValue::Number(1))
            .with("transaction_count", FieldValue::Number(1))
            .with("record_count", FieldValue::Number(3));
        let line = engine.encode(profile, &values, None).unwrap();
        assert_eq!(line, "GRT000010000000100000003");
    }
}
