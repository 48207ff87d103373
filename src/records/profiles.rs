//! Static field tables per (protocol version, record type).
//!
//! Offsets and widths are the fixed external contract of the CWR wire
//! format, expressed as data rather than per-call-site code. Control
//! records (HDR, GRH, GRT, TRL) carry no prefix; their first field starts
//! right after the 3-character type tag. Every other record's data starts
//! at offset 19, after the prefix.
//!
//! Only the record types the acknowledgment path needs carry full tables
//! here; the complete CWR catalogue of detail layouts and the large code
//! tables (countries, languages, societies) are an external collaborator.

use crate::fields::{EmptyDate, EmptyTime, FieldDescriptor, FieldKind};
use crate::version::CwrVersion;

use super::RecordProfile;

const fn field(
    name: &'static str,
    offset: usize,
    width: usize,
    kind: FieldKind,
    required: bool,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        offset,
        width,
        kind,
        required,
    }
}

// =============================================================================
// Closed code sets used by ACK-path fields
// =============================================================================

/// Transaction types a group header may announce.
pub const GROUP_TRANSACTION_TYPES: &[&str] = &["ACK", "AGR", "NWR", "REV", "ISW", "EXC"];

/// Per-transaction status reported by an ACK record.
pub const TRANSACTION_STATUS_CODES: &[&str] =
    &["CO", "DU", "RA", "AS", "AC", "RJ", "NP", "RC"];

/// Message type / level share one severity ladder.
pub const MESSAGE_LEVEL_CODES: &[&str] = &["F", "R", "T", "G", "E"];

pub const DISTRIBUTION_CATEGORY_CODES: &[&str] = &["JAZ", "POP", "SER", "UNC"];
pub const TEXT_MUSIC_CODES: &[&str] = &["MUS", "MTX", "TXT", "MTN"];
pub const COMPOSITE_TYPE_CODES: &[&str] = &["COS", "MED", "POT", "UCO"];
pub const VERSION_TYPE_CODES: &[&str] = &["MOD", "ORI"];
pub const EXCERPT_TYPE_CODES: &[&str] = &["MOV", "UEX"];
pub const ARRANGEMENT_CODES: &[&str] = &["NEW", "ARR", "ADM", "UNS", "ORI"];
pub const LYRIC_ADAPTATION_CODES: &[&str] =
    &["NEW", "MOD", "NON", "ORI", "REP", "ADL", "UNS", "TRA"];
pub const RECORDING_FORMAT_CODES: &[&str] = &["A", "V"];
pub const RECORDING_TECHNIQUE_CODES: &[&str] = &["A", "D", "U"];

// =============================================================================
// Control records
// =============================================================================

const HDR_BASE: [FieldDescriptor; 8] = [
    field("sender_type", 3, 2, FieldKind::AlphaNumeric, true),
    field("sender_id", 5, 9, FieldKind::Numeric, true),
    field("sender_name", 14, 45, FieldKind::AlphaNumeric, true),
    field("edi_version", 59, 5, FieldKind::AlphaNumeric, true),
    field("creation_date", 64, 8, FieldKind::Date(EmptyDate::Today), true),
    field("creation_time", 72, 6, FieldKind::Time(EmptyTime::Now), true),
    field("transmission_date", 78, 8, FieldKind::Date(EmptyDate::Today), true),
    field("character_set", 86, 15, FieldKind::AlphaNumeric, false),
];

static HDR_22_FIELDS: [FieldDescriptor; 12] = [
    HDR_BASE[0],
    HDR_BASE[1],
    HDR_BASE[2],
    HDR_BASE[3],
    HDR_BASE[4],
    HDR_BASE[5],
    HDR_BASE[6],
    HDR_BASE[7],
    field("cwr_version", 101, 3, FieldKind::AlphaNumeric, true),
    field("revision", 104, 3, FieldKind::Numeric, true),
    field("software_package", 107, 30, FieldKind::AlphaNumeric, false),
    field("software_package_version", 137, 30, FieldKind::AlphaNumeric, false),
];

static HDR_21: RecordProfile = RecordProfile {
    record_type: "HDR",
    total_width: 101,
    has_prefix: false,
    fields: &HDR_BASE,
};

static HDR_22: RecordProfile = RecordProfile {
    record_type: "HDR",
    total_width: 167,
    has_prefix: false,
    fields: &HDR_22_FIELDS,
};

static GRH_FIELDS: [FieldDescriptor; 5] = [
    field("transaction_type", 3, 3, FieldKind::Enum(GROUP_TRANSACTION_TYPES), true),
    field("group_id", 6, 5, FieldKind::Numeric, true),
    field("version_number", 11, 5, FieldKind::AlphaNumeric, true),
    field("batch_request", 16, 10, FieldKind::Numeric, false),
    field("submission_distribution_type", 26, 2, FieldKind::AlphaNumeric, false),
];

static GRH: RecordProfile = RecordProfile {
    record_type: "GRH",
    total_width: 28,
    has_prefix: false,
    fields: &GRH_FIELDS,
};

static GRT_FIELDS: [FieldDescriptor; 3] = [
    field("group_id", 3, 5, FieldKind::Numeric, true),
    field("transaction_count", 8, 8, FieldKind::Numeric, true),
    field("record_count", 16, 8, FieldKind::Numeric, true),
];

static GRT: RecordProfile = RecordProfile {
    record_type: "GRT",
    total_width: 24,
    has_prefix: false,
    fields: &GRT_FIELDS,
};

static TRL_FIELDS: [FieldDescriptor; 3] = [
    field("group_count", 3, 5, FieldKind::Numeric, true),
    field("transaction_count", 8, 8, FieldKind::Numeric, true),
    field("record_count", 16, 8, FieldKind::Numeric, true),
];

static TRL: RecordProfile = RecordProfile {
    record_type: "TRL",
    total_width: 24,
    has_prefix: false,
    fields: &TRL_FIELDS,
};

// =============================================================================
// Acknowledgment records
// =============================================================================

static ACK_FIELDS: [FieldDescriptor; 10] = [
    field("creation_date", 19, 8, FieldKind::Date(EmptyDate::Zeros), true),
    field("creation_time", 27, 6, FieldKind::Time(EmptyTime::Zeros), true),
    field("original_group_id", 33, 5, FieldKind::Numeric, true),
    field("original_transaction_sequence", 38, 8, FieldKind::Numeric, true),
    field("original_transaction_type", 46, 3, FieldKind::AlphaNumeric, true),
    field("creation_title", 49, 60, FieldKind::AlphaNumeric, false),
    field("submitter_creation_number", 109, 20, FieldKind::AlphaNumeric, false),
    field("recipient_creation_number", 129, 20, FieldKind::AlphaNumeric, false),
    field("processing_date", 149, 8, FieldKind::Date(EmptyDate::Zeros), true),
    field("transaction_status", 157, 2, FieldKind::Enum(TRANSACTION_STATUS_CODES), true),
];

static ACK: RecordProfile = RecordProfile {
    record_type: "ACK",
    total_width: 159,
    has_prefix: true,
    fields: &ACK_FIELDS,
};

static MSG_FIELDS: [FieldDescriptor; 6] = [
    field("message_type", 19, 1, FieldKind::Enum(MESSAGE_LEVEL_CODES), true),
    field("original_record_sequence", 20, 8, FieldKind::Numeric, true),
    field("record_type", 28, 3, FieldKind::AlphaNumeric, true),
    field("message_level", 31, 1, FieldKind::Enum(MESSAGE_LEVEL_CODES), true),
    field("validation_number", 32, 3, FieldKind::AlphaNumeric, true),
    field("message_text", 35, 150, FieldKind::AlphaNumeric, true),
];

static MSG: RecordProfile = RecordProfile {
    record_type: "MSG",
    total_width: 185,
    has_prefix: true,
    fields: &MSG_FIELDS,
};

// =============================================================================
// Work registration records
// =============================================================================

const NWR_BASE: [FieldDescriptor; 24] = [
    field("work_title", 19, 60, FieldKind::AlphaNumeric, true),
    field("language_code", 79, 2, FieldKind::AlphaNumeric, false),
    field("submitter_work_number", 81, 14, FieldKind::AlphaNumeric, true),
    field("iswc", 95, 11, FieldKind::AlphaNumeric, false),
    field("copyright_date", 106, 8, FieldKind::Date(EmptyDate::Zeros), false),
    field("copyright_number", 114, 12, FieldKind::AlphaNumeric, false),
    field(
        "musical_work_distribution_category",
        126,
        3,
        FieldKind::Enum(DISTRIBUTION_CATEGORY_CODES),
        true,
    ),
    field("duration", 129, 6, FieldKind::Time(EmptyTime::Zeros), false),
    field("recorded_indicator", 135, 1, FieldKind::Flag { tri_state: true }, true),
    field("text_music_relationship", 136, 3, FieldKind::Enum(TEXT_MUSIC_CODES), false),
    field("composite_type", 139, 3, FieldKind::Enum(COMPOSITE_TYPE_CODES), false),
    field("version_type", 142, 3, FieldKind::Enum(VERSION_TYPE_CODES), true),
    field("excerpt_type", 145, 3, FieldKind::Enum(EXCERPT_TYPE_CODES), false),
    field("music_arrangement", 148, 3, FieldKind::Enum(ARRANGEMENT_CODES), false),
    field("lyric_adaptation", 151, 3, FieldKind::Enum(LYRIC_ADAPTATION_CODES), false),
    field("contact_name", 154, 30, FieldKind::AlphaNumeric, false),
    field("contact_id", 184, 10, FieldKind::AlphaNumeric, false),
    field("cwr_work_type", 194, 2, FieldKind::AlphaNumeric, false),
    field("grand_rights_indicator", 196, 1, FieldKind::Flag { tri_state: false }, false),
    field("composite_component_count", 197, 3, FieldKind::Numeric, false),
    field("date_of_publication", 200, 8, FieldKind::Date(EmptyDate::Zeros), false),
    field("exceptional_clause", 208, 1, FieldKind::Flag { tri_state: true }, false),
    field("opus_number", 209, 25, FieldKind::AlphaNumeric, false),
    field("catalogue_number", 234, 25, FieldKind::AlphaNumeric, false),
];

static NWR_22_FIELDS: [FieldDescriptor; 25] = [
    NWR_BASE[0],
    NWR_BASE[1],
    NWR_BASE[2],
    NWR_BASE[3],
    NWR_BASE[4],
    NWR_BASE[5],
    NWR_BASE[6],
    NWR_BASE[7],
    NWR_BASE[8],
    NWR_BASE[9],
    NWR_BASE[10],
    NWR_BASE[11],
    NWR_BASE[12],
    NWR_BASE[13],
    NWR_BASE[14],
    NWR_BASE[15],
    NWR_BASE[16],
    NWR_BASE[17],
    NWR_BASE[18],
    NWR_BASE[19],
    NWR_BASE[20],
    NWR_BASE[21],
    NWR_BASE[22],
    NWR_BASE[23],
    field("priority_flag", 259, 1, FieldKind::Flag { tri_state: false }, false),
];

static NWR_21: RecordProfile = RecordProfile {
    record_type: "NWR",
    total_width: 259,
    has_prefix: true,
    fields: &NWR_BASE,
};

static NWR_22: RecordProfile = RecordProfile {
    record_type: "NWR",
    total_width: 260,
    has_prefix: true,
    fields: &NWR_22_FIELDS,
};

// REV shares the NWR layout; only the type tag differs.
static REV_21: RecordProfile = RecordProfile {
    record_type: "REV",
    total_width: 259,
    has_prefix: true,
    fields: &NWR_BASE,
};

static REV_22: RecordProfile = RecordProfile {
    record_type: "REV",
    total_width: 260,
    has_prefix: true,
    fields: &NWR_22_FIELDS,
};

static EXC_FIELDS: [FieldDescriptor; 4] = [
    field("work_title", 19, 60, FieldKind::AlphaNumeric, true),
    field("language_code", 79, 2, FieldKind::AlphaNumeric, false),
    field("submitter_work_number", 81, 14, FieldKind::AlphaNumeric, false),
    field("iswc", 95, 11, FieldKind::AlphaNumeric, false),
];

static EXC: RecordProfile = RecordProfile {
    record_type: "EXC",
    total_width: 106,
    has_prefix: true,
    fields: &EXC_FIELDS,
};

static REC_FIELDS: [FieldDescriptor; 10] = [
    field("first_release_date", 19, 8, FieldKind::Date(EmptyDate::Zeros), false),
    field("first_release_duration", 27, 6, FieldKind::Time(EmptyTime::Zeros), false),
    field("album_title", 33, 60, FieldKind::AlphaNumeric, false),
    field("album_label", 93, 60, FieldKind::AlphaNumeric, false),
    field("catalogue_number", 153, 18, FieldKind::AlphaNumeric, false),
    field("ean", 171, 13, FieldKind::AlphaNumeric, false),
    field("isrc", 184, 12, FieldKind::AlphaNumeric, false),
    field("recording_format", 196, 1, FieldKind::Enum(RECORDING_FORMAT_CODES), false),
    field("recording_technique", 197, 1, FieldKind::Enum(RECORDING_TECHNIQUE_CODES), false),
    field("media_type", 198, 3, FieldKind::AlphaNumeric, false),
];

static REC: RecordProfile = RecordProfile {
    record_type: "REC",
    total_width: 201,
    has_prefix: true,
    fields: &REC_FIELDS,
};

// =============================================================================
// Lookup
// =============================================================================

/// The field table for a (version, record type) pair.
pub fn profile(version: CwrVersion, record_type: &str) -> Option<&'static RecordProfile> {
    use CwrVersion::{V21, V22};
    match (record_type, version) {
        ("HDR", V21) => Some(&HDR_21),
        ("HDR", V22) => Some(&HDR_22),
        ("GRH", _) => Some(&GRH),
        ("GRT", _) => Some(&GRT),
        ("TRL", _) => Some(&TRL),
        ("ACK", _) => Some(&ACK),
        ("MSG", _) => Some(&MSG),
        ("NWR", V21) => Some(&NWR_21),
        ("NWR", V22) => Some(&NWR_22),
        ("REV", V21) => Some(&REV_21),
        ("REV", V22) => Some(&REV_22),
        ("EXC", _) => Some(&EXC),
        ("REC", _) => Some(&REC),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(profile: &RecordProfile, data_start: usize) {
        let mut expected = data_start;
        for f in profile.fields {
            assert_eq!(
                f.offset, expected,
                "field '{}' of {} starts at {} (expected {})",
                f.name, profile.record_type, f.offset, expected
            );
            expected += f.width;
        }
        assert_eq!(
            expected, profile.total_width,
            "{} declared width mismatch",
            profile.record_type
        );
    }

    #[test]
    fn test_tables_are_contiguous_and_width_consistent() {
        for version in [CwrVersion::V21, CwrVersion::V22] {
            for rt in ["HDR", "GRH", "GRT", "TRL", "ACK", "MSG", "NWR", "REV", "EXC", "REC"] {
                let p = profile(version, rt).unwrap();
                let data_start = if p.has_prefix { 19 } else { 3 };
                assert_contiguous(p, data_start);
            }
        }
    }

    #[test]
    fn test_hdr_widths_match_version_heuristic() {
        assert_eq!(profile(CwrVersion::V21, "HDR").unwrap().total_width, 101);
        assert_eq!(profile(CwrVersion::V22, "HDR").unwrap().total_width, 167);
    }

    #[test]
    fn test_control_records_have_no_prefix() {
        for rt in ["HDR", "GRH", "GRT", "TRL"] {
            assert!(!profile(CwrVersion::V21, rt).unwrap().has_prefix);
        }
        for rt in ["ACK", "MSG", "NWR", "REV", "EXC", "REC"] {
            assert!(profile(CwrVersion::V21, rt).unwrap().has_prefix);
        }
    }

    #[test]
    fn test_unknown_type_has_no_table() {
        assert!(profile(CwrVersion::V21, "XXX").is_none());
    }

    #[test]
    fn test_rev_shares_nwr_layout() {
        let nwr = profile(CwrVersion::V22, "NWR").unwrap();
        let rev = profile(CwrVersion::V22, "REV").unwrap();
        assert_eq!(nwr.total_width, rev.total_width);
        assert_eq!(nwr.fields.len(), rev.fields.len());
    }
}
