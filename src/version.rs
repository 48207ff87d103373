//! CWR protocol version selection.
//!
//! A transmission is either CWR 2.1 or CWR 2.2 and the choice is fixed for
//! the whole file: it selects which field tables the record engine uses for
//! HDR/ACK/MSG/NWR/REV. The version comes from, in order of precedence:
//!
//! 1. An explicit version forced by the caller
//! 2. The HDR version field (CWR 2.2 headers carry one)
//! 3. The HDR line length (2.2 headers are 167 characters, 2.1 are shorter)

use serde::{Deserialize, Serialize};

/// HDR lines at least this long are CWR 2.2.
pub const V22_HDR_MIN_LEN: usize = 167;

/// Supported CWR protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CwrVersion {
    /// CWR 2.1
    #[serde(rename = "2.1")]
    V21,
    /// CWR 2.2
    #[serde(rename = "2.2")]
    V22,
}

impl CwrVersion {
    /// The version label as written in HDR records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V21 => "2.1",
            Self::V22 => "2.2",
        }
    }

    /// Parse a version label ("2.1" / "2.2"), ignoring surrounding blanks.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "2.1" | "02.10" => Some(Self::V21),
            "2.2" | "02.20" => Some(Self::V22),
            _ => None,
        }
    }
}

impl std::fmt::Display for CwrVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the protocol version for a transmission.
///
/// Precedence: `forced` > HDR version field (when non-blank and recognized)
/// > HDR line length heuristic. An unrecognized header field falls through
/// to the heuristic; the resolver selects, it never validates.
pub fn resolve_version(
    forced: Option<CwrVersion>,
    header_field: Option<&str>,
    header_line_len: usize,
) -> CwrVersion {
    if let Some(v) = forced {
        return v;
    }
    if let Some(field) = header_field {
        if !field.trim().is_empty() {
            if let Some(v) = CwrVersion::from_label(field) {
                return v;
            }
        }
    }
    if header_line_len >= V22_HDR_MIN_LEN {
        CwrVersion::V22
    } else {
        CwrVersion::V21
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_wins() {
        assert_eq!(
            resolve_version(Some(CwrVersion::V21), Some("2.2"), 200),
            CwrVersion::V21
        );
    }

    #[test]
    fn test_header_field_beats_length() {
        assert_eq!(
            resolve_version(None, Some("2.2"), 100),
            CwrVersion::V22
        );
        assert_eq!(
            resolve_version(None, Some("2.1"), 200),
            CwrVersion::V21
        );
    }

    #[test]
    fn test_blank_header_field_falls_through() {
        assert_eq!(resolve_version(None, Some("   "), 167), CwrVersion::V22);
    }

    #[test]
    fn test_unrecognized_header_field_falls_through() {
        assert_eq!(resolve_version(None, Some("9.9"), 120), CwrVersion::V21);
    }

    #[test]
    fn test_length_boundary() {
        assert_eq!(resolve_version(None, None, 166), CwrVersion::V21);
        assert_eq!(resolve_version(None, None, 167), CwrVersion::V22);
    }

    #[test]
    fn test_label_roundtrip() {
        assert_eq!(CwrVersion::from_label("2.1"), Some(CwrVersion::V21));
        assert_eq!(CwrVersion::from_label(" 2.2 "), Some(CwrVersion::V22));
        assert_eq!(CwrVersion::from_label(""), None);
        assert_eq!(CwrVersion::V22.as_str(), "2.2");
    }
}
