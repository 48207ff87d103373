//! Sender/receiver codes carried by CWR filenames.
//!
//! Conforming filenames look like `CW240001ABC_XYZ.V21`: year, file
//! sequence, sender code, receiver code, version. The codes are pure
//! metadata; a filename that does not match yields nothing and is never
//! an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^CW\d{2}\d{4}([A-Z0-9]{2,3})_([A-Z0-9]{2,3})\.V\d{2}$")
        .expect("filename pattern is valid")
});

/// Codes extracted from a conforming CWR filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenameMetadata {
    pub sender_code: String,
    pub receiver_code: String,
}

/// Extract sender/receiver codes from a filename, if it conforms.
pub fn filename_metadata(name: &str) -> Option<FilenameMetadata> {
    let caps = FILENAME_RE.captures(name.trim())?;
    Some(FilenameMetadata {
        sender_code: caps[1].to_uppercase(),
        receiver_code: caps[2].to_uppercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conforming_filename() {
        let meta = filename_metadata("CW240001ABC_XYZ.V21").unwrap();
        assert_eq!(meta.sender_code, "ABC");
        assert_eq!(meta.receiver_code, "XYZ");
    }

    #[test]
    fn test_case_insensitive_and_two_char_codes() {
        let meta = filename_metadata("cw230815pq_rs.v22").unwrap();
        assert_eq!(meta.sender_code, "PQ");
        assert_eq!(meta.receiver_code, "RS");
    }

    #[test]
    fn test_non_match_is_none() {
        assert!(filename_metadata("acknowledgements.txt").is_none());
        assert!(filename_metadata("CW24001AB_CD.V21").is_none());
        assert!(filename_metadata("").is_none());
    }
}
