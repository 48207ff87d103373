//! Domain models for parsed acknowledgment files.
//!
//! This module contains the structures an acknowledgment parse returns:
//!
//! - [`AckFile`] - the whole transmission: sender, receiver, groups
//! - [`Group`] - one GRH/GRT-bounded batch of acknowledgements
//! - [`Acknowledgement`] - one ACK transaction with its messages
//! - [`Correlation`] - the keys linking an ACK back to the submitted file
//! - [`WorkSummary`] - what the society echoed back about the work
//!
//! Everything here is built incrementally during the parse and immutable
//! once returned.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::version::CwrVersion;

// =============================================================================
// Parties
// =============================================================================

/// The party that produced the acknowledgment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    /// Sender type code from the HDR record (e.g. "SO" for society).
    pub sender_type: String,
    /// Sender IPI/CAE number as written in the HDR record.
    pub sender_id: String,
    /// Sender display name.
    pub sender_name: String,
    /// Short code extracted from the filename, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The party the file is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    pub code: String,
}

// =============================================================================
// Acknowledgement
// =============================================================================

/// Keys correlating an acknowledgement to the originally submitted
/// transaction. All five are mandatory on a finalized acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    /// Creation date of the original file.
    pub creation_date: NaiveDate,
    /// Creation time of the original file.
    pub creation_time: NaiveTime,
    /// Group id of the original transaction, 5 digits.
    pub original_group_id: String,
    /// Transaction sequence of the original transaction.
    pub original_transaction_sequence: u32,
    /// Record type of the original transaction (e.g. "NWR").
    pub original_transaction_type: String,
}

/// What the society echoed back about the registered work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_creation_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_creation_number: Option<String>,
    /// Work title as echoed on the ACK record.
    pub creation_title: String,
    /// Record type of the correlated transaction ("NWR" or "REV").
    pub transaction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_work_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iswc: Option<String>,
}

/// Outcome reported for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckStatus {
    /// Two-letter transaction status code (e.g. "AS", "RJ").
    pub transaction_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<NaiveDate>,
}

/// One MSG record attached to an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    pub message_type: String,
    pub original_record_sequence: u32,
    pub record_type: String,
    pub message_level: String,
    pub validation_number: String,
    pub text: String,
}

/// Raw source lines for one acknowledgement, kept only when the caller
/// asks for the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    pub ack: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

/// One fully parsed acknowledgement. Finalized atomically; never mutated
/// after being appended to its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub correlation: Correlation,
    pub work: WorkSummary,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub messages: Vec<AckMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawPayload>,
}

// =============================================================================
// File structure
// =============================================================================

/// One GRH/GRT-bounded batch of acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// 5-digit group id as written in the GRH record.
    pub group_id: String,
    pub acknowledgements: Vec<Acknowledgement>,
}

impl Group {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            acknowledgements: Vec::new(),
        }
    }
}

/// A complete parsed acknowledgment transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckFile {
    pub sender: Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Receiver>,
    pub creation_date: NaiveDate,
    pub creation_time: NaiveTime,
    pub version: CwrVersion,
    pub groups: Vec<Group>,
}

impl AckFile {
    /// Total acknowledgements across all groups.
    pub fn acknowledgement_count(&self) -> usize {
        self.groups.iter().map(|g| g.acknowledgements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ack() -> Acknowledgement {
        Acknowledgement {
            correlation: Correlation {
                creation_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                creation_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                original_group_id: "00001".into(),
                original_transaction_sequence: 0,
                original_transaction_type: "NWR".into(),
            },
            work: WorkSummary {
                submitter_creation_number: Some("SUB001".into()),
                recipient_creation_number: None,
                creation_title: "MY SONG".into(),
                transaction_type: "NWR".into(),
                submitter_work_number: Some("SUB001".into()),
                iswc: None,
            },
            status: AckStatus {
                transaction_status: "AS".into(),
                processing_date: None,
            },
            messages: Vec::new(),
            raw: None,
        }
    }

    #[test]
    fn test_serialization_skips_absent_optionals() {
        let ack = sample_ack();
        let json = serde_json::to_string(&ack).unwrap();
        assert!(json.contains("\"creationTitle\":\"MY SONG\""));
        assert!(!json.contains("recipientCreationNumber"));
        assert!(!json.contains("\"messages\""));
        assert!(!json.contains("\"raw\""));
    }

    #[test]
    fn test_ack_file_counts_across_groups() {
        let mut g1 = Group::new("00001");
        g1.acknowledgements.push(sample_ack());
        g1.acknowledgements.push(sample_ack());
        let mut g2 = Group::new("00002");
        g2.acknowledgements.push(sample_ack());

        let file = AckFile {
            sender: Sender {
                sender_type: "SO".into(),
                sender_id: "123456789".into(),
                sender_name: "SOCIETY".into(),
                code: None,
            },
            receiver: None,
            creation_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            creation_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            version: CwrVersion::V21,
            groups: vec![g1, g2],
        };
        assert_eq!(file.acknowledgement_count(), 3);
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"version\":\"2.1\""));
    }
}
