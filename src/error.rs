//! Error types for the CWR codec and acknowledgment parser.
//!
//! This module defines a hierarchy of error types following the same shape
//! at every layer:
//!
//! - [`FieldError`] - single-field encode/decode failures
//! - [`RecordError`] - record-level encode/decode failures
//! - [`AckError`] - acknowledgment parse failures with positional context
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across error boundaries. Every failure also exposes a stable
//! [`ErrorCode`] so callers dispatch on code, never on message text.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Codes
// =============================================================================

/// Stable machine-readable error codes.
///
/// One flat vocabulary spanning codec failures, structural (sequence and
/// ordering) failures, and semantic (correlation) failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Field / record codec
    InvalidField,
    InvalidDate,
    InvalidTime,
    InvalidEnumValue,
    InvalidFlag,
    MissingField,
    MissingPrefix,
    InvalidPrefix,
    TruncatedRecord,
    InvalidRecord,

    // File / group structure
    MissingHdr,
    MissingGrh,
    MissingGrt,
    MissingTrl,
    UnsupportedGroupType,
    UnsupportedRecord,
    TrailingData,

    // Transaction / record sequencing
    InvalidRecordSequence,
    InvalidTransactionSequence,
    MsgOutOfSequence,
    TransactionOutOfSequence,
    DuplicateTransaction,
    ExcOutOfSequence,
    DetailBeforeTransaction,
    DetailOutOfSequence,
    SequenceContinuation,
    RecordContinuation,

    // Input
    Io,

    // Correlation
    MissingCorrelation,
    TransactionTypeMismatch,
    CreationTitleMismatch,
    SubmitterCreationMismatch,
}

impl ErrorCode {
    /// The code as a stable string, identical to the variant name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidField => "InvalidField",
            Self::InvalidDate => "InvalidDate",
            Self::InvalidTime => "InvalidTime",
            Self::InvalidEnumValue => "InvalidEnumValue",
            Self::InvalidFlag => "InvalidFlag",
            Self::MissingField => "MissingField",
            Self::MissingPrefix => "MissingPrefix",
            Self::InvalidPrefix => "InvalidPrefix",
            Self::TruncatedRecord => "TruncatedRecord",
            Self::InvalidRecord => "InvalidRecord",
            Self::MissingHdr => "MissingHdr",
            Self::MissingGrh => "MissingGrh",
            Self::MissingGrt => "MissingGrt",
            Self::MissingTrl => "MissingTrl",
            Self::UnsupportedGroupType => "UnsupportedGroupType",
            Self::UnsupportedRecord => "UnsupportedRecord",
            Self::TrailingData => "TrailingData",
            Self::InvalidRecordSequence => "InvalidRecordSequence",
            Self::InvalidTransactionSequence => "InvalidTransactionSequence",
            Self::MsgOutOfSequence => "MsgOutOfSequence",
            Self::TransactionOutOfSequence => "TransactionOutOfSequence",
            Self::DuplicateTransaction => "DuplicateTransaction",
            Self::ExcOutOfSequence => "ExcOutOfSequence",
            Self::DetailBeforeTransaction => "DetailBeforeTransaction",
            Self::DetailOutOfSequence => "DetailOutOfSequence",
            Self::SequenceContinuation => "SequenceContinuation",
            Self::RecordContinuation => "RecordContinuation",
            Self::Io => "Io",
            Self::MissingCorrelation => "MissingCorrelation",
            Self::TransactionTypeMismatch => "TransactionTypeMismatch",
            Self::CreationTitleMismatch => "CreationTitleMismatch",
            Self::SubmitterCreationMismatch => "SubmitterCreationMismatch",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Errors while encoding or decoding a single fixed-width field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Value cannot be represented in the field.
    #[error("Invalid value for field '{field}': '{value}'")]
    InvalidField { field: String, value: String },

    /// Value is not a valid YYYYMMDD date.
    #[error("Invalid date in field '{field}': '{value}' (expected YYYYMMDD)")]
    InvalidDate { field: String, value: String },

    /// Value is not a valid HHMMSS time.
    #[error("Invalid time in field '{field}': '{value}' (expected HHMMSS)")]
    InvalidTime { field: String, value: String },

    /// Value does not resolve against the field's closed code set.
    #[error("Unknown code for field '{field}': '{value}'")]
    InvalidEnumValue { field: String, value: String },

    /// Value is not an accepted flag literal.
    #[error("Invalid flag for field '{field}': '{value}' (expected Y, N or U)")]
    InvalidFlag { field: String, value: String },
}

impl FieldError {
    /// Stable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidField { .. } => ErrorCode::InvalidField,
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::InvalidTime { .. } => ErrorCode::InvalidTime,
            Self::InvalidEnumValue { .. } => ErrorCode::InvalidEnumValue,
            Self::InvalidFlag { .. } => ErrorCode::InvalidFlag,
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidField { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::InvalidTime { field, .. }
            | Self::InvalidEnumValue { field, .. }
            | Self::InvalidFlag { field, .. } => field,
        }
    }

    /// The offending value.
    pub fn value(&self) -> &str {
        match self {
            Self::InvalidField { value, .. }
            | Self::InvalidDate { value, .. }
            | Self::InvalidTime { value, .. }
            | Self::InvalidEnumValue { value, .. }
            | Self::InvalidFlag { value, .. } => value,
        }
    }
}

// =============================================================================
// Record Errors
// =============================================================================

/// Errors while encoding or decoding a complete record line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Field-level failure.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A required field was absent or blank.
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// A prefix-bearing record was rendered without a prefix.
    #[error("Record type '{0}' requires a prefix but none was supplied")]
    MissingPrefix(String),

    /// The 19-character record prefix is malformed.
    #[error("Malformed record prefix: {0}")]
    InvalidPrefix(String),

    /// The line ends before the profile's declared width.
    #[error("Record truncated before field '{missing_field}' ({actual} of {expected} bytes)")]
    TruncatedRecord {
        missing_field: String,
        expected: usize,
        actual: usize,
    },

    /// A record-specific cross-field check failed.
    #[error("Invalid {record_type} record: {message}")]
    InvalidRecord { record_type: String, message: String },
}

impl RecordError {
    /// Stable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Field(e) => e.code(),
            Self::MissingField(_) => ErrorCode::MissingField,
            Self::MissingPrefix(_) => ErrorCode::MissingPrefix,
            Self::InvalidPrefix(_) => ErrorCode::InvalidPrefix,
            Self::TruncatedRecord { .. } => ErrorCode::TruncatedRecord,
            Self::InvalidRecord { .. } => ErrorCode::InvalidRecord,
        }
    }
}

// =============================================================================
// Acknowledgment Parse Errors
// =============================================================================

/// Structured context carried by every [`AckError`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    /// 1-based line number in the input, 0 when not tied to a line.
    pub line: usize,
    /// Record type of the offending line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Offending field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Offending value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Field names found blank, for `MissingCorrelation`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Acknowledgment parse failure.
///
/// Fatal to the `parse` call that raised it; there is no partial-result
/// recovery. Dispatch on [`AckError::code`], never on the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{msg} (line {line})", msg = .message, line = .context.line)]
pub struct AckError {
    pub code: ErrorCode,
    pub message: String,
    pub context: ErrorContext,
}

impl AckError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.context.line = line;
        self
    }

    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.context.record_type = Some(record_type.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.context.value = Some(value.into());
        self
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.context.missing = missing;
        self
    }

    /// Wrap a reader failure.
    pub fn from_io(err: std::io::Error, line: usize) -> Self {
        Self::new(ErrorCode::Io, format!("Cannot read input: {err}")).at_line(line)
    }

    /// Wrap a record codec failure, keeping its code and adding position.
    pub fn from_record(err: RecordError, line: usize, record_type: &str) -> Self {
        let mut out = Self::new(err.code(), err.to_string())
            .at_line(line)
            .with_record_type(record_type);
        if let RecordError::Field(ref fe) = err {
            out = out.with_field(fe.field()).with_value(fe.value());
        }
        out
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for field codec operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for record engine operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Result type for acknowledgment parsing.
pub type AckResult<T> = Result<T, AckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // FieldError -> RecordError
        let field_err = FieldError::InvalidEnumValue {
            field: "transaction_type".into(),
            value: "XYZ".into(),
        };
        let record_err: RecordError = field_err.into();
        assert_eq!(record_err.code(), ErrorCode::InvalidEnumValue);
        assert!(record_err.to_string().contains("XYZ"));
    }

    #[test]
    fn test_ack_error_from_record_keeps_field_context() {
        let err = RecordError::Field(FieldError::InvalidDate {
            field: "creation_date".into(),
            value: "20251332".into(),
        });
        let ack = AckError::from_record(err, 7, "ACK");
        assert_eq!(ack.code, ErrorCode::InvalidDate);
        assert_eq!(ack.context.line, 7);
        assert_eq!(ack.context.record_type.as_deref(), Some("ACK"));
        assert_eq!(ack.context.field.as_deref(), Some("creation_date"));
        assert_eq!(ack.context.value.as_deref(), Some("20251332"));
    }

    #[test]
    fn test_ack_error_display_includes_line() {
        let err = AckError::new(ErrorCode::MissingGrh, "ACK outside of any group").at_line(12);
        let msg = err.to_string();
        assert!(msg.contains("line 12"));
        assert!(msg.contains("ACK outside"));
    }

    #[test]
    fn test_error_code_as_str_is_stable() {
        assert_eq!(ErrorCode::RecordContinuation.as_str(), "RecordContinuation");
        assert_eq!(ErrorCode::MissingTrl.to_string(), "MissingTrl");
    }

    #[test]
    fn test_context_serialization_skips_empty() {
        let err = AckError::new(ErrorCode::MissingCorrelation, "blank correlation keys")
            .at_line(3)
            .with_missing(vec!["original_group_id".into()]);
        let json = serde_json::to_string(&err.context).unwrap();
        assert!(json.contains("original_group_id"));
        assert!(!json.contains("recordType"));
    }
}
