//! # CWR Codec - fixed-width EDI codec and acknowledgment parser
//!
//! Encodes and decodes CWR (Common Works Registration) records and parses
//! the acknowledgment files societies send back after a registration run.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  ACK File   │────▶│   Record    │────▶│  AckParser  │────▶│  AckFile    │
//! │ (CWR lines) │     │   Engine    │     │   (FSM)     │     │  (JSON)     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cwr_codec::{AckParser, ParseContext};
//!
//! fn main() {
//!     let input = std::fs::read_to_string("CW240001ABC_XYZ.V21").unwrap();
//!     let file = AckParser::auto()
//!         .parse_str(&input, &ParseContext::default())
//!         .unwrap();
//!     println!("{} acknowledgements", file.acknowledgement_count());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types with stable codes
//! - [`version`] - CWR 2.1 / 2.2 selection
//! - [`fields`] - Typed fixed-width field codec
//! - [`records`] - Record engine and per-version field tables
//! - [`models`] - Domain models (AckFile, Group, Acknowledgement)
//! - [`ack`] - Acknowledgment file parser

// Core modules
pub mod error;
pub mod version;

// Codec
pub mod fields;
pub mod records;

// Acknowledgments
pub mod ack;
pub mod models;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AckError,
    AckResult,
    ErrorCode,
    ErrorContext,
    FieldError,
    FieldResult,
    RecordError,
    RecordResult,
};

// =============================================================================
// Re-exports - Codec
// =============================================================================

pub use fields::{
    decode_field,
    encode_field,
    FieldDescriptor,
    FieldKind,
    FieldValue,
    FieldValues,
};
pub use records::{DecodedRecord, RecordEngine, RecordPrefix, RecordProfile};
pub use version::{resolve_version, CwrVersion};

// =============================================================================
// Re-exports - Acknowledgments
// =============================================================================

pub use ack::filename::{filename_metadata, FilenameMetadata};
pub use ack::{AckParser, ParseContext};
pub use models::{
    Acknowledgement,
    AckFile,
    AckMessage,
    AckStatus,
    Correlation,
    Group,
    RawPayload,
    Receiver,
    Sender,
    WorkSummary,
};
