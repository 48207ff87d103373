//! Acknowledgment file parser.
//!
//! Consumes a line-oriented ACK payload top to bottom, decoding each line
//! with the record engine and driving a finite-state grammar that
//! reconstructs File → Group → Acknowledgement(+Messages) structures:
//!
//! ```text
//! HDR ──▶ GRH ──▶ ACK ──▶ MSG* ──▶ NWR/REV ──▶ EXC? ──▶ detail* ─┐
//!          ▲       ▲                                             │
//!          │       └──────────────── next ACK ◀──────────────────┘
//!          └─ GRT closes the group, TRL closes the file
//! ```
//!
//! A single `parse` call owns all transient state exclusively; nothing
//! escapes except the immutable [`AckFile`]. The caller keeps ownership of
//! the reader — it is read to TRL or EOF, never closed.

pub mod filename;

use std::io::BufRead;

use tracing::{debug, trace};

use crate::error::{AckError, AckResult, ErrorCode};
use crate::fields::{FieldValue, FieldValues};
use crate::models::{
    AckFile, AckMessage, AckStatus, Acknowledgement, Correlation, Group, RawPayload, Receiver,
    Sender, WorkSummary,
};
use crate::records::{DecodedRecord, RecordEngine, RecordPrefix};
use crate::version::{resolve_version, CwrVersion};

use filename::filename_metadata;

/// Record types that are pure detail lines inside an ACK transaction.
/// Only their prefixes take part in the grammar.
const DETAIL_TYPES: &[&str] = &[
    "SPU", "SPT", "OPU", "SWR", "SWT", "PWR", "OWR", "ALT", "PER", "REC",
];

// =============================================================================
// Parser surface
// =============================================================================

/// Caller-supplied context for one parse.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Original filename, used only to extract sender/receiver codes.
    pub filename: Option<String>,
    /// Receiver identity; overrides anything derived from the filename.
    pub receiver: Option<Receiver>,
    /// Keep the raw source lines on each acknowledgement.
    pub include_payload: bool,
}

/// Parser for CWR acknowledgment files.
#[derive(Debug, Clone, Copy)]
pub struct AckParser {
    forced: Option<CwrVersion>,
}

impl AckParser {
    /// Parse with a fixed protocol version, ignoring the header.
    pub fn for_version(version: CwrVersion) -> Self {
        Self {
            forced: Some(version),
        }
    }

    /// Infer the protocol version from the HDR record.
    pub fn auto() -> Self {
        Self { forced: None }
    }

    /// Parse a complete in-memory payload.
    pub fn parse_str(&self, input: &str, context: &ParseContext) -> AckResult<AckFile> {
        self.parse(input.as_bytes(), context)
    }

    /// Parse from a line-oriented reader.
    ///
    /// Reads until TRL or EOF. The reader is not closed; release stays with
    /// the caller on every exit path.
    pub fn parse<R: BufRead>(&self, reader: R, context: &ParseContext) -> AckResult<AckFile> {
        ParseState::new(self.forced, context).run(reader)
    }
}

// =============================================================================
// Transient parse state
// =============================================================================

/// File-level facts decoded from the HDR record.
struct FileHeader {
    sender: Sender,
    creation_date: chrono::NaiveDate,
    creation_time: chrono::NaiveTime,
    version: CwrVersion,
}

/// An acknowledgement being accumulated, finalized atomically on the next
/// structural boundary (ACK/EXC/GRT/TRL/EOF).
struct PendingAck {
    transaction_sequence: u32,
    expected_record_sequence: u32,
    last_record_sequence: u32,
    values: FieldValues,
    transaction: Option<(String, FieldValues)>,
    exception: Option<FieldValues>,
    messages: Vec<AckMessage>,
    raw_ack: String,
    raw_messages: Vec<String>,
    raw_transaction: Option<String>,
    raw_exception: Option<String>,
}

impl PendingAck {
    fn new(transaction_sequence: u32, values: FieldValues) -> Self {
        Self {
            transaction_sequence,
            expected_record_sequence: 1,
            last_record_sequence: 0,
            values,
            transaction: None,
            exception: None,
            messages: Vec::new(),
            raw_ack: String::new(),
            raw_messages: Vec::new(),
            raw_transaction: None,
            raw_exception: None,
        }
    }
}

/// All mutable state of one parse call, owned exclusively for its duration.
struct ParseState<'a> {
    forced: Option<CwrVersion>,
    context: &'a ParseContext,
    engine: Option<RecordEngine>,
    header: Option<FileHeader>,
    groups: Vec<Group>,
    current_group: Option<Group>,
    pending: Option<PendingAck>,
    expected_transaction_sequence: u32,
    line_no: usize,
}

impl<'a> ParseState<'a> {
    fn new(forced: Option<CwrVersion>, context: &'a ParseContext) -> Self {
        Self {
            forced,
            context,
            engine: None,
            header: None,
            groups: Vec::new(),
            current_group: None,
            pending: None,
            expected_transaction_sequence: 0,
            line_no: 0,
        }
    }

    fn run<R: BufRead>(mut self, reader: R) -> AckResult<AckFile> {
        let mut lines = reader.lines();
        let mut saw_trl = false;

        while let Some(line) = lines.next() {
            self.line_no += 1;
            let line = line.map_err(|e| AckError::from_io(e, self.line_no))?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if self.handle_line(line)? {
                saw_trl = true;
                break;
            }
        }

        if saw_trl {
            // Forward peek: nothing non-blank may follow the trailer.
            for line in lines {
                self.line_no += 1;
                let line = line.map_err(|e| AckError::from_io(e, self.line_no))?;
                if !line.trim().is_empty() {
                    return Err(AckError::new(
                        ErrorCode::TrailingData,
                        "Non-blank line after TRL",
                    )
                    .at_line(self.line_no)
                    .with_value(line.trim().to_string()));
                }
            }
        } else {
            if self.header.is_none() {
                return Err(AckError::new(
                    ErrorCode::MissingHdr,
                    "Input contained no HDR record",
                )
                .at_line(self.line_no));
            }
            self.finalize_pending()?;
            if self.current_group.is_some() {
                return Err(AckError::new(
                    ErrorCode::MissingGrt,
                    "Input ended with an unclosed group",
                )
                .at_line(self.line_no));
            }
            return Err(
                AckError::new(ErrorCode::MissingTrl, "No TRL record in input").at_line(self.line_no)
            );
        }

        self.into_file()
    }

    /// Dispatch one non-blank line. Returns true once TRL has been handled.
    fn handle_line(&mut self, line: &str) -> AckResult<bool> {
        let record_type: String = line.chars().take(3).collect();
        trace!(line = self.line_no, record_type = %record_type, "record");

        if record_type == "HDR" {
            if self.header.is_some() {
                return Err(AckError::new(
                    ErrorCode::UnsupportedRecord,
                    "Unexpected second HDR record",
                )
                .at_line(self.line_no)
                .with_record_type("HDR"));
            }
            self.handle_hdr(line)?;
            return Ok(false);
        }

        let engine = match self.engine {
            Some(engine) => engine,
            None => {
                return Err(AckError::new(
                    ErrorCode::MissingHdr,
                    "First record must be HDR",
                )
                .at_line(self.line_no)
                .with_record_type(record_type))
            }
        };

        match record_type.as_str() {
            "GRH" => self.handle_grh(engine, line)?,
            "GRT" => self.handle_grt(engine, line)?,
            "ACK" => self.handle_ack(engine, line)?,
            "MSG" => self.handle_msg(engine, line)?,
            "NWR" | "REV" => self.handle_transaction(engine, &record_type, line)?,
            "EXC" => self.handle_exc(engine, line)?,
            rt if DETAIL_TYPES.contains(&rt) => self.handle_detail(rt, line)?,
            "TRL" => {
                self.handle_trl(engine, line)?;
                return Ok(true);
            }
            other => {
                return Err(AckError::new(
                    ErrorCode::UnsupportedRecord,
                    format!("Unsupported record type '{other}'"),
                )
                .at_line(self.line_no)
                .with_record_type(other))
            }
        }
        Ok(false)
    }

    // -------------------------------------------------------------------------
    // Per-record handlers
    // -------------------------------------------------------------------------

    fn handle_hdr(&mut self, line: &str) -> AckResult<()> {
        // The version must be known before the HDR table can be chosen.
        let version_field = line
            .as_bytes()
            .get(101..104)
            .map(|b| String::from_utf8_lossy(b).to_string());
        let version = resolve_version(
            self.forced,
            version_field.as_deref(),
            line.chars().count(),
        );
        debug!(version = %version, "resolved protocol version");

        let engine = RecordEngine::new(version);
        let decoded = self.decode(engine, "HDR", line)?;
        let values = decoded.values;

        let sender_id = values
            .number("sender_id")
            .map(|n| format!("{n:09}"))
            .unwrap_or_default();
        let file_meta = self
            .context
            .filename
            .as_deref()
            .and_then(filename_metadata);

        self.header = Some(FileHeader {
            sender: Sender {
                sender_type: values.text("sender_type").unwrap_or_default().to_string(),
                sender_id,
                sender_name: values.text("sender_name").unwrap_or_default().to_string(),
                code: file_meta.as_ref().map(|m| m.sender_code.clone()),
            },
            creation_date: values.date("creation_date").ok_or_else(|| {
                self.missing_field("HDR", "creation_date")
            })?,
            creation_time: values.time("creation_time").ok_or_else(|| {
                self.missing_field("HDR", "creation_time")
            })?,
            version,
        });
        self.engine = Some(engine);
        Ok(())
    }

    fn handle_grh(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        if self.current_group.is_some() {
            return Err(AckError::new(
                ErrorCode::MissingGrt,
                "GRH before the previous group was closed",
            )
            .at_line(self.line_no)
            .with_record_type("GRH"));
        }
        let decoded = self.decode(engine, "GRH", line)?;
        let transaction_type = decoded
            .values
            .text("transaction_type")
            .unwrap_or_default()
            .to_string();
        if transaction_type != "ACK" {
            return Err(AckError::new(
                ErrorCode::UnsupportedGroupType,
                format!("Group transaction type '{transaction_type}' is not ACK"),
            )
            .at_line(self.line_no)
            .with_record_type("GRH")
            .with_value(transaction_type));
        }
        let group_id = decoded
            .values
            .number("group_id")
            .map(|n| format!("{n:05}"))
            .unwrap_or_else(|| "00000".to_string());
        debug!(group_id = %group_id, "group opened");
        self.current_group = Some(Group::new(group_id));
        self.expected_transaction_sequence = 0;
        Ok(())
    }

    fn handle_grt(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        if self.current_group.is_none() {
            return Err(AckError::new(
                ErrorCode::MissingGrh,
                "GRT without an open group",
            )
            .at_line(self.line_no)
            .with_record_type("GRT"));
        }
        self.decode(engine, "GRT", line)?;
        self.finalize_pending()?;
        if let Some(group) = self.current_group.take() {
            debug!(group_id = %group.group_id, acks = group.acknowledgements.len(), "group closed");
            self.groups.push(group);
        }
        Ok(())
    }

    fn handle_ack(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        if self.current_group.is_none() {
            return Err(AckError::new(
                ErrorCode::MissingGrh,
                "ACK outside of any group",
            )
            .at_line(self.line_no)
            .with_record_type("ACK"));
        }
        self.finalize_pending()?;

        let decoded = self.decode(engine, "ACK", line)?;
        let prefix = self.prefix_of(decoded.prefix)?;
        if prefix.record_sequence != 0 {
            return Err(AckError::new(
                ErrorCode::InvalidRecordSequence,
                format!(
                    "ACK record sequence must be 0, got {}",
                    prefix.record_sequence
                ),
            )
            .at_line(self.line_no)
            .with_record_type("ACK")
            .with_value(prefix.record_sequence.to_string()));
        }
        if prefix.transaction_sequence != self.expected_transaction_sequence {
            return Err(AckError::new(
                ErrorCode::InvalidTransactionSequence,
                format!(
                    "Expected transaction sequence {}, got {}",
                    self.expected_transaction_sequence, prefix.transaction_sequence
                ),
            )
            .at_line(self.line_no)
            .with_record_type("ACK")
            .with_value(prefix.transaction_sequence.to_string()));
        }
        self.expected_transaction_sequence += 1;

        let mut pending = PendingAck::new(prefix.transaction_sequence, decoded.values);
        if self.context.include_payload {
            pending.raw_ack = line.to_string();
        }
        self.pending = Some(pending);
        Ok(())
    }

    fn handle_msg(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        if self.pending.is_none() {
            return Err(AckError::new(
                ErrorCode::MsgOutOfSequence,
                "MSG without a preceding ACK",
            )
            .at_line(self.line_no)
            .with_record_type("MSG"));
        }
        let decoded = self.decode(engine, "MSG", line)?;
        let prefix = self.prefix_of(decoded.prefix)?;
        self.continuation_check(&prefix, false)?;

        let values = decoded.values;
        let message = AckMessage {
            message_type: values.text("message_type").unwrap_or_default().to_string(),
            original_record_sequence: values.number("original_record_sequence").unwrap_or(0) as u32,
            record_type: values.text("record_type").unwrap_or_default().to_string(),
            message_level: values.text("message_level").unwrap_or_default().to_string(),
            validation_number: values
                .text("validation_number")
                .unwrap_or_default()
                .to_string(),
            text: values.text("message_text").unwrap_or_default().to_string(),
        };
        let include_payload = self.context.include_payload;
        let pending = self.pending_mut()?;
        pending.messages.push(message);
        if include_payload {
            pending.raw_messages.push(line.to_string());
        }
        Ok(())
    }

    fn handle_transaction(
        &mut self,
        engine: RecordEngine,
        record_type: &str,
        line: &str,
    ) -> AckResult<()> {
        match &self.pending {
            None => {
                return Err(AckError::new(
                    ErrorCode::TransactionOutOfSequence,
                    format!("{record_type} without a preceding ACK"),
                )
                .at_line(self.line_no)
                .with_record_type(record_type))
            }
            Some(pending) if pending.transaction.is_some() => {
                return Err(AckError::new(
                    ErrorCode::DuplicateTransaction,
                    format!("{record_type} after the transaction was already set"),
                )
                .at_line(self.line_no)
                .with_record_type(record_type))
            }
            Some(_) => {}
        }
        let decoded = self.decode(engine, record_type, line)?;
        let prefix = self.prefix_of(decoded.prefix)?;
        self.continuation_check(&prefix, true)?;

        let include_payload = self.context.include_payload;
        let pending = self.pending_mut()?;
        pending.transaction = Some((record_type.to_string(), decoded.values));
        if include_payload {
            pending.raw_transaction = Some(line.to_string());
        }
        Ok(())
    }

    fn handle_exc(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        let has_transaction = self
            .pending
            .as_ref()
            .is_some_and(|p| p.transaction.is_some());
        if !has_transaction {
            return Err(AckError::new(
                ErrorCode::ExcOutOfSequence,
                "EXC without a correlated transaction",
            )
            .at_line(self.line_no)
            .with_record_type("EXC"));
        }
        let decoded = self.decode(engine, "EXC", line)?;
        let prefix = self.prefix_of(decoded.prefix)?;
        self.continuation_check(&prefix, false)?;

        let include_payload = self.context.include_payload;
        let pending = self.pending_mut()?;
        pending.exception = Some(decoded.values);
        if include_payload {
            pending.raw_exception = Some(line.to_string());
        }
        // An exception is always the last record of its acknowledgement.
        self.finalize_pending()
    }

    fn handle_detail(&mut self, record_type: &str, line: &str) -> AckResult<()> {
        match &self.pending {
            None => {
                return Err(AckError::new(
                    ErrorCode::DetailOutOfSequence,
                    format!("{record_type} without a preceding ACK"),
                )
                .at_line(self.line_no)
                .with_record_type(record_type))
            }
            Some(pending) if pending.transaction.is_none() => {
                return Err(AckError::new(
                    ErrorCode::DetailBeforeTransaction,
                    format!("{record_type} before the transaction header"),
                )
                .at_line(self.line_no)
                .with_record_type(record_type))
            }
            Some(_) => {}
        }
        let prefix = RecordPrefix::parse(line)
            .map_err(|e| AckError::from_record(e, self.line_no, record_type))?;
        self.continuation_check(&prefix, false)
    }

    fn handle_trl(&mut self, engine: RecordEngine, line: &str) -> AckResult<()> {
        self.decode(engine, "TRL", line)?;
        self.finalize_pending()?;
        if let Some(group) = self.current_group.take() {
            debug!(group_id = %group.group_id, "group closed by TRL");
            self.groups.push(group);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sequencing
    // -------------------------------------------------------------------------

    /// Cross-record continuation invariant for every record after the ACK
    /// header: same transaction sequence, record sequence advancing by one.
    ///
    /// `allow_reset` covers a sender quirk observed on transaction headers
    /// only: an NWR/REV whose own record sequence is literally 0 restarts
    /// the record numbering instead of failing.
    fn continuation_check(&mut self, prefix: &RecordPrefix, allow_reset: bool) -> AckResult<()> {
        let line_no = self.line_no;
        let pending = self.pending_mut()?;
        if prefix.transaction_sequence != pending.transaction_sequence {
            return Err(AckError::new(
                ErrorCode::SequenceContinuation,
                format!(
                    "Record belongs to transaction {}, current is {}",
                    prefix.transaction_sequence, pending.transaction_sequence
                ),
            )
            .at_line(line_no)
            .with_record_type(prefix.record_type.clone())
            .with_value(prefix.transaction_sequence.to_string()));
        }
        if allow_reset && prefix.record_sequence == 0 {
            pending.last_record_sequence = 0;
            pending.expected_record_sequence = 1;
            return Ok(());
        }
        if prefix.record_sequence != pending.expected_record_sequence {
            return Err(AckError::new(
                ErrorCode::RecordContinuation,
                format!(
                    "Expected record sequence {}, got {}",
                    pending.expected_record_sequence, prefix.record_sequence
                ),
            )
            .at_line(line_no)
            .with_record_type(prefix.record_type.clone())
            .with_value(prefix.record_sequence.to_string()));
        }
        pending.last_record_sequence = prefix.record_sequence;
        pending.expected_record_sequence += 1;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Finalization
    // -------------------------------------------------------------------------

    /// Close the pending acknowledgement, if any: synthesize a missing
    /// transaction, enforce correlation invariants, and append the
    /// normalized result to the open group.
    fn finalize_pending(&mut self) -> AckResult<()> {
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };

        // Some senders omit the NWR/REV echo entirely; reconstruct one from
        // the ACK record itself.
        let (transaction_type, transaction_values) = match pending.transaction.take() {
            Some(transaction) => transaction,
            None => {
                let record_type = pending
                    .values
                    .text("original_transaction_type")
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "NWR".to_string());
                let mut values = FieldValues::new();
                if let Some(title) = pending.values.text("creation_title") {
                    values.set("work_title", FieldValue::text(title));
                }
                if let Some(number) = pending.values.text("submitter_creation_number") {
                    values.set("submitter_work_number", FieldValue::text(number));
                }
                (record_type, values)
            }
        };

        let mut missing = Vec::new();
        for name in [
            "creation_date",
            "creation_time",
            "original_group_id",
            "original_transaction_sequence",
            "original_transaction_type",
        ] {
            let blank = match name {
                "creation_date" => pending.values.date(name).is_none(),
                "creation_time" => pending.values.time(name).is_none(),
                "original_group_id" | "original_transaction_sequence" => {
                    pending.values.number(name).is_none()
                }
                _ => pending.values.text(name).is_none(),
            };
            if blank {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(AckError::new(
                ErrorCode::MissingCorrelation,
                format!("Blank correlation field(s): {}", missing.join(", ")),
            )
            .at_line(self.line_no)
            .with_record_type("ACK")
            .with_missing(missing));
        }

        let original_transaction_type = pending
            .values
            .text("original_transaction_type")
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        if original_transaction_type != "HDR"
            && original_transaction_type != "TRL"
            && original_transaction_type != transaction_type
        {
            return Err(AckError::new(
                ErrorCode::TransactionTypeMismatch,
                format!(
                    "ACK says original transaction was '{original_transaction_type}' \
                     but the correlated record is '{transaction_type}'"
                ),
            )
            .at_line(self.line_no)
            .with_record_type("ACK")
            .with_value(original_transaction_type));
        }

        let ack_title = pending.values.text("creation_title").map(normalize);
        let work_title = transaction_values.text("work_title").map(normalize);
        if let (Some(a), Some(w)) = (&ack_title, &work_title) {
            if a != w {
                return Err(AckError::new(
                    ErrorCode::CreationTitleMismatch,
                    format!("ACK title '{a}' does not match work title '{w}'"),
                )
                .at_line(self.line_no)
                .with_record_type("ACK")
                .with_field("creation_title")
                .with_value(a.clone()));
            }
        }

        let ack_number = pending.values.text("submitter_creation_number").map(normalize);
        let work_number = transaction_values
            .text("submitter_work_number")
            .map(normalize);
        if let (Some(a), Some(w)) = (&ack_number, &work_number) {
            if a != w {
                return Err(AckError::new(
                    ErrorCode::SubmitterCreationMismatch,
                    format!("ACK creation number '{a}' does not match work number '{w}'"),
                )
                .at_line(self.line_no)
                .with_record_type("ACK")
                .with_field("submitter_creation_number")
                .with_value(a.clone()));
            }
        }

        let correlation = Correlation {
            creation_date: pending.values.date("creation_date").ok_or_else(|| {
                self.missing_field("ACK", "creation_date")
            })?,
            creation_time: pending.values.time("creation_time").ok_or_else(|| {
                self.missing_field("ACK", "creation_time")
            })?,
            original_group_id: format!(
                "{:05}",
                pending.values.number("original_group_id").unwrap_or(0)
            ),
            original_transaction_sequence: pending
                .values
                .number("original_transaction_sequence")
                .unwrap_or(0) as u32,
            original_transaction_type,
        };

        let creation_title = pending
            .values
            .text("creation_title")
            .or_else(|| transaction_values.text("work_title"))
            .unwrap_or_default()
            .to_string();

        let work = WorkSummary {
            submitter_creation_number: pending
                .values
                .text("submitter_creation_number")
                .map(str::to_string),
            recipient_creation_number: pending
                .values
                .text("recipient_creation_number")
                .map(str::to_string),
            creation_title,
            transaction_type,
            submitter_work_number: transaction_values
                .text("submitter_work_number")
                .map(str::to_string),
            iswc: transaction_values.text("iswc").map(str::to_string),
        };

        let status = AckStatus {
            transaction_status: pending
                .values
                .text("transaction_status")
                .unwrap_or_default()
                .to_string(),
            processing_date: pending.values.date("processing_date"),
        };

        let raw = self.context.include_payload.then(|| RawPayload {
            ack: pending.raw_ack.clone(),
            messages: pending.raw_messages.clone(),
            transaction: pending.raw_transaction.clone(),
            exception: pending.raw_exception.clone(),
        });

        let ack = Acknowledgement {
            correlation,
            work,
            status,
            messages: std::mem::take(&mut pending.messages),
            raw,
        };

        let group = self.current_group.as_mut().ok_or_else(|| {
            AckError::new(ErrorCode::MissingGrh, "Acknowledgement outside of any group")
                .at_line(self.line_no)
        })?;
        trace!(
            transaction = pending.transaction_sequence,
            group_id = %group.group_id,
            "acknowledgement finalized"
        );
        group.acknowledgements.push(ack);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn decode(&self, engine: RecordEngine, record_type: &str, line: &str) -> AckResult<DecodedRecord> {
        let profile = engine.profile(record_type).ok_or_else(|| {
            AckError::new(
                ErrorCode::UnsupportedRecord,
                format!("No field table for record type '{record_type}'"),
            )
            .at_line(self.line_no)
            .with_record_type(record_type)
        })?;
        engine
            .decode(profile, line)
            .map_err(|e| AckError::from_record(e, self.line_no, record_type))
    }

    fn prefix_of(&self, prefix: Option<RecordPrefix>) -> AckResult<RecordPrefix> {
        prefix.ok_or_else(|| {
            AckError::new(ErrorCode::InvalidPrefix, "Record carries no prefix")
                .at_line(self.line_no)
        })
    }

    fn pending_mut(&mut self) -> AckResult<&mut PendingAck> {
        let line_no = self.line_no;
        self.pending.as_mut().ok_or_else(|| {
            AckError::new(ErrorCode::DetailOutOfSequence, "No acknowledgement in progress")
                .at_line(line_no)
        })
    }

    fn missing_field(&self, record_type: &str, field: &str) -> AckError {
        AckError::new(
            ErrorCode::MissingField,
            format!("Blank required field '{field}'"),
        )
        .at_line(self.line_no)
        .with_record_type(record_type)
        .with_field(field)
    }

    fn into_file(self) -> AckResult<AckFile> {
        let header = self.header.ok_or_else(|| {
            AckError::new(ErrorCode::MissingHdr, "Input contained no HDR record")
        })?;
        let receiver = self
            .context
            .receiver
            .clone()
            .or_else(|| {
                self.context
                    .filename
                    .as_deref()
                    .and_then(filename_metadata)
                    .map(|m| Receiver {
                        code: m.receiver_code,
                    })
            });
        Ok(AckFile {
            sender: header.sender,
            receiver,
            creation_date: header.creation_date,
            creation_time: header.creation_time,
            version: header.version,
            groups: self.groups,
        })
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}
