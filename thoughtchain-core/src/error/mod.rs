//! Step rejection errors and their machine-readable reason codes.
//!
//! Every way a submitted thought can be refused maps to exactly one
//! [`StepError`] variant, and every variant maps to a closed [`ReasonCode`].
//! The guidance generator switches on the reason code, never on message text.

pub mod jsonrpc;

use serde::Serialize;

/// Errors raised while validating or tracking a single reasoning step.
///
/// Shape and cross-field variants come from the schema validator and never
/// touch chain state. Reference, numbering and termination variants come
/// from the chain tracker and are raised before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    // ─────────────────────────────────────────────────────────────────────────
    // Shape errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The arguments payload is not a JSON object.
    #[error("thought arguments must be a JSON object")]
    NotAnObject,

    /// A required field is absent (or explicitly null).
    #[error("missing required field '{field}'")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A field is present with the wrong JSON type.
    #[error("field '{field}' must be {expected}")]
    InvalidType {
        /// Wire name of the offending field.
        field: &'static str,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// The thought text is empty after trimming whitespace.
    #[error("field 'thought' must not be empty")]
    EmptyText,

    /// The thought text exceeds the configured maximum length.
    #[error(
        "thought is {len} characters, exceeding the maximum of {max}; split it across several thoughts"
    )]
    TextTooLong {
        /// Length of the submitted text in characters.
        len: usize,
        /// Configured maximum in characters.
        max: usize,
    },

    /// A numeric field is an integer but not a positive one that fits.
    #[error("field '{field}' must be a positive integer, got {value}")]
    InvalidNumber {
        /// Wire name of the offending field.
        field: &'static str,
        /// The rejected value, rendered as submitted.
        value: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Cross-field errors
    // ─────────────────────────────────────────────────────────────────────────
    /// `is_revision` and `revises_thought` were not supplied together.
    #[error("{detail}")]
    RevisionPairing {
        /// Which half of the pair is missing.
        detail: &'static str,
    },

    /// Branch fields were supplied inconsistently.
    #[error("{detail}")]
    BranchPairing {
        /// Which half of the pair is missing or malformed.
        detail: &'static str,
    },

    /// A step carries both revision and branch markers.
    #[error(
        "a thought cannot be both a revision and a branch; drop either is_revision/revises_thought or branch_id/branch_from_thought"
    )]
    RevisionBranchConflict,

    // ─────────────────────────────────────────────────────────────────────────
    // Reference errors
    // ─────────────────────────────────────────────────────────────────────────
    /// `revises_thought` names a thought that is not in the history.
    #[error(
        "revises_thought {revises} does not match any recorded thought (history has {history_len} thoughts)"
    )]
    InvalidRevisionReference {
        /// The referenced thought number.
        revises: u32,
        /// Current history length.
        history_len: usize,
    },

    /// `branch_from_thought` names a thought that is not in the history.
    #[error(
        "branch_from_thought {branch_from} does not match any recorded thought (history has {history_len} thoughts)"
    )]
    InvalidBranchReference {
        /// The referenced thought number.
        branch_from: u32,
        /// Current history length.
        history_len: usize,
    },

    /// A branch continuation names a branch that was never started.
    #[error("branch '{branch_id}' does not exist yet; start it with branch_from_thought")]
    UnknownBranch {
        /// The unknown branch id.
        branch_id: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Chain-level invariant errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A thought number does not advance past the previous one on its line.
    #[error(
        "thought_number {thought_number} must be greater than the previous thought_number {previous} on {line}"
    )]
    NonMonotonicNumber {
        /// The submitted number.
        thought_number: u32,
        /// Last accepted number on the same line.
        previous: u32,
        /// Human-readable line name (`main line` or `branch 'x'`).
        line: String,
    },

    /// The line already has a step with `next_thought_needed = false`.
    #[error("{line} is already finished; only one thought per line may set next_thought_needed to false")]
    LineAlreadyTerminated {
        /// Human-readable line name.
        line: String,
    },
}

impl StepError {
    /// Machine-readable reason code for this error.
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::NotAnObject => ReasonCode::NotAnObject,
            Self::MissingField { .. } => ReasonCode::MissingField,
            Self::InvalidType { .. } => ReasonCode::InvalidType,
            Self::EmptyText => ReasonCode::EmptyText,
            Self::TextTooLong { .. } => ReasonCode::TextTooLong,
            Self::InvalidNumber { .. } => ReasonCode::InvalidNumber,
            Self::RevisionPairing { .. } => ReasonCode::RevisionPairing,
            Self::BranchPairing { .. } => ReasonCode::BranchPairing,
            Self::RevisionBranchConflict => ReasonCode::RevisionBranchConflict,
            Self::InvalidRevisionReference { .. } => ReasonCode::InvalidRevisionReference,
            Self::InvalidBranchReference { .. } => ReasonCode::InvalidBranchReference,
            Self::UnknownBranch { .. } => ReasonCode::UnknownBranch,
            Self::NonMonotonicNumber { .. } => ReasonCode::NonMonotonicNumber,
            Self::LineAlreadyTerminated { .. } => ReasonCode::LineAlreadyTerminated,
        }
    }
}

/// Closed set of rejection reasons carried in failed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    NotAnObject,
    MissingField,
    InvalidType,
    EmptyText,
    TextTooLong,
    InvalidNumber,
    RevisionPairing,
    BranchPairing,
    RevisionBranchConflict,
    InvalidRevisionReference,
    InvalidBranchReference,
    UnknownBranch,
    NonMonotonicNumber,
    LineAlreadyTerminated,
}

impl ReasonCode {
    /// Wire label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingField => "missing_field",
            Self::InvalidType => "invalid_type",
            Self::EmptyText => "empty_text",
            Self::TextTooLong => "text_too_long",
            Self::InvalidNumber => "invalid_number",
            Self::RevisionPairing => "revision_pairing",
            Self::BranchPairing => "branch_pairing",
            Self::RevisionBranchConflict => "revision_branch_conflict",
            Self::InvalidRevisionReference => "invalid_revision_reference",
            Self::InvalidBranchReference => "invalid_branch_reference",
            Self::UnknownBranch => "unknown_branch",
            Self::NonMonotonicNumber => "non_monotonic_number",
            Self::LineAlreadyTerminated => "line_already_terminated",
        }
    }

    /// Coarse error family, used by the guidance generator.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::EmptyText | Self::TextTooLong => ErrorCategory::Length,
            Self::BranchPairing | Self::InvalidBranchReference | Self::UnknownBranch => {
                ErrorCategory::Branch
            }
            Self::RevisionPairing
            | Self::RevisionBranchConflict
            | Self::InvalidRevisionReference => ErrorCategory::Revision,
            Self::InvalidNumber | Self::NonMonotonicNumber | Self::LineAlreadyTerminated => {
                ErrorCategory::Numbering
            }
            Self::NotAnObject | Self::MissingField | Self::InvalidType => ErrorCategory::Generic,
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error families that share one piece of corrective guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Text empty or over the length limit.
    Length,
    /// Branch fields misused or pointing nowhere.
    Branch,
    /// Revision fields misused or pointing nowhere.
    Revision,
    /// Numbers out of range, out of order, or a second termination.
    Numbering,
    /// Anything else (missing or mistyped fields).
    Generic,
}
