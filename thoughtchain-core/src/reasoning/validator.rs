//! Schema validation: raw request arguments to a well-formed [`ReasoningStep`].
//!
//! Pure: no chain state is consulted. Reference checks that need the history
//! belong to the tracker.

use serde_json::{Map, Value};

use super::step::{ReasoningStep, StepKind, fields};
use crate::error::StepError;

/// Validates inbound `sequential_thinking` arguments.
#[derive(Debug, Clone)]
pub struct StepValidator {
    max_text_len: usize,
}

impl StepValidator {
    /// Create a validator enforcing `max_text_len` characters per thought.
    pub fn new(max_text_len: usize) -> Self {
        Self { max_text_len }
    }

    pub fn max_text_len(&self) -> usize {
        self.max_text_len
    }

    /// Validate a raw arguments object.
    ///
    /// Checks, in order: object shape, required fields and their types, text
    /// bounds, optional field types, then the revision/branch pairing rules.
    /// Unknown keys are ignored; `null` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns the first [`StepError`] encountered.
    pub fn validate(&self, raw: &Value) -> Result<ReasoningStep, StepError> {
        let obj = raw.as_object().ok_or(StepError::NotAnObject)?;

        let text = required_str(obj, fields::THOUGHT)?;
        let index = positive_int(fields::THOUGHT_NUMBER, required(obj, fields::THOUGHT_NUMBER)?)?;
        let estimated_total =
            positive_int(fields::TOTAL_THOUGHTS, required(obj, fields::TOTAL_THOUGHTS)?)?;
        let continues = bool_value(
            fields::NEXT_THOUGHT_NEEDED,
            required(obj, fields::NEXT_THOUGHT_NEEDED)?,
        )?;

        if text.trim().is_empty() {
            return Err(StepError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.max_text_len {
            return Err(StepError::TextTooLong {
                len,
                max: self.max_text_len,
            });
        }

        let is_revision = optional(obj, fields::IS_REVISION)
            .map(|v| bool_value(fields::IS_REVISION, v))
            .transpose()?
            .unwrap_or(false);
        let revises = optional(obj, fields::REVISES_THOUGHT)
            .map(|v| positive_int(fields::REVISES_THOUGHT, v))
            .transpose()?;
        let branch_from = optional(obj, fields::BRANCH_FROM_THOUGHT)
            .map(|v| positive_int(fields::BRANCH_FROM_THOUGHT, v))
            .transpose()?;
        let branch_id = optional(obj, fields::BRANCH_ID)
            .map(|v| {
                v.as_str().ok_or(StepError::InvalidType {
                    field: fields::BRANCH_ID,
                    expected: "a string",
                })
            })
            .transpose()?;
        let more_steps_hint = optional(obj, fields::NEEDS_MORE_THOUGHTS)
            .map(|v| bool_value(fields::NEEDS_MORE_THOUGHTS, v))
            .transpose()?;

        let kind = classify_kind(is_revision, revises, branch_id, branch_from)?;

        Ok(ReasoningStep {
            text: text.to_string(),
            index,
            estimated_total,
            continues,
            kind,
            more_steps_hint,
        })
    }
}

/// Apply the revision/branch pairing rules.
fn classify_kind(
    is_revision: bool,
    revises: Option<u32>,
    branch_id: Option<&str>,
    branch_from: Option<u32>,
) -> Result<StepKind, StepError> {
    let has_branch_fields = branch_id.is_some() || branch_from.is_some();

    if is_revision {
        if has_branch_fields {
            return Err(StepError::RevisionBranchConflict);
        }
        let revises_index = revises.ok_or(StepError::RevisionPairing {
            detail: "is_revision is true but revises_thought is missing; name the thought being revised",
        })?;
        return Ok(StepKind::Revision { revises_index });
    }

    if revises.is_some() {
        return Err(StepError::RevisionPairing {
            detail: "revises_thought is set but is_revision is not true; set is_revision: true or drop revises_thought",
        });
    }

    match (branch_id, branch_from) {
        (None, None) => Ok(StepKind::Plain),
        (None, Some(_)) => Err(StepError::BranchPairing {
            detail: "branch_from_thought is set but branch_id is missing; name the branch with branch_id",
        }),
        (Some(id), _) if id.trim().is_empty() => Err(StepError::BranchPairing {
            detail: "branch_id must be a non-empty string",
        }),
        (Some(id), from) => Ok(StepKind::Branch {
            branch_id: id.to_string(),
            branch_from_index: from,
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, StepError> {
    optional(obj, field).ok_or(StepError::MissingField { field })
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, StepError> {
    required(obj, field)?.as_str().ok_or(StepError::InvalidType {
        field,
        expected: "a string",
    })
}

fn bool_value(field: &'static str, value: &Value) -> Result<bool, StepError> {
    value.as_bool().ok_or(StepError::InvalidType {
        field,
        expected: "a boolean",
    })
}

/// Accept only JSON integers in `1..=u32::MAX`.
fn positive_int(field: &'static str, value: &Value) -> Result<u32, StepError> {
    let Value::Number(n) = value else {
        return Err(StepError::InvalidType {
            field,
            expected: "a positive integer",
        });
    };

    if let Some(u) = n.as_u64() {
        return match u32::try_from(u) {
            Ok(v) if v >= 1 => Ok(v),
            _ => Err(StepError::InvalidNumber {
                field,
                value: u.to_string(),
            }),
        };
    }
    if let Some(i) = n.as_i64() {
        return Err(StepError::InvalidNumber {
            field,
            value: i.to_string(),
        });
    }
    Err(StepError::InvalidType {
        field,
        expected: "an integer, not a fraction",
    })
}
