//! Corrective guidance for rejected steps.
//!
//! Callers most often fail by omitting a companion field (setting
//! `is_revision` without `revises_thought`, say). A concrete, valid example
//! next to one sentence of advice fixes that faster than the error alone.

use serde_json::Value;

use super::step::ReasoningStep;
use crate::error::{ErrorCategory, ReasonCode};

/// One sentence of advice plus a syntactically valid example request.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    pub hint: &'static str,
    pub example: Value,
}

/// Build the guidance for a rejection reason.
pub fn example_for(reason: ReasonCode) -> Guidance {
    let (hint, step) = match reason.category() {
        ErrorCategory::Length => (
            "Keep each thought focused and non-empty; split long reasoning across several numbered thoughts.",
            ReasoningStep::plain(
                "First part of the analysis: list the constraints before evaluating options.",
                1,
                3,
                true,
            ),
        ),
        ErrorCategory::Branch => (
            "Start a branch with both branch_id and branch_from_thought naming an existing thought; later steps on the same branch need only branch_id.",
            ReasoningStep::plain(
                "Alternative approach: try caching the intermediate results instead.",
                3,
                5,
                true,
            )
            .on_branch("cache-approach", Some(2)),
        ),
        ErrorCategory::Revision => (
            "A revision sets is_revision: true and revises_thought to an existing thought number, and carries no branch fields.",
            ReasoningStep::plain(
                "Correction: the bound in thought 1 should be inclusive, not exclusive.",
                4,
                5,
                true,
            )
            .revising(1),
        ),
        ErrorCategory::Numbering => (
            "Number thoughts with positive integers that increase along each line, and set next_thought_needed to false only once per line.",
            ReasoningStep::plain("Next step: compare the two candidate designs.", 2, 4, true),
        ),
        ErrorCategory::Generic => (
            "Send an object with thought (string), thought_number and total_thoughts (positive integers), and next_thought_needed (boolean).",
            ReasoningStep::plain("Begin by restating the problem in my own words.", 1, 3, true),
        ),
    };

    Guidance {
        hint,
        example: step.to_wire(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::validator::StepValidator;

    const ALL: [ReasonCode; 14] = [
        ReasonCode::NotAnObject,
        ReasonCode::MissingField,
        ReasonCode::InvalidType,
        ReasonCode::EmptyText,
        ReasonCode::TextTooLong,
        ReasonCode::InvalidNumber,
        ReasonCode::RevisionPairing,
        ReasonCode::BranchPairing,
        ReasonCode::RevisionBranchConflict,
        ReasonCode::InvalidRevisionReference,
        ReasonCode::InvalidBranchReference,
        ReasonCode::UnknownBranch,
        ReasonCode::NonMonotonicNumber,
        ReasonCode::LineAlreadyTerminated,
    ];

    #[test]
    fn test_every_example_validates() {
        let validator = StepValidator::new(1_000);
        for reason in ALL {
            let guidance = example_for(reason);
            assert!(
                validator.validate(&guidance.example).is_ok(),
                "example for {reason} must be a valid request"
            );
            assert!(!guidance.hint.is_empty());
        }
    }

    #[test]
    fn test_revision_example_carries_pair() {
        let example = example_for(ReasonCode::RevisionPairing).example;
        assert_eq!(example["is_revision"], true);
        assert!(example["revises_thought"].is_u64());
        assert!(example.get("branch_id").is_none());
    }

    #[test]
    fn test_branch_example_carries_pair() {
        let example = example_for(ReasonCode::UnknownBranch).example;
        assert!(example["branch_id"].is_string());
        assert!(example["branch_from_thought"].is_u64());
        assert!(example.get("is_revision").is_none());
    }
}
