//! Response objects returned by the engine.
//!
//! Every call yields exactly one [`StepResponse`], serialized with a
//! `status` tag of `processed`, `failed` or `aborted`.

use serde::Serialize;

use super::guidance::Guidance;
use super::tracker::{ChainStats, TrackSummary};
use crate::error::{ReasonCode, StepError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResponse {
    Processed(ProcessedStep),
    Failed(FailedStep),
    Aborted(AbortedChain),
}

/// Acknowledgement of an accepted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedStep {
    pub thought_number: u32,
    /// Normalized: never below `thought_number`.
    pub total_thoughts: u32,
    pub next_thought_needed: bool,
    pub branches: Vec<String>,
    pub thought_history_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revises_thought: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_more_thoughts: Option<bool>,
}

/// A rejected step, with enough context for the caller to self-correct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedStep {
    pub error: String,
    pub reason: ReasonCode,
    pub guidance: String,
    pub example: serde_json::Value,
}

/// The step-count cap was exceeded; the chain was not touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortedChain {
    pub error: String,
    pub max_thoughts: u32,
    pub thought_history_length: usize,
    pub branch_count: usize,
    pub revision_count: usize,
}

impl StepResponse {
    pub(crate) fn processed(summary: TrackSummary) -> Self {
        let step = summary.step;
        Self::Processed(ProcessedStep {
            thought_number: step.index,
            total_thoughts: step.estimated_total,
            next_thought_needed: step.continues,
            branches: summary.branch_ids,
            thought_history_length: summary.history_len,
            revises_thought: step.revises_index(),
            branch_id: step.branch_id().map(String::from),
            needs_more_thoughts: step.more_steps_hint,
        })
    }

    pub(crate) fn failed(err: &StepError, guidance: Guidance) -> Self {
        Self::Failed(FailedStep {
            error: err.to_string(),
            reason: err.reason(),
            guidance: guidance.hint.to_string(),
            example: guidance.example,
        })
    }

    pub(crate) fn aborted(max_thoughts: u32, stats: ChainStats) -> Self {
        Self::Aborted(AbortedChain {
            error: format!(
                "thought rejected: thought_number exceeds the maximum of {max_thoughts} thoughts"
            ),
            max_thoughts,
            thought_history_length: stats.history_len,
            branch_count: stats.branch_count,
            revision_count: stats.revision_count,
        })
    }

    /// The wire status label.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Processed(_) => "processed",
            Self::Failed(_) => "failed",
            Self::Aborted(_) => "aborted",
        }
    }

    /// Whether the response reports anything other than acceptance.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Processed(_))
    }

    /// Encode as a compact JSON object.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` encoding failures; callers must not emit a
    /// partial frame when this fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::guidance::example_for;
    use crate::reasoning::step::ReasoningStep;
    use serde_json::json;

    #[test]
    fn test_processed_shape() {
        let response = StepResponse::processed(TrackSummary {
            step: ReasoningStep::plain("A", 1, 3, true),
            history_len: 1,
            branch_ids: vec![],
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({
                "status": "processed",
                "thought_number": 1,
                "total_thoughts": 3,
                "next_thought_needed": true,
                "branches": [],
                "thought_history_length": 1,
            })
        );
        assert!(!response.is_error());
    }

    #[test]
    fn test_failed_shape() {
        let err = StepError::RevisionBranchConflict;
        let response = StepResponse::failed(&err, example_for(err.reason()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "revision_branch_conflict");
        assert!(json["error"].as_str().unwrap().contains("both a revision and a branch"));
        assert!(json["guidance"].is_string());
        assert!(json["example"].is_object());
        assert!(response.is_error());
    }

    #[test]
    fn test_aborted_shape() {
        let response = StepResponse::aborted(
            10,
            ChainStats {
                history_len: 4,
                branch_count: 1,
                revision_count: 2,
                main_line_terminated: false,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["max_thoughts"], 10);
        assert_eq!(json["thought_history_length"], 4);
        assert_eq!(json["branch_count"], 1);
        assert_eq!(json["revision_count"], 2);
        assert_eq!(response.status(), "aborted");

        // Only this thought is rejected; the chain stays open.
        let error = json["error"].as_str().unwrap();
        assert!(error.starts_with("thought rejected"));
        assert!(!error.contains("stopped"));
    }
}
