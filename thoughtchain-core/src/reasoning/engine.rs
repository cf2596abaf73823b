//! The reasoning engine: validate → cap check → track → respond.
//!
//! The engine is the only long-lived, stateful object. Each call to
//! [`ReasoningEngine::process`] is a complete traversal
//! `Idle → Validating → (Rejected | LimitExceeded | Tracking) → Responded`,
//! and every rejection is converted into a response here rather than
//! propagated to the transport.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::guidance::example_for;
use super::response::StepResponse;
use super::step::ReasoningStep;
use super::tracker::{ChainStats, ChainTracker};
use super::validator::StepValidator;
use crate::config::EngineConfig;
use crate::error::StepError;

/// Validates, tracks and answers reasoning steps for one chain.
///
/// Not internally synchronised: callers that share an engine across tasks
/// must hold a single lock around each `process` call, since acceptance
/// order defines numbering and reference validity.
#[derive(Debug, Clone)]
pub struct ReasoningEngine {
    config: EngineConfig,
    validator: StepValidator,
    tracker: ChainTracker,
}

impl ReasoningEngine {
    /// Create an engine with an empty chain.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            validator: StepValidator::new(config.max_thought_length),
            tracker: ChainTracker::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ChainTracker {
        &self.tracker
    }

    pub fn stats(&self) -> ChainStats {
        self.tracker.stats()
    }

    /// Process one raw `sequential_thinking` arguments object.
    pub fn process(&mut self, raw: &Value) -> StepResponse {
        let step = match self.validator.validate(raw) {
            Ok(step) => step,
            Err(err) => return self.reject(err, "validation"),
        };
        self.process_step(step)
    }

    /// Process an already-validated step.
    ///
    /// Used by collaborators that build steps directly instead of parsing a
    /// request payload.
    pub fn process_step(&mut self, step: ReasoningStep) -> StepResponse {
        if step.index > self.config.max_thoughts {
            let stats = self.tracker.stats();
            warn!(
                thought_number = step.index,
                max_thoughts = self.config.max_thoughts,
                history_len = stats.history_len,
                "thought cap exceeded, chain aborted"
            );
            return StepResponse::aborted(self.config.max_thoughts, stats);
        }

        match self.tracker.track(step) {
            Ok(summary) => {
                debug!(
                    thought_number = summary.step.index,
                    total_thoughts = summary.step.estimated_total,
                    branch_id = summary.step.branch_id(),
                    revision = summary.step.is_revision(),
                    history_len = summary.history_len,
                    "thought accepted"
                );
                if !summary.step.continues {
                    info!(
                        thought_number = summary.step.index,
                        branch_id = summary.step.branch_id(),
                        "reasoning line finished"
                    );
                }
                StepResponse::processed(summary)
            }
            Err(err) => self.reject(err, "tracking"),
        }
    }

    fn reject(&self, err: StepError, stage: &'static str) -> StepResponse {
        let reason = err.reason();
        warn!(
            stage,
            reason = %reason,
            error = %err,
            history_len = self.tracker.history().len(),
            "thought rejected"
        );
        StepResponse::failed(&err, example_for(reason))
    }
}
