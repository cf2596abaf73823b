//! The validated unit of work in a reasoning chain.

use serde_json::{Map, Value};

/// Wire names of the request fields.
pub mod fields {
    pub const THOUGHT: &str = "thought";
    pub const THOUGHT_NUMBER: &str = "thought_number";
    pub const TOTAL_THOUGHTS: &str = "total_thoughts";
    pub const NEXT_THOUGHT_NEEDED: &str = "next_thought_needed";
    pub const IS_REVISION: &str = "is_revision";
    pub const REVISES_THOUGHT: &str = "revises_thought";
    pub const BRANCH_FROM_THOUGHT: &str = "branch_from_thought";
    pub const BRANCH_ID: &str = "branch_id";
    pub const NEEDS_MORE_THOUGHTS: &str = "needs_more_thoughts";
}

/// Which of the three mutually exclusive step shapes a step has.
///
/// Revision and branch markers can never coexist on one step; the type makes
/// that unrepresentable once a payload has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// An ordinary step on the main line.
    Plain,
    /// Replaces the content of an earlier step without removing it.
    Revision {
        /// Number of the step being revised.
        revises_index: u32,
    },
    /// Starts or continues a named alternative line.
    Branch {
        /// Name of the branch.
        branch_id: String,
        /// Step the branch diverges from. Required only when the branch is
        /// first created; continuations may omit it.
        branch_from_index: Option<u32>,
    },
}

/// One accepted (or about-to-be-accepted) reasoning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningStep {
    /// The reasoning text. Never empty after trimming.
    pub text: String,
    /// The step's position claim, `>= 1`.
    pub index: u32,
    /// Author's estimate of the chain length, `>= 1`.
    pub estimated_total: u32,
    /// Whether the author intends to submit further steps on this line.
    pub continues: bool,
    /// Plain, revision or branch.
    pub kind: StepKind,
    /// Non-binding signal that unplanned steps may follow.
    pub more_steps_hint: Option<bool>,
}

impl ReasoningStep {
    /// A plain main-line step.
    pub fn plain(text: impl Into<String>, index: u32, estimated_total: u32, continues: bool) -> Self {
        Self {
            text: text.into(),
            index,
            estimated_total,
            continues,
            kind: StepKind::Plain,
            more_steps_hint: None,
        }
    }

    /// Turn this step into a revision of `revises_index`.
    pub fn revising(mut self, revises_index: u32) -> Self {
        self.kind = StepKind::Revision { revises_index };
        self
    }

    /// Put this step on branch `branch_id`, optionally naming its origin.
    pub fn on_branch(mut self, branch_id: impl Into<String>, branch_from_index: Option<u32>) -> Self {
        self.kind = StepKind::Branch {
            branch_id: branch_id.into(),
            branch_from_index,
        };
        self
    }

    pub fn is_revision(&self) -> bool {
        matches!(self.kind, StepKind::Revision { .. })
    }

    pub fn revises_index(&self) -> Option<u32> {
        match self.kind {
            StepKind::Revision { revises_index } => Some(revises_index),
            _ => None,
        }
    }

    pub fn branch_id(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Branch { branch_id, .. } => Some(branch_id),
            _ => None,
        }
    }

    pub fn branch_from_index(&self) -> Option<u32> {
        match self.kind {
            StepKind::Branch {
                branch_from_index, ..
            } => branch_from_index,
            _ => None,
        }
    }

    /// Raise `estimated_total` to `index` when the author under-estimated.
    ///
    /// Progress is never reported above 100%.
    pub fn normalize(&mut self) {
        if self.index > self.estimated_total {
            self.estimated_total = self.index;
        }
    }

    /// Render as an inbound request payload (the shape clients submit).
    pub fn to_wire(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(fields::THOUGHT.into(), Value::from(self.text.clone()));
        obj.insert(fields::THOUGHT_NUMBER.into(), Value::from(self.index));
        obj.insert(fields::TOTAL_THOUGHTS.into(), Value::from(self.estimated_total));
        obj.insert(fields::NEXT_THOUGHT_NEEDED.into(), Value::from(self.continues));

        match &self.kind {
            StepKind::Plain => {}
            StepKind::Revision { revises_index } => {
                obj.insert(fields::IS_REVISION.into(), Value::from(true));
                obj.insert(fields::REVISES_THOUGHT.into(), Value::from(*revises_index));
            }
            StepKind::Branch {
                branch_id,
                branch_from_index,
            } => {
                if let Some(from) = branch_from_index {
                    obj.insert(fields::BRANCH_FROM_THOUGHT.into(), Value::from(*from));
                }
                obj.insert(fields::BRANCH_ID.into(), Value::from(branch_id.clone()));
            }
        }

        if let Some(hint) = self.more_steps_hint {
            obj.insert(fields::NEEDS_MORE_THOUGHTS.into(), Value::from(hint));
        }

        Value::Object(obj)
    }
}
