//! Chain tracker: the ordered history of accepted steps and the branch index.
//!
//! The tracker is the only owner of chain state. [`ChainTracker::track`]
//! checks every chain-level invariant before it mutates anything, so a
//! rejected step leaves the chain exactly as it was.

use std::collections::BTreeMap;

use super::step::{ReasoningStep, StepKind};
use crate::error::StepError;

/// Numbering and termination state of one line (main line or a branch).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LineState {
    last_index: Option<u32>,
    terminated: bool,
}

/// A named alternative line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Step this branch diverged from.
    pub origin: u32,
    /// Steps on this branch, in acceptance order.
    pub steps: Vec<ReasoningStep>,
    line: LineState,
}

impl Branch {
    /// Whether a step on this branch declared `continues = false`.
    pub fn is_terminated(&self) -> bool {
        self.line.terminated
    }
}

/// What a successful [`ChainTracker::track`] call reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    /// The step as stored, with `estimated_total` normalized.
    pub step: ReasoningStep,
    /// History length after the append.
    pub history_len: usize,
    /// All known branch ids, sorted.
    pub branch_ids: Vec<String>,
}

/// Summary counts of a chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub history_len: usize,
    pub branch_count: usize,
    pub revision_count: usize,
    pub main_line_terminated: bool,
}

/// Owns `history` and `branches` for one reasoning chain.
#[derive(Debug, Clone, Default)]
pub struct ChainTracker {
    history: Vec<ReasoningStep>,
    branches: BTreeMap<String, Branch>,
    main: LineState,
    revision_count: usize,
}

impl ChainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accepted step, in acceptance order.
    pub fn history(&self) -> &[ReasoningStep] {
        &self.history
    }

    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.get(branch_id)
    }

    /// Known branch ids, sorted.
    pub fn branch_ids(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            history_len: self.history.len(),
            branch_count: self.branches.len(),
            revision_count: self.revision_count,
            main_line_terminated: self.main.terminated,
        }
    }

    /// Whether any recorded step carries `index`.
    fn contains_index(&self, index: u32) -> bool {
        self.history.iter().any(|s| s.index == index)
    }

    /// Check chain invariants and, only if they all hold, record `step`.
    ///
    /// # Errors
    ///
    /// - `InvalidBranchReference` / `InvalidRevisionReference` when the
    ///   referenced step is not in the history
    /// - `UnknownBranch` for a continuation of a branch that was never started
    /// - `NonMonotonicNumber` when a non-revision step does not advance its line
    /// - `LineAlreadyTerminated` for a second `continues = false` on one line
    pub fn track(&mut self, mut step: ReasoningStep) -> Result<TrackSummary, StepError> {
        self.check(&step)?;

        step.normalize();

        match &step.kind {
            StepKind::Plain => {
                advance(&mut self.main, &step);
            }
            StepKind::Revision { .. } => {
                // Revisions annotate rather than renumber; they never move
                // the main line's last index.
                self.revision_count += 1;
                if !step.continues {
                    self.main.terminated = true;
                }
            }
            StepKind::Branch {
                branch_id,
                branch_from_index,
            } => {
                let branch = self
                    .branches
                    .entry(branch_id.clone())
                    .or_insert_with(|| Branch {
                        // check() guarantees a new branch names its origin.
                        origin: branch_from_index.unwrap_or_default(),
                        steps: Vec::new(),
                        line: LineState::default(),
                    });
                advance(&mut branch.line, &step);
                branch.steps.push(step.clone());
            }
        }

        self.history.push(step.clone());

        Ok(TrackSummary {
            step,
            history_len: self.history.len(),
            branch_ids: self.branch_ids(),
        })
    }

    /// Side-effect-free invariant checks for `step`.
    fn check(&self, step: &ReasoningStep) -> Result<(), StepError> {
        match &step.kind {
            StepKind::Plain => {
                check_line(&self.main, step, || "the main line".to_string())?;
            }
            StepKind::Revision { revises_index } => {
                if !self.contains_index(*revises_index) {
                    return Err(StepError::InvalidRevisionReference {
                        revises: *revises_index,
                        history_len: self.history.len(),
                    });
                }
                if !step.continues && self.main.terminated {
                    return Err(StepError::LineAlreadyTerminated {
                        line: "the main line".to_string(),
                    });
                }
            }
            StepKind::Branch {
                branch_id,
                branch_from_index,
            } => {
                if let Some(from) = branch_from_index {
                    if !self.contains_index(*from) {
                        return Err(StepError::InvalidBranchReference {
                            branch_from: *from,
                            history_len: self.history.len(),
                        });
                    }
                }
                match self.branches.get(branch_id) {
                    Some(branch) => {
                        check_line(&branch.line, step, || format!("branch '{branch_id}'"))?;
                    }
                    None if branch_from_index.is_none() => {
                        return Err(StepError::UnknownBranch {
                            branch_id: branch_id.clone(),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }
}

/// Numbering and termination checks for a non-revision step on `line`.
fn check_line(
    line: &LineState,
    step: &ReasoningStep,
    name: impl Fn() -> String,
) -> Result<(), StepError> {
    if let Some(previous) = line.last_index {
        if step.index <= previous {
            return Err(StepError::NonMonotonicNumber {
                thought_number: step.index,
                previous,
                line: name(),
            });
        }
    }
    if !step.continues && line.terminated {
        return Err(StepError::LineAlreadyTerminated { line: name() });
    }
    Ok(())
}

fn advance(line: &mut LineState, step: &ReasoningStep) {
    line.last_index = Some(step.index);
    if !step.continues {
        line.terminated = true;
    }
}
