//! Property-based tests for chain invariants and stdout purity.
//!
//! Random sequences of tool arguments, valid and invalid, are pushed through
//! one engine; after every call the accepted chain must still satisfy the
//! numbering, termination and reference rules, and rejected calls must leave
//! it untouched.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use thoughtchain::stdio::{FrameFilter, is_protocol_frame};
use thoughtchain_core::config::EngineConfig;
use thoughtchain_core::{ReasoningEngine, ReasoningStep, StepKind, StepResponse};

const CAP: u32 = 12;

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Tool arguments drawn from a small space so that collisions (repeated
/// numbers, reused branch ids, dangling references) are frequent.
fn arb_arguments() -> impl Strategy<Value = Value> {
    (
        prop_oneof![Just("step".to_string()), Just(String::new()), "[a-z ]{1,12}"],
        1u32..=CAP + 2,
        1u32..=CAP,
        any::<bool>(),
        prop::option::of(1u32..=CAP),
        prop::option::of(1u32..=CAP),
        prop::option::of(prop_oneof![Just("a"), Just("b")]),
        any::<bool>(),
    )
        .prop_map(
            |(thought, number, total, next, revises, branch_from, branch_id, is_revision)| {
                let mut args = Map::new();
                args.insert("thought".into(), json!(thought));
                args.insert("thought_number".into(), json!(number));
                args.insert("total_thoughts".into(), json!(total));
                args.insert("next_thought_needed".into(), json!(next));
                if is_revision {
                    args.insert("is_revision".into(), json!(true));
                }
                if let Some(n) = revises {
                    args.insert("revises_thought".into(), json!(n));
                }
                if let Some(n) = branch_from {
                    args.insert("branch_from_thought".into(), json!(n));
                }
                if let Some(id) = branch_id {
                    args.insert("branch_id".into(), json!(id));
                }
                Value::Object(args)
            },
        )
}

fn arb_sequence() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_arguments(), 1..40)
}

/// A stdout byte stream mixing frames, log noise and blank lines, cut into
/// arbitrary write sizes.
fn arb_stdout_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z0-9 :=]{0,20}",
            "\\{\"jsonrpc\":\"2.0\",\"id\":[0-9]{1,3}\\}",
            " *\\[[0-9,]{0,6}\\]",
            " {0,3}",
        ],
        0..20,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Invariant Checks
// ─────────────────────────────────────────────────────────────────────────────

fn line_key(step: &ReasoningStep) -> Option<String> {
    match &step.kind {
        StepKind::Branch { branch_id, .. } => Some(branch_id.clone()),
        _ => None,
    }
}

fn check_chain(history: &[ReasoningStep]) -> Result<(), TestCaseError> {
    let mut last_index: BTreeMap<Option<String>, u32> = BTreeMap::new();
    let mut terminations: BTreeMap<Option<String>, usize> = BTreeMap::new();
    let mut seen: HashSet<u32> = HashSet::new();

    for step in history {
        prop_assert!(step.estimated_total >= step.index, "estimate below index: {step:?}");

        let key = line_key(step);
        match &step.kind {
            StepKind::Revision { revises_index } => {
                prop_assert!(seen.contains(revises_index), "dangling revision: {step:?}");
            }
            StepKind::Branch {
                branch_from_index: Some(from),
                ..
            } => {
                prop_assert!(seen.contains(from), "dangling branch origin: {step:?}");
            }
            _ => {}
        }
        if !step.is_revision() {
            if let Some(previous) = last_index.get(&key) {
                prop_assert!(step.index > *previous, "non-monotonic line: {step:?}");
            }
            last_index.insert(key.clone(), step.index);
        }
        if !step.continues {
            *terminations.entry(key).or_default() += 1;
        }
        seen.insert(step.index);
    }

    for (line, count) in terminations {
        prop_assert!(count <= 1, "line {line:?} terminated {count} times");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn accepted_chain_keeps_invariants(sequence in arb_sequence()) {
        let mut engine = ReasoningEngine::new(EngineConfig {
            max_thoughts: CAP,
            ..EngineConfig::default()
        });

        for args in &sequence {
            let before = engine.stats();
            let response = engine.process(args);
            let after = engine.stats();

            match response {
                StepResponse::Processed(ok) => {
                    prop_assert_eq!(after.history_len, before.history_len + 1);
                    prop_assert_eq!(ok.thought_history_length, after.history_len);
                }
                StepResponse::Failed(_) | StepResponse::Aborted(_) => {
                    prop_assert_eq!(after, before, "rejected call mutated the chain");
                }
            }
            check_chain(engine.tracker().history())?;
        }
    }

    #[test]
    fn branch_sequences_mirror_history(sequence in arb_sequence()) {
        let mut engine = ReasoningEngine::new(EngineConfig::default());
        for args in &sequence {
            engine.process(args);
        }

        let tracker = engine.tracker();
        for id in tracker.branch_ids() {
            let branch = tracker.branch(&id).unwrap();
            let from_history: Vec<&ReasoningStep> = tracker
                .history()
                .iter()
                .filter(|s| s.branch_id() == Some(id.as_str()))
                .collect();
            prop_assert_eq!(branch.steps.iter().collect::<Vec<_>>(), from_history);
        }
    }

    #[test]
    fn cap_abort_is_idempotent(prefix in arb_sequence(), over in CAP + 1..CAP + 50) {
        let mut engine = ReasoningEngine::new(EngineConfig {
            max_thoughts: CAP,
            ..EngineConfig::default()
        });
        for args in &prefix {
            engine.process(args);
        }

        let args = json!({
            "thought": "past the cap",
            "thought_number": over,
            "total_thoughts": over,
            "next_thought_needed": true
        });
        let first = serde_json::to_value(engine.process(&args)).unwrap();
        let second = serde_json::to_value(engine.process(&args)).unwrap();
        prop_assert_eq!(&first["status"], "aborted");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn frame_filter_emits_only_frames(
        lines in arb_stdout_lines(),
        cuts in prop::collection::vec(1usize..16, 0..64),
    ) {
        let mut input = Vec::new();
        for line in &lines {
            input.extend_from_slice(line.as_bytes());
            input.push(b'\n');
        }

        let mut filter = FrameFilter::new(Vec::new());
        let mut rest = input.as_slice();
        for cut in cuts {
            let n = cut.min(rest.len());
            filter.write_all(&rest[..n]).unwrap();
            rest = &rest[n..];
        }
        filter.write_all(rest).unwrap();
        filter.flush().unwrap();
        let output = filter.into_inner();

        let expected: Vec<u8> = lines
            .iter()
            .filter(|l| is_protocol_frame(l.as_bytes()))
            .flat_map(|l| l.bytes().chain(std::iter::once(b'\n')))
            .collect();
        prop_assert_eq!(output, expected);
    }
}
