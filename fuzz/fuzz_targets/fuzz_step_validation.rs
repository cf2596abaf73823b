#![no_main]

//! Fuzz target for step validation and chain tracking.
//!
//! # Goal
//! Verify that arbitrary tool arguments never:
//! - Panic the validator or tracker
//! - Mutate the chain when the call is rejected
//! - Produce a response that fails to encode

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

use thoughtchain_core::config::EngineConfig;
use thoughtchain_core::{ReasoningEngine, StepResponse};

/// A field value with the shapes the validator has to tell apart.
#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<u8>),
}

impl FuzzValue {
    fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Int(n) => Value::from(n),
            Self::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s),
            Self::List(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        }
    }
}

const FIELDS: [&str; 9] = [
    "thought",
    "thought_number",
    "total_thoughts",
    "next_thought_needed",
    "is_revision",
    "revises_thought",
    "branch_from_thought",
    "branch_id",
    "needs_more_thoughts",
];

#[derive(Arbitrary, Debug)]
struct FuzzCall {
    /// Field index (mod FIELDS.len()) and value pairs.
    fields: Vec<(u8, FuzzValue)>,
    /// Send a non-object instead.
    bare: Option<FuzzValue>,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    max_thoughts: u8,
    max_thought_length: u8,
    calls: Vec<FuzzCall>,
}

fuzz_target!(|input: FuzzInput| {
    let mut engine = ReasoningEngine::new(EngineConfig {
        max_thoughts: u32::from(input.max_thoughts).max(1),
        max_thought_length: usize::from(input.max_thought_length).max(1),
        operation_timeout: None,
    });

    for call in input.calls.into_iter().take(64) {
        let args = match call.bare {
            Some(value) => value.into_json(),
            None => {
                let mut map = Map::new();
                for (idx, value) in call.fields {
                    let name = FIELDS[usize::from(idx) % FIELDS.len()];
                    map.insert(name.to_string(), value.into_json());
                }
                Value::Object(map)
            }
        };

        let before = engine.stats();
        let response = engine.process(&args);
        if !matches!(response, StepResponse::Processed(_)) {
            assert_eq!(engine.stats(), before, "rejected call mutated the chain");
        }
        assert!(response.to_json_string().is_ok());
    }
});
