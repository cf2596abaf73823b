//! thoughtchain core: transport-agnostic reasoning chain library.
//!
//! This library provides the step schema validator, the chain tracker, the
//! guidance generator and the reasoning engine that sequences them, together
//! with the response model, JSON-RPC classification and configuration used
//! by the stdio server in the `thoughtchain` crate.
//!
//! The engine owns all mutable chain state. Nothing in this crate performs
//! I/O on the request path; callers are expected to serialise access to a
//! single [`ReasoningEngine`](reasoning::ReasoningEngine) per chain.

pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod reasoning;

pub use error::{ReasonCode, StepError};
pub use reasoning::{ChainStats, ReasoningEngine, ReasoningStep, StepKind, StepResponse};
