//! The reasoning chain: schema validation, tracking, guidance and the
//! engine that sequences them.
//!
//! Data flow for one call:
//!
//! ```text
//! raw arguments ─► StepValidator ─► cap check ─► ChainTracker ─► StepResponse
//!                       │                │              │
//!                       └── failed ◄─────┼──────────────┘  (guidance attached)
//!                                        └──► aborted
//! ```

pub mod engine;
pub mod guidance;
pub mod response;
pub mod step;
pub mod tracker;
pub mod validator;

pub use engine::ReasoningEngine;
pub use guidance::{Guidance, example_for};
pub use response::{AbortedChain, FailedStep, ProcessedStep, StepResponse};
pub use step::{ReasoningStep, StepKind, fields};
pub use tracker::{ChainStats, ChainTracker, TrackSummary};
pub use validator::StepValidator;
