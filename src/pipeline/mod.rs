// Validation pipeline — request/decision records and the engine that
// turns one into the other.

pub mod decision;
pub mod engine;

pub use decision::{BlockReason, ValidationDecision, ValidationRequest};
pub use engine::{DecisionEngine, DecisionPolicy};
