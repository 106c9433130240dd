pub mod capabilities;
pub mod engine;

pub use capabilities::{
    CapabilityTable, EdgeKind, Guard, TransitionEffect, TransitionRejection, TransitionRule,
};
pub use engine::{TransitionOutcome, WorkflowEngine, DEFAULT_ID_PREFIX};
