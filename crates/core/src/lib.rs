pub mod agreement;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod query;
pub mod rates;
pub mod store;
pub mod workflow;
pub mod workspace;

pub use agreement::{AgreementDefaults, AgreementDocument};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::actor::{Actor, ActorDirectory, ActorId, Role};
pub use domain::analysis::{AnalysisResult, SensitivityPoint, SensitivityScenario};
pub use domain::request::{
    Comment, DraftFields, PricingRequest, RequestId, RequestStatus, RequestType,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use query::DashboardSummary;
pub use rates::{Discount, RateCalculator, RateError, RateInput, RateQuote, StaticRateCalculator};
pub use store::RequestStore;
pub use workflow::{CapabilityTable, TransitionOutcome, TransitionRejection, WorkflowEngine};
pub use workspace::Workspace;
