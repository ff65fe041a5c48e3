pub mod balance;
pub mod error;
pub mod error_classifier;
pub mod fee;
pub mod nonce;
pub mod orchestrator;
pub mod payload;
pub mod plan;
pub mod profile;
pub mod submit;
pub mod worker;

pub use error::BatchError;
pub use orchestrator::{BatchOrchestrator, BatchSummary};
pub use plan::{CollectPlan, MintPlan, PlanSource, SubmissionPlan};
pub use profile::{ConfirmationPolicy, ErrorPolicy, FeeBuffer, PipelineProfile};
pub use worker::{AccountReport, AccountStatus};
