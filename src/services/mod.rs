//! Service layer: schema bootstrap and database readiness.

pub mod bootstrapper;
pub mod readiness;

pub use bootstrapper::{
    ActionState, BootstrapError, BootstrapPlan, BootstrapReport, IndexMismatch, PlannedAction,
    SchemaBootstrapper, VerificationReport,
};
pub use readiness::wait_until_ready;
