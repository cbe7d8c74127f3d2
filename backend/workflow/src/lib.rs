//! Human-driven flows: invite redemption, the appeal lifecycle, and
//! supervisor actions. These race the scheduler on the same course rows;
//! correctness rests entirely on the store's guarded transitions.

pub mod activation;
pub mod appeal;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testutil;

pub use activation::{ActivationFlow, ActivationOutcome};
pub use appeal::AppealWorkflow;
pub use supervisor::SupervisorActions;
