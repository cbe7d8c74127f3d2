//! The task catalogue: eight periodic jobs composing the deadline
//! calculator, dedup ledger, guarded store, and retrier.

mod appeal_button;
mod appeal_expiry;
mod late_strike;
mod no_video;
mod pre_intake;
mod reshoot_expiry;
mod review_expiry;
mod topic_cleanup;

pub use appeal_button::AppealButtonTask;
pub use appeal_expiry::AppealExpiryTask;
pub use late_strike::LateStrikeTask;
pub use no_video::NoVideoTask;
pub use pre_intake::PreIntakeTask;
pub use reshoot_expiry::ReshootExpiryTask;
pub use review_expiry::ReviewExpiryTask;
pub use topic_cleanup::TopicCleanupTask;
