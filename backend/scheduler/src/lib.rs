pub mod context;
pub mod deadline;
pub mod delay;
pub mod runner;
pub mod task;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::{ScheduleConfig, TickContext};
pub use delay::DelayQueue;
pub use runner::Scheduler;
pub use task::PeriodicTask;
