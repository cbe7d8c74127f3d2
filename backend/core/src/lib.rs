pub mod clock;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::PacelineError;
pub use types::{
    Course, CourseId, CourseStatus, IntakeLog, LogId, LogStatus, RemovalReason, MAX_APPEALS,
};
