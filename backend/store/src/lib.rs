pub mod sqlite;
pub mod store;

pub use sqlite::SqliteCourseStore;
pub use store::{CourseStore, IntakeLogStore, NewCourse};
