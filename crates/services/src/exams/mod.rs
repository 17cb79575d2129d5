mod driver;
mod setup;

// Public API of the exam subsystem.
pub use crate::error::ExamServiceError;
pub use driver::ExamDriver;
pub use setup::ExamSetup;
