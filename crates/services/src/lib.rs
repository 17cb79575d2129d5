#![forbid(unsafe_code)]

pub mod error;
pub mod exams;

pub use exam_core::Clock;

pub use error::ExamServiceError;
pub use exams::{ExamDriver, ExamSetup};
