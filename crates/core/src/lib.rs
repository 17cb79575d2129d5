#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod session;
pub mod time;
pub mod timer;

pub use config::{ExamSettings, ExamSettingsDraft, ExamSettingsError};
pub use error::ExamError;
pub use progress::{
    ExamReport, ExamSnapshot, PaletteEntry, QuestionOutcome, StatusCounts, SubmitReason,
};
pub use session::ExamSession;
pub use time::Clock;
pub use timer::{CountdownTimer, TimerEvent, TimerPhase, Urgency};
