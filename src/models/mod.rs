//! Core data model: tabular records, progress tracks, and the session
//! lifecycle state machine.

pub mod progress;
pub mod record;
pub mod session;

pub use progress::{ProgressStep, ProgressTrack, StepStatus, PIPELINE_STAGES};
pub use record::{manifest_file_names, Cell, Record};
pub use session::{follow_channel, Session, SessionPhase, SessionPolicy};
