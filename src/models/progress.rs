//! Progress track model
//!
//! The analysis pipeline runs a fixed sequence of stages. The server pushes
//! the whole step list on every update, and the client replaces its track
//! wholesale; snapshots are never merged or diffed. The server alone is
//! responsible for snapshot completeness.

use serde::{Deserialize, Serialize};

/// Fixed pipeline stage labels, in execution order.
///
/// Stage 1 is the client-side upload; the rest run server-side. This list is
/// the single source of truth for the seeded initial track and the
/// all-completed track a rehydrated session shows.
pub const PIPELINE_STAGES: [&str; 6] = [
    "Uploading Images to Server",
    "Classification of Map Legend Type",
    "Segmentation of Map Components",
    "Segmentation of State Boundaries",
    "Text Data Extraction using OCR",
    "State Color to Legend Data Mapping",
];

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One step of the pipeline, as pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    /// 1-based position; unique and dense within a track
    pub step: u32,
    pub label: String,
    pub status: StepStatus,
}

/// Ordered sequence of pipeline steps.
///
/// Ordering is by `step`, not by arrival: pushed snapshots may list steps in
/// any order and are sorted on replacement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressTrack {
    steps: Vec<ProgressStep>,
}

impl ProgressTrack {
    /// Empty track (no submission in flight).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Deterministic track seeded right after a successful upload ack:
    /// stage 1 completed, the remaining stages processing. Gives the UI
    /// immediate feedback before the first pushed snapshot arrives.
    pub fn initial() -> Self {
        Self::with_statuses(|i| {
            if i == 0 {
                StepStatus::Completed
            } else {
                StepStatus::Processing
            }
        })
    }

    /// Track with every fixed stage completed, as shown for a rehydrated
    /// (already finished) session.
    pub fn all_completed() -> Self {
        Self::with_statuses(|_| StepStatus::Completed)
    }

    fn with_statuses(status: impl Fn(usize) -> StepStatus) -> Self {
        let steps = PIPELINE_STAGES
            .iter()
            .enumerate()
            .map(|(i, label)| ProgressStep {
                step: (i + 1) as u32,
                label: (*label).to_string(),
                status: status(i),
            })
            .collect();
        Self { steps }
    }

    /// Replace the track wholesale with a pushed snapshot.
    ///
    /// Last-write-wins and idempotent. A later snapshot may show fewer
    /// completed steps than its predecessor; it still simply overwrites.
    pub fn replace(&mut self, mut snapshot: Vec<ProgressStep>) {
        snapshot.sort_by_key(|s| s.step);
        self.steps = snapshot;
    }

    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }
}
