//! Analysis session lifecycle state machine
//!
//! One `Session` owns the whole lifecycle of a single analysis run:
//! submission, live progress ingestion, terminal success or failure, and
//! reset. The session is an explicitly owned value (there is no ambient
//! singleton) and all mutations go through the transition methods here, so
//! a driver task (or a test) is the single writer.
//!
//! Channel events are applied through one ingestion function,
//! [`Session::apply`], which guards against stale events: a message is only
//! applied if it still targets the current session identifier and the
//! session is still awaiting progress. Events arriving after reset or after
//! a terminal transition are ignored.

use chrono::{DateTime, Utc};
use futures::{pin_mut, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::assets::FileAsset;
use crate::channel::ChannelMessage;
use crate::error::{Error, FailureKind, Result};
use crate::models::progress::ProgressTrack;
use crate::models::record::Record;

/// Client-side upload bound, enforced before any network call.
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 10;

/// Session policy knobs, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Reject submissions with more files than this
    pub max_upload_files: usize,
    /// Keep the pushed summary for diagnostic display when the pipeline
    /// reports failure (the result table is always discarded in that case)
    pub retain_summary_on_failure: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
            retain_summary_on_failure: true,
        }
    }
}

/// Lifecycle phase of a session.
///
/// `Rehydrating` is an alternate entry parallel to `Submitting`, reached
/// only from a URL-carried identifier, never from a user upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Submitting,
    Rehydrating,
    AwaitingProgress,
    Completed,
    Failed(FailureKind),
}

/// A single analysis run and everything it owns.
#[derive(Debug)]
pub struct Session {
    policy: SessionPolicy,
    phase: SessionPhase,
    id: Option<String>,
    progress: ProgressTrack,
    result_table: Option<Vec<Record>>,
    summary: Option<String>,
    assets: Vec<FileAsset>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            phase: SessionPhase::Idle,
            id: None,
            progress: ProgressTrack::empty(),
            result_table: None,
            summary: None,
            assets: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn progress(&self) -> &ProgressTrack {
        &self.progress
    }

    pub fn result_table(&self) -> Option<&[Record]> {
        self.result_table.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn assets(&self) -> &[FileAsset] {
        &self.assets
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Failure kind for a `Failed` session, if any.
    pub fn failure(&self) -> Option<FailureKind> {
        match self.phase {
            SessionPhase::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Completed | SessionPhase::Failed(_)
        )
    }

    /// `Idle → Submitting`. Validates the file count before any network
    /// call; rejection leaves the session in `Idle` untouched. Acceptance
    /// clears all prior progress/result/summary/error and takes ownership
    /// of the submitted files.
    pub fn begin_submission(&mut self, files: Vec<FileAsset>) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            return Err(Error::Upload(format!(
                "Session is not idle (phase {:?}); reset before resubmitting",
                self.phase
            )));
        }
        if files.is_empty() {
            return Err(Error::Upload("No files selected".to_string()));
        }
        if files.len() > self.policy.max_upload_files {
            return Err(Error::Upload(format!(
                "Please select a maximum of {} files",
                self.policy.max_upload_files
            )));
        }

        self.clear_run_state();
        self.assets = files;
        self.phase = SessionPhase::Submitting;
        self.started_at = Utc::now();
        info!(file_count = self.assets.len(), "Submission started");
        Ok(())
    }

    /// `Submitting → AwaitingProgress`: bind the server-issued identifier
    /// and seed the deterministic initial progress track. The caller opens
    /// the live channel scoped to this identifier; at most one channel may
    /// be live, so any prior channel must be closed first.
    pub fn confirm_submission(&mut self, session_id: impl Into<String>) {
        debug_assert_eq!(self.phase, SessionPhase::Submitting);
        let session_id = session_id.into();
        info!(session_id = %session_id, "Upload acknowledged, awaiting progress");
        self.id = Some(session_id);
        self.progress = ProgressTrack::initial();
        self.phase = SessionPhase::AwaitingProgress;
    }

    /// `Submitting → Failed(Upload)`: the upload itself was rejected.
    /// No channel is opened.
    pub fn fail_submission(&mut self) {
        warn!("Submission failed before a channel was opened");
        self.phase = SessionPhase::Failed(FailureKind::Upload);
        self.ended_at = Some(Utc::now());
    }

    /// `Idle → Rehydrating`: alternate entry from a URL-carried identifier.
    pub fn begin_rehydration(&mut self, session_id: impl Into<String>) {
        debug_assert_eq!(self.phase, SessionPhase::Idle);
        let session_id = session_id.into();
        info!(session_id = %session_id, "Rehydrating session from shared identifier");
        self.clear_run_state();
        self.id = Some(session_id);
        self.phase = SessionPhase::Rehydrating;
    }

    /// `Rehydrating → Completed` with the refetched run fully populated and
    /// every fixed pipeline stage marked completed.
    pub fn complete_rehydration(
        &mut self,
        table: Vec<Record>,
        summary: String,
        assets: Vec<FileAsset>,
    ) {
        debug_assert_eq!(self.phase, SessionPhase::Rehydrating);
        self.result_table = Some(table);
        self.summary = Some(summary);
        self.assets = assets;
        self.progress = ProgressTrack::all_completed();
        self.phase = SessionPhase::Completed;
        self.ended_at = Some(Utc::now());
    }

    /// `Rehydrating → Failed(Expired)`: rehydration fails as a unit. The
    /// identifier is cleared back to `None` and nothing partial is retained.
    pub fn fail_rehydration(&mut self) {
        warn!(session_id = ?self.id, "Rehydration aborted; clearing session");
        self.clear_run_state();
        self.phase = SessionPhase::Failed(FailureKind::Expired);
        self.ended_at = Some(Utc::now());
    }

    /// Apply one channel message through the single ingestion point.
    ///
    /// `origin_id` is the session identifier the message's channel was
    /// opened for. Returns `true` if the message was applied; stale or
    /// mistargeted messages are dropped.
    pub fn apply(&mut self, origin_id: &str, message: ChannelMessage) -> bool {
        if self.phase != SessionPhase::AwaitingProgress
            || self.id.as_deref() != Some(origin_id)
        {
            debug!(
                origin_id = %origin_id,
                phase = ?self.phase,
                "Dropping channel message for superseded session"
            );
            return false;
        }

        match message {
            ChannelMessage::ProgressUpdate(steps) => {
                debug!(steps = steps.len(), "Progress snapshot applied");
                self.progress.replace(steps);
            }
            ChannelMessage::ResultReady { table, summary } => {
                info!(
                    session_id = %origin_id,
                    rows = table.len(),
                    "Analysis completed"
                );
                self.result_table = Some(table);
                self.summary = summary;
                self.phase = SessionPhase::Completed;
                self.ended_at = Some(Utc::now());
            }
            ChannelMessage::PipelineFailed { summary } => {
                warn!(session_id = %origin_id, "Pipeline reported failure");
                self.result_table = None;
                self.summary = if self.policy.retain_summary_on_failure {
                    summary
                } else {
                    None
                };
                self.phase = SessionPhase::Failed(FailureKind::Pipeline);
                self.ended_at = Some(Utc::now());
            }
            ChannelMessage::TransportError => {
                // Progress keeps its last known values: a transport fault is
                // distinct from a pipeline fault.
                warn!(session_id = %origin_id, "Progress channel transport fault");
                self.phase = SessionPhase::Failed(FailureKind::Channel);
                self.ended_at = Some(Utc::now());
            }
        }
        true
    }

    /// Terminal state `→ Idle`: full state discard, including file assets.
    pub fn reset(&mut self) {
        info!("Session reset");
        *self = Session::new(self.policy);
    }

    fn clear_run_state(&mut self) {
        self.id = None;
        self.progress = ProgressTrack::empty();
        self.result_table = None;
        self.summary = None;
        self.assets = Vec::new();
        self.ended_at = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

/// Drive a session from a live channel until it reaches a terminal state.
///
/// Consumes the stream; dropping it on return closes the underlying channel.
/// If the stream ends while the session is still awaiting progress, that is
/// a transport fault (the server never delivered a terminal event).
pub async fn follow_channel<S>(session: &mut Session, origin_id: &str, stream: S)
where
    S: Stream<Item = ChannelMessage>,
{
    pin_mut!(stream);
    while let Some(message) = stream.next().await {
        session.apply(origin_id, message);
        if session.is_terminal() {
            return;
        }
    }
    if session.phase() == SessionPhase::AwaitingProgress {
        session.apply(origin_id, ChannelMessage::TransportError);
    }
}
