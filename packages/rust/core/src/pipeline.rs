//! Pipeline orchestrator: the per-session state machine that drives
//! validate → publish → analyze → normalize for one image at a time.
//!
//! Only one session is current. Starting a new selection or clearing
//! replaces it, and any stage result that arrives for a replaced session is
//! discarded instead of being committed (it surfaces as
//! [`SkinScanError::Superseded`] to whoever awaited it).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use skinscan_analyzer::{AnalysisRequest, Analyzer, normalize};
use skinscan_shared::{AnalysisResult, FailedStage, Result, SessionId, SkinScanError, SourceFile};

use crate::publisher::BlobPublisher;
use crate::validator;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Where the current session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Validating,
    Uploading,
    Uploaded,
    Analyzing,
    Complete,
    Failed(FailedStage),
}

impl Stage {
    /// Successor on the success path. Terminal stages have none.
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::Validating => Some(Self::Uploading),
            Self::Uploading => Some(Self::Uploaded),
            Self::Uploaded => Some(Self::Analyzing),
            Self::Analyzing => Some(Self::Complete),
            Self::Idle | Self::Complete | Self::Failed(_) => None,
        }
    }

    /// Work is still in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::Uploading | Self::Uploaded | Self::Analyzing
        )
    }

    /// Progress indicator value.
    pub fn progress_percent(self) -> u8 {
        match self {
            Self::Idle | Self::Failed(_) => 0,
            Self::Validating => 10,
            Self::Uploading => 35,
            Self::Uploaded => 60,
            Self::Analyzing => 80,
            Self::Complete => 100,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Uploading => f.write_str("uploading"),
            Self::Uploaded => f.write_str("uploaded"),
            Self::Analyzing => f.write_str("analyzing"),
            Self::Complete => f.write_str("complete"),
            Self::Failed(stage) => write!(f, "failed ({stage})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One upload/analysis attempt. The source bytes are not kept here: they
/// travel with the running attempt and are handed to the publisher.
#[derive(Debug, Clone)]
struct UploadSession {
    id: SessionId,
    file_name: String,
    stage: Stage,
    remote_address: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct PipelineState {
    session: Option<UploadSession>,
    result: Option<AnalysisResult>,
    drag_hover: bool,
}

/// Snapshot of everything a presentation layer renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: Option<SessionId>,
    pub file_name: Option<String>,
    pub stage: Stage,
    pub progress_percent: u8,
    pub drag_hover: bool,
    /// Public address of the uploaded image, used as the preview source.
    pub remote_address: Option<String>,
    /// User-facing message for a failed session.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting session status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every stage change of the current session.
    fn stage(&self, session: SessionId, stage: Stage);
    /// Called once the image is publicly reachable.
    fn published(&self, session: SessionId, remote_address: &str);
    /// Called when the current session fails.
    fn failed(&self, session: SessionId, error: &SkinScanError);
    /// Called when the current session completes.
    fn done(&self, session: SessionId, result: &AnalysisResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _session: SessionId, _stage: Stage) {}
    fn published(&self, _session: SessionId, _remote_address: &str) {}
    fn failed(&self, _session: SessionId, _error: &SkinScanError) {}
    fn done(&self, _session: SessionId, _result: &AnalysisResult) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Cheap-to-clone handle driving the current session.
#[derive(Clone)]
pub struct Orchestrator {
    publisher: Arc<BlobPublisher>,
    analyzer: Arc<dyn Analyzer>,
    progress: Arc<dyn ProgressReporter>,
    state: Arc<Mutex<PipelineState>>,
}

impl Orchestrator {
    pub fn new(publisher: BlobPublisher, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            publisher: Arc::new(publisher),
            analyzer,
            progress: Arc::new(SilentProgress),
            state: Arc::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Run a full attempt for `file`, replacing whatever session was current.
    ///
    /// Returns the committed result, the stage error that ended the attempt,
    /// or [`SkinScanError::Superseded`] if the session was replaced or
    /// cleared while this attempt was in flight.
    #[instrument(skip_all, fields(file = %file.name, media_type = %file.media_type))]
    pub async fn select_file(&self, file: SourceFile) -> Result<AnalysisResult> {
        let id = self.begin(&file);

        if let Err(e) = validator::validate(&file) {
            return Err(self.fail(id, e.into()));
        }
        self.advance(id, |_, _| {})?;

        let stored = match self.publisher.publish(file).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(id, e.into())),
        };
        let address = stored.public_address.clone();
        self.advance(id, |session, _| session.remote_address = Some(address))?;
        self.progress.published(id, &stored.public_address);

        // Uploaded always continues straight into analysis.
        self.advance(id, |_, _| {})?;

        let request = AnalysisRequest::for_object(&stored);
        let outcome = match self.analyzer.analyze(&request).await {
            Ok(payload) => normalize(payload).map_err(SkinScanError::from),
            Err(e) => Err(e.into()),
        };
        let result = match outcome {
            Ok(result) => result,
            Err(e) => return Err(self.fail(id, e)),
        };

        let committed = result.clone();
        self.advance(id, move |_, slot| *slot = Some(committed))?;

        info!(
            session = %id,
            issues = result.issues.len(),
            severity = %result.severity_overall,
            "analysis complete"
        );
        self.progress.done(id, &result);
        Ok(result)
    }

    /// A file dropped onto the drop target: same as a selection.
    pub async fn drop_file(&self, file: SourceFile) -> Result<AnalysisResult> {
        self.lock().drag_hover = false;
        self.select_file(file).await
    }

    pub fn drag_enter(&self) {
        self.lock().drag_hover = true;
    }

    pub fn drag_leave(&self) {
        self.lock().drag_hover = false;
    }

    /// Drop the current session and its result. Anything still in flight
    /// for it will be discarded when it returns.
    pub fn clear(&self) {
        let cleared = {
            let mut state = self.lock();
            state.result = None;
            state.drag_hover = false;
            state.session.take()
        };

        if let Some(session) = cleared {
            info!(session = %session.id, stage = %session.stage, "session cleared");
            self.progress.stage(session.id, Stage::Idle);
        }
    }

    pub fn view(&self) -> SessionView {
        let state = self.lock();
        let stage = state
            .session
            .as_ref()
            .map_or(Stage::Idle, |session| session.stage);

        SessionView {
            session_id: state.session.as_ref().map(|s| s.id),
            file_name: state.session.as_ref().map(|s| s.file_name.clone()),
            stage,
            progress_percent: stage.progress_percent(),
            drag_hover: state.drag_hover,
            remote_address: state.session.as_ref().and_then(|s| s.remote_address.clone()),
            error: state.session.as_ref().and_then(|s| s.error.clone()),
        }
    }

    /// The committed result of the current session, if it completed.
    pub fn current_result(&self) -> Option<AnalysisResult> {
        self.lock().result.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, file: &SourceFile) -> SessionId {
        let id = SessionId::new();
        let replaced = {
            let mut state = self.lock();
            state.result = None;
            state.session.replace(UploadSession {
                id,
                file_name: file.name.clone(),
                stage: Stage::Validating,
                remote_address: None,
                error: None,
            })
        };

        if let Some(old) = replaced.filter(|s| s.stage.is_busy()) {
            info!(superseded = %old.id, stage = %old.stage, "in-flight session superseded");
        }
        info!(session = %id, "session started");
        self.progress.stage(id, Stage::Validating);
        id
    }

    /// Move session `id` to its next stage and apply `update`, but only if
    /// it is still the current session.
    fn advance(
        &self,
        id: SessionId,
        update: impl FnOnce(&mut UploadSession, &mut Option<AnalysisResult>),
    ) -> Result<Stage> {
        let stage = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let Some(session) = state.session.as_mut().filter(|s| s.id == id) else {
                warn!(session = %id, "discarding stage result for stale session");
                return Err(SkinScanError::Superseded);
            };
            let Some(next) = session.stage.next() else {
                debug!(session = %id, stage = %session.stage, "session already settled");
                return Err(SkinScanError::Superseded);
            };
            session.stage = next;
            update(session, &mut state.result);
            next
        };

        debug!(session = %id, %stage, "stage advanced");
        self.progress.stage(id, stage);
        Ok(stage)
    }

    /// Record `error` against session `id` if it is still current.
    fn fail(&self, id: SessionId, error: SkinScanError) -> SkinScanError {
        let Some(failed) = error.failed_stage() else {
            return error;
        };

        {
            let mut state = self.lock();
            let Some(session) = state.session.as_mut().filter(|s| s.id == id) else {
                warn!(session = %id, error = %error, "discarding failure for stale session");
                return SkinScanError::Superseded;
            };
            session.stage = Stage::Failed(failed);
            session.error = Some(error.user_message());
        }

        warn!(session = %id, stage = %failed, error = %error, "attempt failed");
        self.progress.stage(id, Stage::Failed(failed));
        self.progress.failed(id, &error);
        error
    }
}
