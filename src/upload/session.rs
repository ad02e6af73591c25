//! Lifecycle of a single upload: select, validate, upload, then poll the
//! backend until the document is processed.

use super::api::{DocumentApi, ProgressFn};
use super::backoff::Backoff;
use super::notify::{Notification, Notifier};
use super::types::{DocumentId, Phase, SelectedFile, StatusReport};
use super::validation::{check_file, HostCapabilities};
use derivative::Derivative;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a host needs to render the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub selected_file: Option<SelectedFile>,
    pub phase: Phase,
    pub progress_percent: u8,
    pub document_id: Option<DocumentId>,
    pub summary: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub validation_errors: Vec<String>,
    pub cancelled: bool,
    pub just_uploaded: bool,
    pub show_status: bool,
    /// Raw status string from the last successful poll.
    pub backend_status: Option<String>,
    generation: u64,
}

impl SessionState {
    pub fn is_uploading(&self) -> bool {
        self.phase == Phase::Uploading
    }
}

/// `round(sent * 100 / total)`, or `None` when the total is unknown.
pub fn progress_percent(sent: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)?;
    let percent = (sent.min(total) as f64 * 100.0 / total as f64).round();
    Some(percent as u8)
}

/// Lock order: `state` before `poller`. `cancel` and `reset` cancel the
/// token while holding `state`, so a poll holding `state` sees a consistent
/// token.
struct Poller {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct UploadSession<A: DocumentApi> {
    #[derivative(Debug = "ignore")]
    api: Arc<A>,
    #[derivative(Debug = "ignore")]
    notifier: Arc<dyn Notifier>,
    capabilities: HostCapabilities,
    backoff: Backoff,
    state: Arc<Mutex<SessionState>>,
    #[derivative(Debug = "ignore")]
    poller: Mutex<Option<Poller>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A: DocumentApi> UploadSession<A> {
    pub fn new(api: A, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_options(api, notifier, HostCapabilities::default(), Backoff::default())
    }

    pub fn with_options(
        api: A,
        notifier: Arc<dyn Notifier>,
        capabilities: HostCapabilities,
        backoff: Backoff,
    ) -> Self {
        Self {
            api: Arc::new(api),
            notifier,
            capabilities,
            backoff,
            state: Arc::new(Mutex::new(SessionState::default())),
            poller: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn select_file(&self, file: Option<SelectedFile>) {
        let mut state = lock(&self.state);
        if let Some(file) = &file {
            debug!("Selected {} ({}, {} bytes)", file.name, file.mime_type, file.size_bytes);
        }
        state.selected_file = file;
        state.validation_errors.clear();
        state.error_message = None;
        state.progress_percent = 0;
    }

    /// Checks the selected file and records every problem found.
    pub fn validate(&self) -> bool {
        if !self.capabilities.file_selection {
            return true;
        }

        let mut state = lock(&self.state);
        let errors = check_file(state.selected_file.as_ref());
        state.validation_errors = errors.iter().map(ToString::to_string).collect();
        errors.is_empty()
    }

    pub async fn upload(&self) {
        if !self.validate() {
            return;
        }

        let (file, generation) = {
            let mut state = lock(&self.state);
            let Some(file) = state.selected_file.clone() else {
                return;
            };
            if state.phase == Phase::Uploading {
                warn!("Upload of {} already in progress, ignoring", file.name);
                return;
            }

            state.generation += 1;
            state.phase = Phase::Uploading;
            state.progress_percent = 0;
            state.error_message = None;
            state.cancelled = false;
            state.just_uploaded = false;
            state.show_status = false;
            state.document_id = None;
            state.summary = None;
            state.backend_status = None;
            self.stop_polling();
            (file, state.generation)
        };

        info!("Uploading {} ({} bytes)", file.name, file.size_bytes);
        let progress_state = self.state.clone();
        let progress: ProgressFn = Arc::new(move |sent, total| {
            let Some(percent) = progress_percent(sent, total) else {
                return;
            };
            let mut state = lock(&progress_state);
            if state.generation == generation && state.phase == Phase::Uploading {
                state.progress_percent = percent;
            }
        });

        let result = self.api.upload(&file, progress).await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!("Discarding upload result for {}: session was reset", file.name);
            return;
        }

        match result {
            Ok(receipt) => {
                info!("Uploaded {} as document {}", file.name, receipt.id);
                state.document_id = Some(receipt.id.clone());
                state.phase = Phase::Processing;
                state.just_uploaded = true;
                if state.cancelled {
                    debug!("Not polling document {}: cancelled during upload", receipt.id);
                } else {
                    self.start_polling(receipt.id, generation);
                }
                drop(state);

                self.notifier.add(Notification::upload_finished());
            }
            Err(err) => {
                let message = err.user_message();
                warn!("Upload of {} failed: {}", file.name, err);
                state.error_message = Some(message.clone());
                state.phase = Phase::Failed;
                drop(state);

                self.notifier.add(Notification::upload_failed(&message));
            }
        }
    }

    /// Must be called with the state lock held.
    fn start_polling(&self, id: DocumentId, generation: u64) {
        let token = CancellationToken::new();
        let task = PollTask {
            api: self.api.clone(),
            notifier: self.notifier.clone(),
            state: self.state.clone(),
            token: token.clone(),
            backoff: self.backoff,
            id,
            generation,
        };

        let mut poller = lock(&self.poller);
        if let Some(previous) = poller.take() {
            previous.token.cancel();
        }
        *poller = Some(Poller {
            token,
            task: Some(tokio::spawn(task.run())),
        });
    }

    fn stop_polling(&self) {
        if let Some(poller) = lock(&self.poller).as_ref() {
            poller.token.cancel();
        }
    }

    /// Stops polling. The last known state stays visible.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.cancelled = true;
        self.stop_polling();
        debug!("Polling cancelled");
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        if let Some(poller) = lock(&self.poller).take() {
            poller.token.cancel();
        }
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
    }

    pub fn toggle_status(&self) {
        let mut state = lock(&self.state);
        state.show_status = !state.show_status;
    }

    /// Resolves once the current polling loop, if any, has stopped.
    pub async fn settle(&self) {
        let task = lock(&self.poller).as_mut().and_then(|p| p.task.take());
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("Polling task ended abnormally: {}", err);
            }
        }
    }

    /// True while a polling loop is alive and not cancelled.
    pub fn is_polling(&self) -> bool {
        lock(&self.poller).as_ref().map_or(false, |p| {
            !p.token.is_cancelled() && p.task.as_ref().map_or(true, |t| !t.is_finished())
        })
    }
}

impl<A: DocumentApi> Drop for UploadSession<A> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

enum Tick {
    Pending,
    Terminal,
    Stopped,
}

struct PollTask<A: DocumentApi> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<SessionState>>,
    token: CancellationToken,
    backoff: Backoff,
    id: DocumentId,
    generation: u64,
}

impl<A: DocumentApi> PollTask<A> {
    async fn run(mut self) {
        loop {
            if self.token.is_cancelled() {
                return;
            }

            match self.api.status(&self.id).await {
                Ok(report) => match self.apply(report) {
                    Tick::Pending => {}
                    Tick::Terminal => {
                        self.token.cancel();
                        return;
                    }
                    Tick::Stopped => return,
                },
                Err(err) => debug!("Status check for document {} failed, retrying: {}", self.id, err),
            }

            let delay = self.backoff.next_delay();
            debug!("Next status check for document {} in {:?}", self.id, delay);
            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn apply(&self, report: StatusReport) -> Tick {
        let mut state = lock(&self.state);
        if self.token.is_cancelled() || state.generation != self.generation {
            debug!("Discarding status of document {}: polling stopped", self.id);
            return Tick::Stopped;
        }

        state.phase = report.status.phase();
        state.backend_status = Some(report.status.as_str().to_string());
        if let Some(summary) = report.summary {
            if !summary.is_null() {
                state.summary = Some(summary);
            }
        }
        let show_status = state.show_status;
        drop(state);

        if !report.status.is_terminal() {
            return Tick::Pending;
        }
        if report.status.phase() == Phase::Done {
            info!("Document {} processed", self.id);
            if !show_status {
                self.notifier.add(Notification::summary_ready());
            }
        } else {
            warn!("Processing of document {} failed", self.id);
            self.notifier.add(Notification::processing_failed());
        }
        Tick::Terminal
    }
}
