mod state;
mod ui;

use crate::config::UploaderConfig;
use crate::error::AppError;
use crate::upload::{HostCapabilities, HttpDocumentApi, SelectedFile, SessionState, UploadSession};
use eframe::{egui, App};
pub use state::ToastQueue;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{info, warn};

const BUSY_REPAINT: Duration = Duration::from_millis(100);

pub struct DocUploader {
    runtime: Runtime,
    session: Arc<UploadSession<HttpDocumentApi>>,
    toasts: Arc<ToastQueue>,
    state: SessionState,
    pick_error: Option<String>,
}

impl DocUploader {
    pub fn new(config: &UploaderConfig) -> Result<Self, AppError> {
        info!("Initializing document uploader against {}", config.api_base);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .thread_name("doc-uploader")
            .build()
            .map_err(AppError::Runtime)?;

        let api = HttpDocumentApi::new(&config.api_base, config.request_timeout)?;
        let toasts = Arc::new(ToastQueue::default());
        let session = UploadSession::with_options(
            api,
            toasts.clone(),
            HostCapabilities::default(),
            config.backoff(),
        );

        Ok(Self {
            runtime,
            session: Arc::new(session),
            toasts,
            state: SessionState::default(),
            pick_error: None,
        })
    }

    pub fn choose_file(&mut self, path: &Path) {
        match SelectedFile::from_path(path) {
            Ok(file) => {
                self.pick_error = None;
                self.session.select_file(Some(file));
            }
            Err(err) => {
                warn!("Cannot use {}: {}", path.display(), err);
                self.pick_error = Some(format!("Cannot open {}: {}", path.display(), err));
                self.session.select_file(None);
            }
        }
    }

    pub fn start_upload(&self) {
        let session = self.session.clone();
        self.runtime.spawn(async move { session.upload().await });
    }

    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn reset(&mut self) {
        self.pick_error = None;
        self.session.reset();
    }

    pub fn toggle_status(&self) {
        self.session.toggle_status();
    }

    fn is_busy(&self) -> bool {
        self.state.is_uploading() || self.session.is_polling() || !self.toasts.is_empty()
    }
}

impl App for DocUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state = self.session.snapshot();
        self.render(ctx);
        if self.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}
