use crate::config::UploaderConfig;
use crate::error::AppError;
use crate::upload::{
    DocumentApi, HostCapabilities, HttpDocumentApi, LogNotifier, Phase, SelectedFile, UploadSession,
};
use crate::utils::format_size;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Rejected,
    Interrupted,
    Settled,
}

/// Uploads one file without a window and waits for the backend to finish.
pub async fn run(config: &UploaderConfig, path: &Path) -> Result<ExitCode, AppError> {
    let file = SelectedFile::from_path(path).map_err(|source| AppError::File {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        "Selected {} ({}, {})",
        file.name,
        file.mime_type,
        format_size(file.size_bytes)
    );

    let api = HttpDocumentApi::new(&config.api_base, config.request_timeout)?;
    info!("Using backend at {}", api.base_url());

    let session = UploadSession::with_options(
        api,
        Arc::new(LogNotifier),
        HostCapabilities::default(),
        config.backoff(),
    );
    session.select_file(Some(file));

    let interrupted = CancellationToken::new();
    let watcher = tokio::spawn({
        let interrupted = interrupted.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupted.cancel();
            }
        }
    });
    let outcome = drive(&session, &interrupted).await;
    watcher.abort();

    match outcome {
        Outcome::Rejected => {
            for message in &session.snapshot().validation_errors {
                eprintln!("{}", message);
            }
            return Ok(ExitCode::FAILURE);
        }
        Outcome::Interrupted => return Ok(ExitCode::FAILURE),
        Outcome::Settled => {}
    }

    let state = session.snapshot();
    match state.phase {
        Phase::Done => {
            let summary = state.summary.unwrap_or(serde_json::Value::Null);
            match serde_json::to_string_pretty(&summary) {
                Ok(text) => println!("{}", text),
                Err(err) => warn!("Could not print summary: {}", err),
            }
            Ok(ExitCode::SUCCESS)
        }
        phase => {
            if let Some(error) = &state.error_message {
                eprintln!("{}", error);
            }
            info!(
                "Finished in phase {} (document {})",
                phase.label(),
                state
                    .document_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Uploads the selected file and waits for polling to finish. `interrupted`
/// is watched during both the upload request and processing.
async fn drive<A: DocumentApi>(session: &UploadSession<A>, interrupted: &CancellationToken) -> Outcome {
    tokio::select! {
        biased;
        _ = interrupted.cancelled() => {
            warn!("Interrupted during upload, abandoning the request");
            session.cancel();
            return Outcome::Interrupted;
        }
        _ = session.upload() => {}
    }

    if !session.snapshot().validation_errors.is_empty() {
        return Outcome::Rejected;
    }

    let settled = session.settle();
    tokio::pin!(settled);
    tokio::select! {
        _ = &mut settled => {}
        _ = interrupted.cancelled() => {
            warn!("Interrupted, no longer waiting for processing");
            session.cancel();
            settled.await;
        }
    }
    Outcome::Settled
}
