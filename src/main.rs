mod app;
mod config;
mod error;
mod headless;
mod upload;
mod utils;

use app::DocUploader;
use clap::Parser;
use config::UploaderConfig;
use eframe::CreationContext;
use error::AppError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload a document for summarization and follow its processing.
#[derive(Debug, Parser)]
#[command(name = "doc_uploader", version)]
struct Args {
    /// Backend base URL, e.g. http://127.0.0.1:8000/api (overrides UPLOADER_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Upload this file from the terminal instead of opening a window
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, AppError> {
    let config = UploaderConfig::from_env()?.with_api_base(args.api_base)?;

    if let Some(path) = args.file {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        return runtime.block_on(headless::run(&config, &path));
    }

    let uploader = DocUploader::new(&config)?;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([560.0, 640.0])
            .with_min_inner_size([400.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Document Summarizer",
        options,
        Box::new(move |_cc: &CreationContext| Box::new(uploader)),
    )
    .map_err(|err| AppError::Gui(err.to_string()))?;

    Ok(ExitCode::SUCCESS)
}
