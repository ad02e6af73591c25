use super::types::{DocumentId, SelectedFile, StatusReport, UploadReceipt};
use crate::error::ApiError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

/// Called with `(bytes_sent, total_bytes)` as the upload body is handed to
/// the transport. `total_bytes` is `None` when the length is unknown.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// The two backend calls an upload session needs.
#[async_trait]
pub trait DocumentApi: Send + Sync + 'static {
    async fn upload(&self, file: &SelectedFile, progress: ProgressFn) -> Result<UploadReceipt, ApiError>;

    async fn status(&self, id: &DocumentId) -> Result<StatusReport, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    client: Client,
    base_url: String,
}

impl HttpDocumentApi {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        Err(ApiError::Status { status, message })
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn upload(&self, file: &SelectedFile, progress: ProgressFn) -> Result<UploadReceipt, ApiError> {
        let bytes = file.contents.read().await?;
        let total = bytes.len() as u64;

        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            bytes.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                sent += chunk.len() as u64;
                progress(sent, Some(total));
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        debug!("POST {} ({} bytes)", url, total);
        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<UploadReceipt>().await?)
    }

    async fn status(&self, id: &DocumentId) -> Result<StatusReport, ApiError> {
        let url = format!("{}/status/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<StatusReport>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::ProcessingStatus;
    use mockito::Matcher;
    use std::sync::Mutex;

    fn api(server: &mockito::ServerGuard) -> HttpDocumentApi {
        HttpDocumentApi::new(&format!("{}/api/", server.url()), Duration::from_secs(5)).unwrap()
    }

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<(u64, Option<u64>)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |sent, total| sink.lock().unwrap().push((sent, total)));
        (progress, seen)
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpDocumentApi::with_client(Client::new(), "http://localhost:8000/api//");
        assert_eq!(api.base_url(), "http://localhost:8000/api");
    }

    #[tokio::test]
    async fn upload_sends_multipart_and_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::Regex(r#"name="file"; filename="report.pdf""#.to_string()))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42}"#)
            .create_async()
            .await;

        let file = SelectedFile::from_bytes("report.pdf", "application/pdf", vec![7u8; 150 * 1024]);
        let (progress, seen) = recorder();

        let receipt = api(&server).upload(&file, progress).await.unwrap();
        assert_eq!(receipt.id, DocumentId::from(42));
        mock.assert_async().await;

        let seen = seen.lock().unwrap();
        let total = 150 * 1024;
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&(total, Some(total))));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn upload_error_carries_backend_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "The file must be a file of type: pdf."}"#)
            .create_async()
            .await;

        let file = SelectedFile::from_bytes("a.png", "image/png", vec![1, 2, 3]);
        let (progress, _) = recorder();
        let err = api(&server).upload(&file, progress).await.unwrap_err();

        assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 422));
        assert_eq!(err.user_message(), "The file must be a file of type: pdf.");
    }

    #[tokio::test]
    async fn upload_error_without_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_status(500)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let file = SelectedFile::from_bytes("a.png", "image/png", vec![1]);
        let (progress, _) = recorder();
        let err = api(&server).upload(&file, progress).await.unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status code 500");
    }

    #[tokio::test]
    async fn status_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status/doc-9")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "done", "summary": {"pages": 3}}"#)
            .create_async()
            .await;

        let report = api(&server).status(&DocumentId::new("doc-9")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(report.status, ProcessingStatus::Done);
        assert_eq!(report.summary, Some(serde_json::json!({"pages": 3})));
    }

    #[tokio::test]
    async fn status_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/status/1")
            .with_status(404)
            .create_async()
            .await;

        let err = api(&server).status(&DocumentId::from(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { message: None, .. }));
    }

    #[tokio::test]
    async fn unreadable_file_fails_before_sending() {
        let file = SelectedFile {
            name: "gone.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 10,
            contents: crate::upload::types::FileContents::Disk("/definitely/not/here.pdf".into()),
        };
        let api = HttpDocumentApi::with_client(Client::new(), "http://127.0.0.1:9");
        let (progress, seen) = recorder();
        let err = api.upload(&file, progress).await.unwrap_err();
        assert!(matches!(err, ApiError::Read(_)));
        assert!(seen.lock().unwrap().is_empty());
    }
}
