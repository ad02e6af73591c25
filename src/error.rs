use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the document backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status code {}", .status.as_u16())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),
}

impl ApiError {
    /// Message shown to the user: the backend's `message` field when it sent
    /// one, the error text otherwise, "Upload failed" as a last resort.
    pub fn user_message(&self) -> String {
        if let ApiError::Status {
            message: Some(message),
            ..
        } = self
        {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }

        let text = self.to_string();
        if text.trim().is_empty() {
            "Upload failed".to_string()
        } else {
            text
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("UPLOADER_POLL_MAX_MS ({max}) is smaller than UPLOADER_POLL_INITIAL_MS ({initial})")]
    PollBounds { initial: u64, max: u64 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot open {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("window error: {0}")]
    Gui(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_wins() {
        let err = ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: Some("The file field is required.".to_string()),
        };
        assert_eq!(err.user_message(), "The file field is required.");
    }

    #[test]
    fn falls_back_to_error_text() {
        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.user_message(), "Request failed with status code 500");

        let blank = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: Some("   ".to_string()),
        };
        assert_eq!(blank.user_message(), "Request failed with status code 502");
    }

    #[test]
    fn read_errors_are_described() {
        let err = ApiError::Read(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert_eq!(err.user_message(), "Failed to read file: gone");
    }
}
