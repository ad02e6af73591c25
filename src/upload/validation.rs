use super::types::SelectedFile;
use thiserror::Error;

pub const ACCEPTED_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];
pub const MAX_BYTES: u64 = 8 * 1024 * 1024;

/// Extensions offered by the file picker, matching `ACCEPTED_TYPES`.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please choose a file")]
    Missing,
    #[error("Only PDF, PNG or JPG are allowed")]
    UnsupportedType,
    #[error("File must be 8MB or smaller")]
    TooLarge,
}

/// What the hosting environment can do. Without a way to pick files there is
/// nothing to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub file_selection: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            file_selection: true,
        }
    }
}

impl HostCapabilities {
    pub fn without_file_selection() -> Self {
        Self {
            file_selection: false,
        }
    }
}

/// Every rule the file breaks, in a stable order.
pub fn check_file(file: Option<&SelectedFile>) -> Vec<ValidationError> {
    let Some(file) = file else {
        return vec![ValidationError::Missing];
    };

    let mut errors = Vec::new();
    if !ACCEPTED_TYPES.contains(&file.mime_type.as_str()) {
        errors.push(ValidationError::UnsupportedType);
    }
    if file.size_bytes > MAX_BYTES {
        errors.push(ValidationError::TooLarge);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::FileContents;
    use std::path::PathBuf;

    fn file(mime: &str, size: u64) -> SelectedFile {
        SelectedFile {
            name: "scan".to_string(),
            mime_type: mime.to_string(),
            size_bytes: size,
            contents: FileContents::Disk(PathBuf::from("/nonexistent/scan")),
        }
    }

    #[test]
    fn missing_file() {
        assert_eq!(check_file(None), vec![ValidationError::Missing]);
        assert_eq!(ValidationError::Missing.to_string(), "Please choose a file");
    }

    #[test]
    fn accepted_types_pass() {
        for mime in ACCEPTED_TYPES {
            assert!(check_file(Some(&file(mime, 1024))).is_empty(), "{mime}");
        }
    }

    #[test]
    fn disallowed_types_fail() {
        for mime in ["text/plain", "image/gif", "application/zip", "", "APPLICATION/PDF"] {
            assert_eq!(
                check_file(Some(&file(mime, 10))),
                vec![ValidationError::UnsupportedType],
                "{mime}"
            );
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_file(Some(&file("image/png", MAX_BYTES))).is_empty());
        assert_eq!(
            check_file(Some(&file("image/png", MAX_BYTES + 1))),
            vec![ValidationError::TooLarge]
        );
        assert_eq!(MAX_BYTES, 8_388_608);
    }

    #[test]
    fn all_violations_are_reported() {
        let errors = check_file(Some(&file("video/mp4", 20 * 1024 * 1024)));
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec!["Only PDF, PNG or JPG are allowed", "File must be 8MB or smaller"]
        );
    }
}
