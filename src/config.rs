use crate::error::ConfigError;
use crate::upload::Backoff;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub poll_initial: Duration,
    pub poll_max: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            poll_initial: Duration::from_millis(1000),
            poll_max: Duration::from_millis(5000),
        }
    }
}

impl UploaderConfig {
    /// Reads `UPLOADER_*` variables, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base = match lookup("UPLOADER_API_BASE") {
            Some(value) => non_empty("UPLOADER_API_BASE", &value)?,
            None => defaults.api_base,
        };
        let request_timeout = number(&lookup, "UPLOADER_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let poll_initial = number(&lookup, "UPLOADER_POLL_INITIAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_initial);
        let poll_max = number(&lookup, "UPLOADER_POLL_MAX_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_max);

        if poll_max < poll_initial {
            return Err(ConfigError::PollBounds {
                initial: poll_initial.as_millis() as u64,
                max: poll_max.as_millis() as u64,
            });
        }

        Ok(Self {
            api_base,
            request_timeout,
            poll_initial,
            poll_max,
        })
    }

    pub fn with_api_base(mut self, api_base: Option<String>) -> Result<Self, ConfigError> {
        if let Some(api_base) = api_base {
            self.api_base = non_empty("--api-base", &api_base)?;
        }
        Ok(self)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.poll_initial, self.poll_max)
    }
}

fn non_empty(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { key });
    }
    Ok(trimmed.to_string())
}

fn number(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<UploaderConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        UploaderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(config(&[]).unwrap(), UploaderConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("UPLOADER_API_BASE", "https://docs.example.com/api/"),
            ("UPLOADER_REQUEST_TIMEOUT_SECS", "5"),
            ("UPLOADER_POLL_INITIAL_MS", "250"),
            ("UPLOADER_POLL_MAX_MS", "2000"),
        ])
        .unwrap();

        assert_eq!(cfg.api_base, "https://docs.example.com/api");
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));

        let mut backoff = cfg.backoff();
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = config(&[("UPLOADER_POLL_INITIAL_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "UPLOADER_POLL_INITIAL_MS", .. }));

        let zero = config(&[("UPLOADER_REQUEST_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(zero, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn rejects_inverted_poll_bounds() {
        let err = config(&[("UPLOADER_POLL_INITIAL_MS", "6000")]).unwrap_err();
        assert!(matches!(err, ConfigError::PollBounds { initial: 6000, max: 5000 }));
    }

    #[test]
    fn cli_override_wins() {
        let cfg = UploaderConfig::default()
            .with_api_base(Some("http://localhost:9000/api/".to_string()))
            .unwrap();
        assert_eq!(cfg.api_base, "http://localhost:9000/api");

        assert!(UploaderConfig::default().with_api_base(Some("  ".to_string())).is_err());
        assert_eq!(
            UploaderConfig::default().with_api_base(None).unwrap().api_base,
            DEFAULT_API_BASE
        );
    }
}
