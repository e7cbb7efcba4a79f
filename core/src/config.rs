use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::diagnosis::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::errors::ConfigurationError;
use crate::imaging::DEFAULT_JPEG_QUALITY;

pub const APPLICATION_NAME: &str = "Plant Triage";
static SETTINGS_FILE: &str = "config.yml";
static STORE_DIRECTORY: &str = "store";

/// Optional settings file. Every key may be omitted.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Gemini model used for diagnoses
    pub model: String,
    /// Base URL of the Generative Language API
    pub endpoint: String,
    /// Upper bound for one diagnosis request
    pub request_timeout_secs: u64,
    /// Upper bound for downloading a remote image
    pub fetch_timeout_secs: u64,
    pub requests_per_minute: u32,
    pub jpeg_quality: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            fetch_timeout_secs: 30,
            requests_per_minute: 15,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, or from the default location when no
    /// path is given. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigurationError::Unreadable(path, e)),
        }
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigurationError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content)
            .map_err(|e| ConfigurationError::InvalidSettings(path.to_path_buf(), e))
    }

    pub fn default_path() -> Result<PathBuf, ConfigurationError> {
        dirs::config_dir()
            .ok_or(ConfigurationError::UnknownDirectory("config"))
            .map(|p| p.join(APPLICATION_NAME).join(SETTINGS_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn requests_per_minute(&self) -> NonZeroU32 {
        NonZeroU32::new(self.requests_per_minute).unwrap_or(nonzero!(15u32))
    }
}

/// Directory holding the local store.
pub fn default_data_dir() -> Result<PathBuf, ConfigurationError> {
    dirs::data_dir()
        .ok_or(ConfigurationError::UnknownDirectory("data"))
        .map(|p| p.join(APPLICATION_NAME))
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIRECTORY)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: gemini-2.0-flash\nrequest_timeout_secs: 20").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.model, "gemini-2.0-flash");
        assert_eq!(settings.request_timeout(), Duration::from_secs(20));
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.jpeg_quality, 90);
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(Settings::load(Some(file.path())).unwrap(), Settings::default());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(matches!(
            Settings::load(Some(Path::new("/nonexistent/config.yml"))),
            Err(ConfigurationError::Unreadable(_, _))
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs: [not, a, number]").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(ConfigurationError::InvalidSettings(_, _))
        ));
    }

    #[test]
    fn test_zero_rate_falls_back() {
        let settings = Settings {
            requests_per_minute: 0,
            ..Default::default()
        };
        assert_eq!(settings.requests_per_minute().get(), 15);
    }
}
