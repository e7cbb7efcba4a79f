use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("No Gemini API key configured. Set GEMINI_API_KEY or store a key in the settings")]
    MissingApiKey,
    #[error("Settings file `{}` could not be read", .0.display())]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("Settings file `{}` is not valid YAML", .0.display())]
    InvalidSettings(PathBuf, #[source] serde_yml::Error),
    #[error("Path to user's {0} directory could not be detected")]
    UnknownDirectory(&'static str),
    #[error("Error building the HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Reasons a decoded inference response is rejected.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Response does not match the diagnosis schema: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Field `{0}` is not a finite number")]
    NonFinite(&'static str),
    #[error("Health score {0} is outside of 0-100")]
    HealthScoreOutOfRange(f64),
    #[error("Expected {expected} metrics, got {actual}")]
    MetricCount { expected: usize, actual: usize },
    #[error("Metric `{0}` has a non-positive maximum")]
    MetricMaximum(String),
    #[error("Expected {expected} growth projection points, got {actual}")]
    GrowthPointCount { expected: usize, actual: usize },
    #[error("Growth projection day {0} is outside of day 1-30")]
    GrowthDayOutOfRange(f64),
    #[error("Growth projection days are not in chronological order")]
    GrowthNotChronological,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image payload is empty")]
    EmptyImage,
    #[error("Image payload is not valid base64: {0}")]
    InvalidImage(#[from] base64::DecodeError),
    #[error("Error talking to the inference service: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Inference service answered with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Inference request did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Inference service blocked the request: {0}")]
    Blocked(String),
    #[error("Inference service returned no candidates")]
    EmptyResponse,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("`{0}` is not a valid http(s) URL")]
    InvalidUrl(String),
    #[error("Error downloading image: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Remote server answered with status {0}")]
    Status(u16),
    #[error("Downloaded content is not a supported image: {0}")]
    NotAnImage(#[source] image::ImageError),
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera access was denied")]
    PermissionDenied,
    #[error("No camera hardware was found")]
    NotFound,
    #[error("Camera is in use by another application")]
    InUse,
    #[error("Camera does not satisfy the capture constraints")]
    Overconstrained,
    #[error("Camera failure: {0}")]
    Unknown(String),
    #[error("Error encoding captured frame: {0}")]
    Encoding(#[source] image::ImageError),
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image file `{}` could not be read", .0.display())]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("Unsupported or corrupt image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Error accessing the local store: {0}")]
    Sled(#[from] sled::Error),
    #[error("Stored value under `{0}` is not valid UTF-8")]
    NotText(&'static str),
    #[error("Stored value under `{0}` is corrupt")]
    Corrupt(&'static str, #[source] serde_json::Error),
    #[error("Error serializing value for `{0}`")]
    Serialize(&'static str, #[source] serde_json::Error),
}

/// What the caller should offer the user after a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    OpenSettings,
    Retry,
    RetryOrChooseSource,
    RetryOrUpload,
}

#[derive(Error, Debug)]
pub enum TriageError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Operation was cancelled")]
    Cancelled,
}

impl From<SchemaError> for TriageError {
    fn from(e: SchemaError) -> Self {
        TriageError::Analysis(AnalysisError::Schema(e))
    }
}

impl TriageError {
    pub fn recovery(&self) -> Recovery {
        match self {
            TriageError::Configuration(_) => Recovery::OpenSettings,
            TriageError::Fetch(_) | TriageError::Image(_) => Recovery::RetryOrChooseSource,
            TriageError::Camera(_) => Recovery::RetryOrUpload,
            TriageError::Analysis(_) | TriageError::Store(_) | TriageError::Cancelled => {
                Recovery::Retry
            }
        }
    }

    /// Message suitable for showing to the user, as opposed to the
    /// `Display` output which is meant for logs.
    pub fn user_message(&self) -> String {
        match self {
            TriageError::Configuration(ConfigurationError::MissingApiKey) => {
                "API key not configured. Please add your Gemini API key in Settings.".to_string()
            }
            TriageError::Configuration(e) => e.to_string(),
            TriageError::Analysis(_) => "Analysis failed. Telemetry sync lost.".to_string(),
            TriageError::Fetch(_) => {
                "Failed to fetch image from URL. Ensure the URL is public and reachable."
                    .to_string()
            }
            TriageError::Camera(e) => e.user_message().to_string(),
            TriageError::Image(_) => "The selected file is not a readable image.".to_string(),
            TriageError::Store(_) => "The local diary could not be saved.".to_string(),
            TriageError::Cancelled => "Analysis cancelled.".to_string(),
        }
    }
}

impl CameraError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => {
                "Camera access denied. Please check your settings and enable camera permissions for Plant Triage."
            }
            CameraError::NotFound => "No camera hardware was detected on this device.",
            CameraError::InUse => "The camera is already in use by another application or tab.",
            CameraError::Overconstrained => {
                "The camera does not meet the required specifications for scanning."
            }
            CameraError::Unknown(_) | CameraError::Encoding(_) => {
                "An unexpected error occurred while accessing the camera."
            }
        }
    }
}
