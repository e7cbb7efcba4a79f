//! Plant diagnosis client: sends plant photos to a Gemini model, validates
//! the structured answer and keeps a local diary of accepted diagnoses.

pub mod camera;
pub mod cancel;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod diagnosis;
pub mod diary;
pub mod errors;
pub mod fetch;
pub mod imaging;
pub mod preferences;
pub mod storage;

pub use cancel::CancelToken;
pub use config::Settings;
pub use controller::{ResultView, TriageController, TriageOutcome};
pub use diagnosis::{DiagnosisRequester, DiagnosisResult, HealthBand};
pub use diary::{DiaryEntry, DiaryStore};
pub use errors::{Recovery, TriageError};
pub use preferences::{AppTheme, NotificationPreference};
