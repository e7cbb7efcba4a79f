use std::path::Path;

use chrono::{DateTime, Local};
use tracing::instrument;

use crate::camera::{CameraDevice, CaptureConstraints, capture_still};
use crate::cancel::CancelToken;
use crate::config::{Settings, store_path};
use crate::credentials::{CredentialResolver, CredentialSource};
use crate::diagnosis::{DiagnosisRequester, DiagnosisResult, GeminiTransport, InferenceTransport};
use crate::diary::{DiaryEntry, DiaryStore};
use crate::errors::{StoreError, TriageError};
use crate::fetch::RemoteImageFetcher;
use crate::imaging::{DEFAULT_JPEG_QUALITY, load_file, strip_data_url};
use crate::preferences::{AppTheme, NotificationPreference};
use crate::storage::Store;

/// Which result screen a diagnosis selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultView {
    Diagnosis,
    Rejection,
}

#[derive(Clone, Debug)]
pub struct TriageOutcome {
    pub diagnosis: DiagnosisResult,
    /// The diary entry created for this diagnosis, if any
    pub entry: Option<DiaryEntry>,
    pub view: ResultView,
}

/// Owns the application state: diary, preferences and the requester.
///
/// Every state-changing operation takes `&mut self`, so at most one
/// triage is in flight per controller.
pub struct TriageController<T = GeminiTransport> {
    store: Store,
    requester: DiagnosisRequester<T>,
    fetcher: RemoteImageFetcher,
    diary: DiaryStore,
    theme: AppTheme,
    notifications: NotificationPreference,
    jpeg_quality: u8,
}

impl TriageController<GeminiTransport> {
    /// Opens the store below `data_dir` and wires up the Gemini backend.
    pub fn open(settings: &Settings, data_dir: &Path) -> Result<Self, TriageError> {
        let store = Store::open(&store_path(data_dir))?;

        let transport = GeminiTransport::new(
            settings.endpoint.as_str(),
            settings.model.as_str(),
            settings.request_timeout(),
        )?;
        let requester = DiagnosisRequester::new(transport, CredentialResolver::new(store.clone()))
            .with_timeout(settings.request_timeout())
            .with_rate_limit(settings.requests_per_minute());
        let fetcher = RemoteImageFetcher::new(settings.fetch_timeout(), settings.jpeg_quality)?;

        Ok(Self::init(store, requester, fetcher)?.with_jpeg_quality(settings.jpeg_quality))
    }
}

impl<T: InferenceTransport> TriageController<T> {
    /// Loads diary, theme and notification preference from `store`.
    #[instrument(name = "controller-init", skip_all)]
    pub fn init(
        store: Store,
        requester: DiagnosisRequester<T>,
        fetcher: RemoteImageFetcher,
    ) -> Result<Self, StoreError> {
        let diary = DiaryStore::load(store.clone())?;
        let theme = AppTheme::load(&store)?;
        let notifications = NotificationPreference::load(&store)?;

        tracing::debug!(entries = diary.len(), %theme, "Application state loaded");

        Ok(Self {
            store,
            requester,
            fetcher,
            diary,
            theme,
            notifications,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        })
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn diary(&self) -> &DiaryStore {
        &self.diary
    }

    pub fn theme(&self) -> AppTheme {
        self.theme
    }

    pub fn notifications(&self) -> NotificationPreference {
        self.notifications
    }

    pub fn requester(&self) -> &DiagnosisRequester<T> {
        &self.requester
    }

    /// Diagnoses a base64 JPEG, comparing it against the latest diary entry.
    /// Plant-positive results are recorded in the diary, always without a
    /// `data:` prefix.
    ///
    /// A result that arrives after `cancel` fired is dropped without
    /// touching the diary.
    #[instrument(name = "triage", skip_all)]
    pub async fn triage(
        &mut self,
        image: &str,
        cancel: &CancelToken,
    ) -> Result<TriageOutcome, TriageError> {
        let image = strip_data_url(image);
        let diagnosis = self
            .requester
            .diagnose(image, self.diary.latest(), cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(TriageError::Cancelled);
        }

        let entry = self.diary.record(image, &diagnosis)?.cloned();
        let view = if diagnosis.is_plant {
            ResultView::Diagnosis
        } else {
            tracing::info!("Subject is not a plant, nothing recorded");
            ResultView::Rejection
        };

        Ok(TriageOutcome {
            diagnosis,
            entry,
            view,
        })
    }

    #[instrument(name = "triage-url", skip(self, cancel))]
    pub async fn triage_url(
        &mut self,
        url: &str,
        cancel: &CancelToken,
    ) -> Result<TriageOutcome, TriageError> {
        let image = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TriageError::Cancelled),
            image = self.fetcher.fetch(url) => image?,
        };
        self.triage(&image, cancel).await
    }

    #[instrument(name = "triage-file", skip(self, cancel), fields(path = %path.display()))]
    pub async fn triage_file(
        &mut self,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<TriageOutcome, TriageError> {
        let image = load_file(path, self.jpeg_quality)?;
        self.triage(&image, cancel).await
    }

    #[instrument(name = "triage-camera", skip_all)]
    pub async fn triage_camera<D: CameraDevice + ?Sized>(
        &mut self,
        device: &mut D,
        cancel: &CancelToken,
    ) -> Result<TriageOutcome, TriageError> {
        let image = capture_still(device, &CaptureConstraints::default()).await?;
        self.triage(&image, cancel).await
    }

    pub fn set_theme(&mut self, theme: AppTheme) -> Result<(), StoreError> {
        theme.save(&self.store)?;
        self.theme = theme;
        Ok(())
    }

    pub fn set_notifications(
        &mut self,
        preference: NotificationPreference,
    ) -> Result<(), StoreError> {
        preference.save(&self.store)?;
        self.notifications = preference;
        Ok(())
    }

    /// Persists a key override. A blank key removes the override.
    pub fn set_api_key(&mut self, key: &str) -> Result<(), StoreError> {
        if key.trim().is_empty() {
            return self.clear_api_key();
        }
        self.requester.credentials().store_override(key)
    }

    pub fn clear_api_key(&mut self) -> Result<(), StoreError> {
        self.requester.credentials().clear_override()
    }

    /// Where a key would currently be taken from, if any.
    pub fn api_key_source(&self) -> Option<CredentialSource> {
        self.requester
            .credentials()
            .resolve()
            .ok()
            .map(|(_, source)| source)
    }

    pub fn next_reminder(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.notifications.next_reminder(self.diary.latest(), now)
    }
}
