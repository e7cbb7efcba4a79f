use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use tracing::instrument;

use super::api::build_request;
use super::transport::InferenceTransport;
use super::types::DiagnosisResult;
use crate::cancel::CancelToken;
use crate::credentials::CredentialResolver;
use crate::diary::DiaryEntry;
use crate::errors::{AnalysisError, TriageError};
use crate::imaging::{decode_base64, strip_data_url};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends images to the inference backend and turns the answer into a
/// validated [`DiagnosisResult`]. Stateless apart from the rate limiter.
pub struct DiagnosisRequester<T> {
    transport: T,
    credentials: CredentialResolver,
    timeout: Duration,
    limiter: DefaultDirectRateLimiter,
}

/// Strips an optional `data:image/...;base64,` prefix and checks the rest
/// decodes.
fn validate_image(image: &str) -> Result<&str, AnalysisError> {
    let image = strip_data_url(image);
    if image.is_empty() {
        return Err(AnalysisError::EmptyImage);
    }
    decode_base64(image)?;
    Ok(image)
}

impl<T: InferenceTransport> DiagnosisRequester<T> {
    pub fn new(transport: T, credentials: CredentialResolver) -> Self {
        Self {
            transport,
            credentials,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            limiter: RateLimiter::direct(Quota::per_minute(nonzero!(15u32))),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: NonZeroU32) -> Self {
        self.limiter = RateLimiter::direct(Quota::per_minute(per_minute));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Diagnoses `image`, comparing it against `prior` when given.
    ///
    /// The credential is resolved before anything is sent, so a missing key
    /// never reaches the backend. Cancelling `cancel` abandons the request
    /// and yields [`TriageError::Cancelled`].
    #[instrument(name = "diagnose", skip_all, fields(comparison = prior.is_some()))]
    pub async fn diagnose(
        &self,
        image: &str,
        prior: Option<&DiaryEntry>,
        cancel: &CancelToken,
    ) -> Result<DiagnosisResult, TriageError> {
        if cancel.is_cancelled() {
            return Err(TriageError::Cancelled);
        }

        let (api_key, source) = self.credentials.resolve()?;
        tracing::debug!(?source, "Resolved API key");

        let image = validate_image(image)?;
        let request = build_request(image, prior);

        let call = async {
            self.limiter
                .until_ready_with_jitter(Jitter::new(
                    Duration::from_millis(50),
                    Duration::from_millis(250),
                ))
                .await;

            tokio::time::timeout(self.timeout, self.transport.generate(&api_key, &request))
                .await
                .map_err(|_| AnalysisError::Timeout(self.timeout))?
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Diagnosis cancelled");
                return Err(TriageError::Cancelled);
            }
            response = call => response?,
        };

        let text = response.into_text()?;
        let result = DiagnosisResult::from_json(&text).inspect_err(|e| {
            tracing::warn!("Rejected inference response: {e}");
        })?;

        if cancel.is_cancelled() {
            return Err(TriageError::Cancelled);
        }

        tracing::info!(
            is_plant = result.is_plant,
            health_score = result.health_score,
            "Diagnosis complete"
        );
        Ok(result)
    }
}
