//! Scripted inference transport for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::api::{GenerateContentRequest, GenerateContentResponse};
use super::fixtures::gemini_envelope;
use super::transport::InferenceTransport;
use crate::errors::AnalysisError;

#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Text(String),
    Status(u16, String),
}

/// Clones share the call counter, so a test can keep a handle after moving
/// the transport into a requester.
#[derive(Clone)]
pub(crate) struct MockTransport {
    reply: Reply,
    delay: Option<Duration>,
    calls: Arc<AtomicU32>,
    image_counts: Arc<Mutex<Vec<usize>>>,
}

impl MockTransport {
    pub(crate) fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            delay: None,
            calls: Arc::new(AtomicU32::new(0)),
            image_counts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing(status: u16, message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Status(status, message.into()),
            ..Self::replying("")
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of images attached to each request received so far.
    pub(crate) fn image_counts(&self) -> Vec<usize> {
        self.image_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceTransport for MockTransport {
    async fn generate(
        &self,
        _api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.image_counts.lock().unwrap().push(request.image_count());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(serde_json::from_value(gemini_envelope(text)).unwrap()),
            Reply::Status(status, message) => Err(AnalysisError::Status {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}
