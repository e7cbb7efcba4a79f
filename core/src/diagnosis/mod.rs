mod api;
mod requester;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod mock;

pub use api::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part, PromptFeedback,
};
pub use requester::{DEFAULT_REQUEST_TIMEOUT, DiagnosisRequester};
pub use transport::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiTransport, InferenceTransport};
pub use types::{
    CareInstruction, DiagnosisResult, GROWTH_POINT_COUNT, GrowthPoint, HealthBand, METRIC_COUNT,
    METRIC_LABELS, MathMetric, PROJECTION_DAYS,
};
