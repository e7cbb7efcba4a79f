use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::{GROWTH_POINT_COUNT, METRIC_COUNT, METRIC_LABELS};
use crate::diary::DiaryEntry;
use crate::errors::AnalysisError;

pub(crate) const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Gemini structured-output schema mirroring `DiagnosisResult`.
pub(crate) static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "isPlant": { "type": "BOOLEAN" },
            "commonName": { "type": "STRING" },
            "scientificName": { "type": "STRING" },
            "healthScore": { "type": "NUMBER" },
            "diagnosis": { "type": "STRING" },
            "symptoms": { "type": "ARRAY", "items": { "type": "STRING" } },
            "mathematicalAnalysis": { "type": "STRING" },
            "mathMetrics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "value": { "type": "NUMBER" },
                        "unit": { "type": "STRING" },
                        "max": { "type": "NUMBER" }
                    },
                    "required": ["label", "value", "unit", "max"]
                }
            },
            "careInstructions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "action": { "type": "STRING" },
                        "frequency": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["action", "frequency", "description"]
                }
            },
            "growthProjection": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "NUMBER" },
                        "health": { "type": "NUMBER" },
                        "size": { "type": "NUMBER" }
                    },
                    "required": ["day", "health", "size"]
                }
            }
        },
        "required": [
            "isPlant",
            "commonName",
            "scientificName",
            "healthScore",
            "diagnosis",
            "symptoms",
            "mathematicalAnalysis",
            "mathMetrics",
            "careInstructions",
            "growthProjection"
        ]
    })
});

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    fn image(data: &str) -> Self {
        Part {
            inline_data: Some(InlineData {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data: data.to_string(),
            }),
            ..Default::default()
        }
    }

    fn text(text: String) -> Self {
        Part {
            text: Some(text),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Number of inline images carried by the request.
    pub fn image_count(&self) -> usize {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| p.inline_data.is_some())
            .count()
    }

    pub fn instruction(&self) -> Option<&str> {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn into_text(self) -> Result<String, AnalysisError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AnalysisError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(AnalysisError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some("STOP") | None => Err(AnalysisError::EmptyResponse),
                Some(reason) => Err(AnalysisError::Blocked(reason.to_string())),
            };
        }

        Ok(text)
    }
}

fn instruction_text(prior: Option<&DiaryEntry>) -> String {
    let mut text = format!(
        "First decide whether the image shows a plant or part of one (leaf, stem, flower). \
         If it shows a person, an animal or any other object, set \"isPlant\" to false, \
         set every name to \"N/A\", every score to 0, leave every list empty and do not analyse it.\n\
         If it is a plant, set \"isPlant\" to true and perform a quantitative botanical triage, \
         filling every field of the JSON schema.\n\
         Describe the plant's health with quantitative concepts in \"mathematicalAnalysis\".\n\
         Provide exactly {METRIC_COUNT} \"mathMetrics\", in this order: {}.\n\
         Provide exactly {GROWTH_POINT_COUNT} \"growthProjection\" points spanning day 1 to day 30.",
        METRIC_LABELS.join(", ")
    );

    if let Some(entry) = prior {
        text.push_str(&format!(
            "\nThe second image shows this plant's previous state from {}. \
             Compare the current image against it, detect changes in health, colour and growth, \
             and include a \"Delta Change\" insight in \"mathematicalAnalysis\".",
            entry.date
        ));
    }

    text
}

pub(crate) fn build_request(image: &str, prior: Option<&DiaryEntry>) -> GenerateContentRequest {
    let mut parts = vec![Part::image(image)];
    if let Some(entry) = prior {
        parts.push(Part::image(&entry.image_base64));
    }
    parts.push(Part::text(instruction_text(prior)));

    GenerateContentRequest {
        contents: vec![Content { role: Some("user".to_string()), parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: RESPONSE_SCHEMA.clone(),
        },
    }
}
