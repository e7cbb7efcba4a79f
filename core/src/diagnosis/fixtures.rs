//! Canned inference payloads shared by the unit tests.

use serde_json::{json, Value};

use super::types::METRIC_LABELS;

pub(crate) fn plant_value(score: u8, analysis: &str) -> Value {
    let metrics: Vec<Value> = METRIC_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| json!({"label": label, "value": 10 * (i + 1), "unit": "u", "max": 100}))
        .collect();
    let projection: Vec<Value> = (0..10)
        .map(|i| json!({"day": 1 + 3 * i, "health": score, "size": 10 + i}))
        .collect();

    json!({
        "isPlant": true,
        "commonName": "Swiss Cheese Plant",
        "scientificName": "Monstera deliciosa",
        "healthScore": score,
        "diagnosis": "Mild chlorosis on older leaves.",
        "symptoms": ["Yellowing margins", "Drooping petioles"],
        "mathematicalAnalysis": analysis,
        "mathMetrics": metrics,
        "careInstructions": [
            {"action": "Water", "frequency": "Weekly", "description": "Soak until drainage."}
        ],
        "growthProjection": projection,
    })
}

pub(crate) fn plant_json(score: u8, analysis: &str) -> String {
    plant_value(score, analysis).to_string()
}

pub(crate) fn non_plant_json() -> String {
    json!({
        "isPlant": false,
        "commonName": "N/A",
        "scientificName": "N/A",
        "healthScore": 0,
        "diagnosis": "N/A",
        "symptoms": [],
        "mathematicalAnalysis": "N/A",
        "mathMetrics": [],
        "careInstructions": [],
        "growthProjection": [],
    })
    .to_string()
}

/// Gemini `generateContent` envelope around a diagnosis payload.
pub(crate) fn gemini_envelope(payload: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": payload}]},
            "finishReason": "STOP"
        }]
    })
}
