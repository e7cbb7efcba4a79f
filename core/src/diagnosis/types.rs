use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

pub const METRIC_COUNT: usize = 5;
pub const GROWTH_POINT_COUNT: usize = 10;
pub const PROJECTION_DAYS: std::ops::RangeInclusive<f64> = 1.0..=30.0;

/// Quantitative indicators requested for every plant subject, in order.
pub const METRIC_LABELS: [&str; METRIC_COUNT] = [
    "Chlorophyll Density",
    "Surface Area",
    "Fractal Dimension",
    "Stomatal Conductance",
    "Turgor Pressure",
];

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MathMetric {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub max: f64,
}

impl MathMetric {
    /// Value on a 0-100 scale relative to `max`.
    pub fn normalized(&self) -> f64 {
        self.value / self.max * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CareInstruction {
    pub action: String,
    pub frequency: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct GrowthPoint {
    pub day: f64,
    pub health: f64,
    pub size: f64,
}

/// Wire shape of the inference response. Every field is required, which
/// makes serde reject partial objects.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDiagnosis {
    is_plant: bool,
    common_name: String,
    scientific_name: String,
    health_score: f64,
    diagnosis: String,
    symptoms: Vec<String>,
    mathematical_analysis: String,
    math_metrics: Vec<MathMetric>,
    care_instructions: Vec<CareInstruction>,
    growth_projection: Vec<GrowthPoint>,
}

/// A validated diagnosis.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub is_plant: bool,
    pub common_name: String,
    pub scientific_name: String,
    pub health_score: u8,
    pub diagnosis: String,
    pub symptoms: Vec<String>,
    pub mathematical_analysis: String,
    pub math_metrics: Vec<MathMetric>,
    pub care_instructions: Vec<CareInstruction>,
    pub growth_projection: Vec<GrowthPoint>,
    /// Band of the score as reported, before rounding.
    #[serde(skip)]
    band: HealthBand,
}

impl DiagnosisResult {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let raw: RawDiagnosis = serde_json::from_str(text)?;
        raw.try_into()
    }

    pub fn health_band(&self) -> HealthBand {
        self.band
    }
}

fn finite(value: f64, field: &'static str) -> Result<f64, SchemaError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchemaError::NonFinite(field))
    }
}

fn validate_metrics(metrics: &[MathMetric]) -> Result<(), SchemaError> {
    if metrics.len() != METRIC_COUNT {
        return Err(SchemaError::MetricCount {
            expected: METRIC_COUNT,
            actual: metrics.len(),
        });
    }
    for metric in metrics {
        finite(metric.value, "mathMetrics.value")?;
        if finite(metric.max, "mathMetrics.max")? <= 0.0 {
            return Err(SchemaError::MetricMaximum(metric.label.clone()));
        }
    }
    Ok(())
}

fn validate_projection(points: &[GrowthPoint]) -> Result<(), SchemaError> {
    if points.len() != GROWTH_POINT_COUNT {
        return Err(SchemaError::GrowthPointCount {
            expected: GROWTH_POINT_COUNT,
            actual: points.len(),
        });
    }
    let mut previous = f64::MIN;
    for point in points {
        let day = finite(point.day, "growthProjection.day")?;
        finite(point.health, "growthProjection.health")?;
        finite(point.size, "growthProjection.size")?;
        if !PROJECTION_DAYS.contains(&day) {
            return Err(SchemaError::GrowthDayOutOfRange(day));
        }
        if day < previous {
            return Err(SchemaError::GrowthNotChronological);
        }
        previous = day;
    }
    Ok(())
}

impl TryFrom<RawDiagnosis> for DiagnosisResult {
    type Error = SchemaError;

    fn try_from(raw: RawDiagnosis) -> Result<Self, Self::Error> {
        let score = finite(raw.health_score, "healthScore")?;
        if !(0.0..=100.0).contains(&score) {
            return Err(SchemaError::HealthScoreOutOfRange(score));
        }

        // Placeholder payloads for non-plant subjects carry no analysis to check.
        if raw.is_plant {
            validate_metrics(&raw.math_metrics)?;
            validate_projection(&raw.growth_projection)?;
        }

        Ok(DiagnosisResult {
            is_plant: raw.is_plant,
            common_name: raw.common_name,
            scientific_name: raw.scientific_name,
            health_score: score.round() as u8,
            diagnosis: raw.diagnosis,
            symptoms: raw.symptoms,
            mathematical_analysis: raw.mathematical_analysis,
            math_metrics: raw.math_metrics,
            care_instructions: raw.care_instructions,
            growth_projection: raw.growth_projection,
            band: HealthBand::from_value(score),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthBand {
    Thriving,
    Stressed,
    Critical,
}

impl HealthBand {
    pub fn from_score(score: u8) -> Self {
        Self::from_value(f64::from(score))
    }

    pub fn from_value(score: f64) -> Self {
        if score > 80.0 {
            HealthBand::Thriving
        } else if score > 50.0 {
            HealthBand::Stressed
        } else {
            HealthBand::Critical
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnosis::fixtures::{non_plant_json, plant_json, plant_value};

    #[test]
    fn test_plant_response_decodes() {
        let result = DiagnosisResult::from_json(&plant_json(72, "Leaf area index trending up")).unwrap();
        assert!(result.is_plant);
        assert_eq!(result.health_score, 72);
        assert_eq!(result.math_metrics.len(), METRIC_COUNT);
        assert_eq!(result.growth_projection.len(), GROWTH_POINT_COUNT);
        assert_eq!(result.health_band(), HealthBand::Stressed);
    }

    #[test]
    fn test_non_plant_placeholders_decode() {
        let result = DiagnosisResult::from_json(&non_plant_json()).unwrap();
        assert!(!result.is_plant);
        assert_eq!(result.common_name, "N/A");
        assert_eq!(result.health_score, 0);
    }

    #[test]
    fn test_missing_field_is_schema_mismatch() {
        let mut value = plant_value(80, "ok");
        value.as_object_mut().unwrap().remove("careInstructions");
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_schema_mismatch() {
        let mut value = plant_value(80, "ok");
        value["healthScore"] = serde_json::json!("eighty");
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_score_out_of_range() {
        let mut value = plant_value(80, "ok");
        value["healthScore"] = serde_json::json!(140);
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::HealthScoreOutOfRange(_))
        ));
    }

    #[test]
    fn test_metric_count_enforced_for_plants() {
        let mut value = plant_value(80, "ok");
        value["mathMetrics"].as_array_mut().unwrap().pop();
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::MetricCount {
                expected: 5,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_metric_zero_maximum_rejected() {
        let mut value = plant_value(80, "ok");
        value["mathMetrics"][2]["max"] = serde_json::json!(0);
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::MetricMaximum(label)) if label == "Fractal Dimension"
        ));
    }

    #[test]
    fn test_projection_must_be_chronological() {
        let mut value = plant_value(80, "ok");
        value["growthProjection"][3]["day"] = serde_json::json!(1);
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::GrowthNotChronological)
        ));
    }

    #[test]
    fn test_projection_day_range() {
        let mut value = plant_value(80, "ok");
        value["growthProjection"][9]["day"] = serde_json::json!(45);
        assert!(matches!(
            DiagnosisResult::from_json(&value.to_string()),
            Err(SchemaError::GrowthDayOutOfRange(_))
        ));
    }

    #[test]
    fn test_fractional_score_rounds() {
        let mut value = plant_value(80, "ok");
        value["healthScore"] = serde_json::json!(71.6);
        let result = DiagnosisResult::from_json(&value.to_string()).unwrap();
        assert_eq!(result.health_score, 72);
    }

    #[test]
    fn test_metric_normalization() {
        let metric = MathMetric {
            label: "Turgor Pressure".into(),
            value: 0.6,
            unit: "MPa".into(),
            max: 1.2,
        };
        assert!((metric.normalized() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(HealthBand::from_score(100), HealthBand::Thriving);
        assert_eq!(HealthBand::from_score(81), HealthBand::Thriving);
        assert_eq!(HealthBand::from_score(80), HealthBand::Stressed);
        assert_eq!(HealthBand::from_score(51), HealthBand::Stressed);
        assert_eq!(HealthBand::from_score(50), HealthBand::Critical);
        assert_eq!(HealthBand::from_score(0), HealthBand::Critical);
    }

    #[test]
    fn test_band_uses_unrounded_score() {
        let mut value = plant_value(80, "Borderline turgor");
        value["healthScore"] = serde_json::json!(80.4);
        let result = DiagnosisResult::from_json(&value.to_string()).unwrap();
        assert_eq!(result.health_score, 80);
        assert_eq!(result.health_band(), HealthBand::Thriving);

        value["healthScore"] = serde_json::json!(50.3);
        let result = DiagnosisResult::from_json(&value.to_string()).unwrap();
        assert_eq!(result.health_score, 50);
        assert_eq!(result.health_band(), HealthBand::Stressed);
    }
}
