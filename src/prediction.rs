use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecommendation {
    pub crop: String,
    /// Kept as printed, so `1` is not re-emitted as `1.0`.
    pub confidence: Number,
    /// Scripts emit either a label or a figure here.
    pub expected_yield: Value,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDiagnosis {
    pub disease: String,
    pub confidence: Number,
    pub severity: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDiagnosis {
    /// Absent when the request had no `crop` key; an explicit `null` is kept.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub crop: Option<Value>,
    pub disease: String,
    pub confidence: f64,
    pub recommendation: String,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crop_recommendation_keeps_exactly_four_fields() {
        let parsed: CropRecommendation = serde_json::from_value(json!({
            "crop": "wheat",
            "confidence": 0.9,
            "expectedYield": 3.2,
            "reasoning": "soil match",
            "debug": { "svm_margin": 1.7 }
        }))
        .unwrap();

        let out = serde_json::to_value(&parsed).unwrap();
        assert_eq!(
            out,
            json!({
                "crop": "wheat",
                "confidence": 0.9,
                "expectedYield": 3.2,
                "reasoning": "soil match"
            })
        );
    }

    #[test]
    fn test_integer_confidence_is_not_widened() {
        let parsed: CropRecommendation = serde_json::from_value(json!({
            "crop": "wheat",
            "confidence": 1,
            "expectedYield": "3t/ha",
            "reasoning": "soil match"
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"{"crop":"wheat","confidence":1,"expectedYield":"3t/ha","reasoning":"soil match"}"#
        );
    }

    #[test]
    fn test_image_diagnosis_keeps_null_crop() {
        let diagnosis: ImageDiagnosis = serde_json::from_value(json!({
            "crop": null,
            "disease": "Powdery Mildew",
            "confidence": 0.81,
            "recommendation": "Apply sulfur-based fungicide"
        }))
        .unwrap();
        assert_eq!(diagnosis.crop, Some(Value::Null));

        let missing: ImageDiagnosis = serde_json::from_value(json!({
            "disease": "Powdery Mildew",
            "confidence": 0.81,
            "recommendation": "Apply sulfur-based fungicide"
        }))
        .unwrap();
        assert_eq!(missing.crop, None);
    }

    #[test]
    fn test_image_diagnosis_field_order() {
        let diagnosis = ImageDiagnosis {
            crop: Some(json!("grape")),
            disease: "Powdery Mildew".into(),
            confidence: 0.81,
            recommendation: "Apply sulfur-based fungicide".into(),
        };

        assert_eq!(
            serde_json::to_string(&diagnosis).unwrap(),
            r#"{"crop":"grape","disease":"Powdery Mildew","confidence":0.81,"recommendation":"Apply sulfur-based fungicide"}"#
        );
    }
}
