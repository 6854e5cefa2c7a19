use super::{Predictor, PredictorError};
use async_trait::async_trait;
use serde_json::{Map, Value};

const DISEASE: &str = "Powdery Mildew";
const CONFIDENCE: f64 = 0.81;
const RECOMMENDATION: &str = "Apply sulfur-based fungicide";

/// Stand-in for image analysis. The image itself is never inspected; the
/// diagnosis is fixed and only `crop` is echoed back.
#[derive(Debug, Clone, Default)]
pub struct CannedImageDiagnosis;

#[async_trait]
impl Predictor for CannedImageDiagnosis {
    async fn predict(&self, request: &Value) -> Result<Value, PredictorError> {
        let mut diagnosis = Map::new();
        if let Some(crop) = request.get("crop") {
            diagnosis.insert("crop".into(), crop.clone());
        }
        diagnosis.insert("disease".into(), DISEASE.into());
        diagnosis.insert("confidence".into(), CONFIDENCE.into());
        diagnosis.insert("recommendation".into(), RECOMMENDATION.into());

        Ok(Value::Object(diagnosis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_diagnosis_ignores_filename() {
        let predictor = CannedImageDiagnosis;

        let a = predictor
            .predict(&json!({ "filename": "leaf.jpg", "crop": "grape" }))
            .await
            .unwrap();
        let b = predictor
            .predict(&json!({ "filename": "", "crop": "grape" }))
            .await
            .unwrap();
        let c = predictor.predict(&json!({ "crop": "grape" })).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a["disease"], DISEASE);
        assert_eq!(a["confidence"], CONFIDENCE);
        assert_eq!(a["recommendation"], RECOMMENDATION);
    }

    #[tokio::test]
    async fn test_missing_crop_is_omitted() {
        let diagnosis = CannedImageDiagnosis
            .predict(&json!({ "filename": "leaf.jpg" }))
            .await
            .unwrap();

        assert!(diagnosis.get("crop").is_none());
    }

    #[tokio::test]
    async fn test_null_crop_is_echoed() {
        let diagnosis = CannedImageDiagnosis
            .predict(&json!({ "filename": "leaf.jpg", "crop": null }))
            .await
            .unwrap();

        assert_eq!(diagnosis.get("crop"), Some(&Value::Null));
    }
}
