//! Client for the external prediction service.
//!
//! Three endpoints, all treated as black boxes:
//! - `POST /predict_crop` – soil and climate parameters in, recommended crop out
//! - `POST /predict_disease` – plant image in, disease class and confidence out
//! - `POST /analyze` – plant image in, free-text disease analysis out

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::PredictionError;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SoilType {
    Sandy,
    Loamy,
    Black,
    Clayey,
    Red,
}

/// Body of a crop prediction request. Field names follow the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropPredictionRequest {
    // ---
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Moisture")]
    pub moisture: f64,
    #[serde(rename = "Soil Type")]
    pub soil_type: SoilType,
    #[serde(rename = "Nitrogen")]
    pub nitrogen: f64,
    #[serde(rename = "Potassium")]
    pub potassium: f64,
    #[serde(rename = "Phosphorus")]
    pub phosphorus: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropPrediction {
    pub predicted_crop: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiseaseClass {
    pub confidence: f64,
    pub predicted_class: String,
    pub predicted_index: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiseasePrediction {
    pub prediction: DiseaseClass,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiseaseAnalysis {
    pub analysis: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    // ---
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PredictionError> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Recommend a crop for the given soil and climate.
    pub async fn predict_crop(
        &self,
        request: &CropPredictionRequest,
    ) -> Result<CropPrediction, PredictionError> {
        // ---
        info!("Requesting crop prediction for {:?} soil", request.soil_type);
        let response = self
            .client
            .post(self.url("predict_crop"))
            .json(request)
            .send()
            .await?;

        let prediction: CropPrediction = Self::decode(response).await?;
        info!("Predicted crop: {}", prediction.predicted_crop);
        Ok(prediction)
    }

    /// Classify the disease visible in a plant image.
    pub async fn predict_disease(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<DiseasePrediction, PredictionError> {
        // ---
        let form = Form::new().part("file", image_part(image, file_name));
        let response = self
            .client
            .post(self.url("predict_disease"))
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Free-text analysis of a plant image.
    pub async fn analyze_disease(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<DiseaseAnalysis, PredictionError> {
        // ---
        let form = Form::new().part("imagefile", image_part(image, file_name));
        let response = self
            .client
            .post(self.url("analyze"))
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PredictionError> {
        // ---
        let status = response.status();
        debug!("Prediction service answered {} for {}", status, response.url());

        if !status.is_success() {
            error!("Prediction request failed with status: {}", status);
            return Err(PredictionError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

fn image_part(image: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(image).file_name(file_name.to_string())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crop_request_field_names() {
        // ---
        let request = CropPredictionRequest {
            temperature: 26.0,
            humidity: 52.0,
            moisture: 38.0,
            soil_type: SoilType::Black,
            nitrogen: 37.0,
            potassium: 0.0,
            phosphorus: 0.0,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "Temperature": 26.0,
                "Humidity": 52.0,
                "Moisture": 38.0,
                "Soil Type": "Black",
                "Nitrogen": 37.0,
                "Potassium": 0.0,
                "Phosphorus": 0.0
            })
        );
    }

    #[test]
    fn test_disease_response_shape() {
        // ---
        let body = json!({
            "prediction": {
                "confidence": 0.973,
                "predicted_class": "Tomato___Late_blight",
                "predicted_index": 30
            },
            "status": "success"
        });

        let parsed: DiseasePrediction = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.prediction.predicted_class, "Tomato___Late_blight");
        assert_eq!(parsed.prediction.predicted_index, 30);
    }

    #[test]
    fn test_url_join() {
        // ---
        let client = PredictionClient::new("https://predict.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("analyze"), "https://predict.example.com/analyze");
    }
}
