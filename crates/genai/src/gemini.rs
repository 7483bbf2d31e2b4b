//! Gemini REST client.

use crate::dto::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig, PredictInstance,
    PredictParameters, PredictRequest, PredictResponse,
};
use crate::generator::ContentGenerator;
use crate::prompt::{
    deck_schema, image_prompt, parse_deck_text, structuring_prompt, IMAGE_ASPECT_RATIO,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slidecraft_core::{Deck, Error, ImagePayload, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Which endpoint an image model is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBackend {
    /// Gemini image models: `:generateContent`, image returned as inline data.
    GenerateContent,
    /// Imagen models: `:predict`, image returned as base64 bytes.
    Predict,
}

impl ImageBackend {
    pub fn for_model(model: &str) -> Self {
        if model.trim().to_ascii_lowercase().starts_with("imagen") {
            Self::Predict
        } else {
            Self::GenerateContent
        }
    }
}

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Default endpoints and models with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn image_backend(&self) -> ImageBackend {
        ImageBackend::for_model(&self.image_model)
    }

    /// `{base}/models/{model}:{method}`
    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model,
            method
        )
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`ContentGenerator`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client. Fails only if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::GenerationFailure(format!("Failed to build HTTP client: {}", e)))?;

        log::debug!(
            "Created Gemini client (text model: {}, image model: {})",
            config.text_model,
            config.image_model
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn post<B, T>(&self, url: &str, body: &B, fail: fn(String) -> Error) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| fail(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("API error {}: {}", status, error_text);
            return Err(status_error(status, &error_text, fail));
        }

        response
            .json()
            .await
            .map_err(|e| fail(format!("Failed to parse JSON: {}", e)))
    }

    async fn image_via_generate_content(&self, prompt: String) -> Result<ImagePayload> {
        let request = GenerateContentRequest::from_text(prompt).with_config(GenerationConfig {
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            image_config: Some(ImageConfig {
                aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
            }),
            ..Default::default()
        });
        let url = self.config.endpoint(&self.config.image_model, "generateContent");
        let response: GenerateContentResponse = self
            .post(&url, &request, Error::ImageGenerationFailure)
            .await?;
        extract_inline_image(&response)
    }

    async fn image_via_predict(&self, prompt: String) -> Result<ImagePayload> {
        let request = PredictRequest {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
            },
        };
        let url = self.config.endpoint(&self.config.image_model, "predict");
        let response: PredictResponse = self
            .post(&url, &request, Error::ImageGenerationFailure)
            .await?;
        extract_prediction(&response)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn structurize(&self, raw_text: &str) -> Result<Deck> {
        let request = GenerateContentRequest::from_text(structuring_prompt(raw_text)).with_config(
            GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(deck_schema()),
                ..Default::default()
            },
        );
        let url = self.config.endpoint(&self.config.text_model, "generateContent");
        let response: GenerateContentResponse = self
            .post(&url, &request, Error::GenerationFailure)
            .await?;

        if let Some(reason) = response.block_reason() {
            log::warn!("Structuring prompt blocked: {}", reason);
        }

        let deck = parse_deck_text(&response.text())?;
        log::debug!("Structured '{}' into {} slides", deck.title, deck.len());
        Ok(deck)
    }

    async fn synthesize_image(&self, description: &str) -> Result<ImagePayload> {
        let prompt = image_prompt(description);
        match self.config.image_backend() {
            ImageBackend::GenerateContent => self.image_via_generate_content(prompt).await,
            ImageBackend::Predict => self.image_via_predict(prompt).await,
        }
    }
}

fn status_error(status: StatusCode, body: &str, fail: fn(String) -> Error) -> Error {
    fail(format!("API error {}: {}", status.as_u16(), body.trim()))
}

fn mime_or_default(mime_type: Option<&str>) -> String {
    mime_type
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(ImagePayload::DEFAULT_MIME_TYPE)
        .to_string()
}

/// First inline image of a `generateContent` response.
fn extract_inline_image(response: &GenerateContentResponse) -> Result<ImagePayload> {
    match response.inline_data() {
        Some(inline) if !inline.data.trim().is_empty() => Ok(ImagePayload::new(
            mime_or_default(inline.mime_type.as_deref()),
            inline.data.trim(),
        )),
        _ => {
            let finish = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .or(response.block_reason())
                .unwrap_or("none");
            Err(Error::ImageGenerationFailure(format!(
                "No image data found in model response (finish reason: {})",
                finish
            )))
        }
    }
}

/// First prediction of an Imagen `predict` response.
fn extract_prediction(response: &PredictResponse) -> Result<ImagePayload> {
    response
        .predictions
        .first()
        .and_then(|p| {
            let data = p.bytes_base64_encoded.as_deref()?.trim();
            (!data.is_empty()).then(|| ImagePayload::new(mime_or_default(p.mime_type.as_deref()), data))
        })
        .ok_or_else(|| Error::ImageGenerationFailure("No image data found in model response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_backend(), ImageBackend::GenerateContent);
        assert_eq!(
            config.endpoint(&config.text_model, "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn test_builders() {
        let config = GeminiConfig::new("k")
            .with_base_url("http://localhost:8080/v1/")
            .with_image_model("imagen-4.0-generate-001")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.image_backend(), ImageBackend::Predict);
        assert_eq!(
            config.endpoint(&config.image_model, "predict"),
            "http://localhost:8080/v1/models/imagen-4.0-generate-001:predict"
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", GeminiConfig::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_extract_inline_image() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"data": "iVBORw0K"}}]}}]
        }))
        .unwrap();
        let image = extract_inline_image(&response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw0K");
    }

    #[test]
    fn test_text_only_response_is_image_failure() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that"}]}, "finishReason": "STOP"}]
        }))
        .unwrap();
        match extract_inline_image(&response) {
            Err(Error::ImageGenerationFailure(msg)) => assert!(msg.contains("STOP")),
            other => panic!("expected ImageGenerationFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_blocked_prompt_is_image_failure() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(response.block_reason(), Some("SAFETY"));
        match extract_inline_image(&response) {
            Err(Error::ImageGenerationFailure(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("expected ImageGenerationFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_response_is_image_failure() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        match extract_inline_image(&response) {
            Err(Error::ImageGenerationFailure(msg)) => assert!(msg.contains("none")),
            other => panic!("expected ImageGenerationFailure, got {:?}", other),
        }

        let blank: PredictResponse = serde_json::from_value(json!({
            "predictions": [{"bytesBase64Encoded": "  "}]
        }))
        .unwrap();
        assert!(matches!(
            extract_prediction(&blank),
            Err(Error::ImageGenerationFailure(_))
        ));
    }

    #[test]
    fn test_status_error_keeps_failure_kind() {
        let body = "  {\"error\": {\"message\": \"API key not valid\"}}\n";
        match status_error(StatusCode::BAD_REQUEST, body, Error::GenerationFailure) {
            Error::GenerationFailure(msg) => {
                assert!(msg.starts_with("API error 400: {"));
                assert!(msg.contains("API key not valid"));
            }
            other => panic!("expected GenerationFailure, got {:?}", other),
        }
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", Error::ImageGenerationFailure),
            Error::ImageGenerationFailure(_)
        ));
    }

    #[test]
    fn test_extract_prediction() {
        let response: PredictResponse = serde_json::from_value(json!({
            "predictions": [{"bytesBase64Encoded": "/9j/4AAQ", "mimeType": "image/jpeg"}]
        }))
        .unwrap();
        let image = extract_prediction(&response).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4AAQ");

        assert!(matches!(
            extract_prediction(&PredictResponse::default()),
            Err(Error::ImageGenerationFailure(_))
        ));
    }

    #[test]
    fn test_client_builds() {
        let client = GeminiClient::new(GeminiConfig::new("k")).unwrap();
        assert_eq!(client.config().image_model, DEFAULT_IMAGE_MODEL);
    }
}
