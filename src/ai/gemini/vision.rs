use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::VisionModel;
use crate::submission::ImageSubmission;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Production adapter sending the prompt and inline image to Gemini.
pub struct GeminiVisionClient {
    http: GeminiHttpClient,
}

impl GeminiVisionClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(prompt: &str, image: &ImageSubmission) -> GenerateContentRequest {
        let data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        }
    }

    /// Concatenates every text part of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let candidate = response.candidates.first()?;
        let content = candidate.content.as_ref()?;

        let text: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text.concat())
        }
    }
}

#[async_trait]
impl VisionModel for GeminiVisionClient {
    async fn generate(&self, prompt: &str, image: &ImageSubmission) -> Result<String> {
        tracing::debug!(
            "Sending {} image ({} bytes) to Gemini model {}",
            image.mime_type,
            image.bytes.len(),
            self.http.model()
        );

        let request = Self::build_request(prompt, image);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(&response).ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            tracing::warn!("Gemini returned no text (finish reason: {})", reason);
            Error::AiProvider(format!("No text in Gemini response ({})", reason))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image() -> ImageSubmission {
        ImageSubmission::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
    }

    fn client(server: &MockServer) -> GeminiVisionClient {
        GeminiVisionClient::new(
            "test-key".to_string(),
            "gemini-1.5-flash".to_string(),
            Duration::from_secs(5),
        )
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_inline_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("\"inlineData\""))
            .and(body_string_contains("\"mimeType\":\"image/jpeg\""))
            .and(body_string_contains("\"data\":\"/9j/4A==\""))
            .and(body_string_contains("identify this"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "It is a fern." }]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .generate("identify this", &image())
            .await
            .unwrap();
        assert_eq!(text, "It is a fern.");
    }

    #[tokio::test]
    async fn test_generate_concatenates_text_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "{\"plantName\":" }, { "text": "\"Fern\"}" }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let text = client(&server).generate("p", &image()).await.unwrap();
        assert_eq!(text, "{\"plantName\":\"Fern\"}");
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client(&server).generate("p", &image()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let err = client(&server).generate("p", &image()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_blocked_candidate_without_content_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate("p", &image()).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).generate("p", &image()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client = GeminiVisionClient::new(
            "k".to_string(),
            "gemini-1.5-flash".to_string(),
            Duration::from_millis(50),
        )
        .with_base_url(server.uri());

        let err = client.generate("p", &image()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
