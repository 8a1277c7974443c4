use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, WorkflowError};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

use super::media::ReferenceImage;
use super::summarize_error_body;

const GEMINI_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const IMAGE_SYSTEM_INSTRUCTION: &str =
    "Edit the images based on the prompt. CRITICAL: the response must be an image, NOT TEXT.";

/// One decoded candidate image from the provider.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Gemini `generateContent` client for reference-guided product photography.
#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    api_key: String,
    base_url: String,
    model: String,
    candidate_count: u32,
    aspect_ratio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiImageClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        candidate_count: u32,
        aspect_ratio: Option<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            candidate_count: candidate_count.max(1),
            aspect_ratio,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            config.gemini_image_model.clone(),
            config.image_candidate_count,
            config.image_aspect_ratio.clone(),
        )
    }

    pub async fn generate(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
    ) -> Result<Vec<GeneratedImage>> {
        if prompt.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "prompt must not be empty when requesting image generation".to_string(),
            ));
        }
        if references.is_empty() {
            return Err(WorkflowError::Validation(
                "at least one reference image is required".to_string(),
            ));
        }

        log_llm_timing("gemini", &self.model, "generate_images", || async {
            self.generate_inner(prompt, references).await
        })
        .await
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
    ) -> Result<Vec<GeneratedImage>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut candidate_count = self.candidate_count;
        let mut downgraded = false;

        loop {
            let payload = self.build_payload(prompt, references, candidate_count);
            debug!(
                target: "llm.gemini",
                model = %self.model,
                references = references.len(),
                candidates = candidate_count,
                "requesting image generation"
            );

            let response = get_http_client()
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(GEMINI_REQUEST_TIMEOUT)
                .json(&payload)
                .send()
                .await
                .map_err(|err| {
                    WorkflowError::Provider(format!("Gemini request failed: {err}"))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&body);

                // Some image models only accept single-candidate requests.
                if status == StatusCode::BAD_REQUEST && candidate_count > 1 && !downgraded {
                    warn!(
                        "Gemini rejected a {}-candidate request ({}); retrying with a single candidate",
                        candidate_count,
                        message.as_deref().unwrap_or("no detail")
                    );
                    candidate_count = 1;
                    downgraded = true;
                    continue;
                }

                let detail = message.unwrap_or(body_summary);
                return Err(WorkflowError::Provider(format!(
                    "Gemini request failed with status {status}: {detail}"
                )));
            }

            let decoded = response.json::<GeminiResponse>().await.map_err(|err| {
                WorkflowError::Provider(format!("failed to decode Gemini response: {err}"))
            })?;

            let images = extract_images(decoded);
            if images.is_empty() {
                return Err(WorkflowError::Generation(format!(
                    "no images returned by Gemini (model: {})",
                    self.model
                )));
            }
            return Ok(images);
        }
    }

    fn build_payload(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
        candidate_count: u32,
    ) -> Value {
        let mut parts = vec![json!({ "text": prompt })];
        for reference in references {
            parts.push(json!({
                "inlineData": {
                    "mimeType": reference.mime_type,
                    "data": general_purpose::STANDARD.encode(&reference.bytes)
                }
            }));
        }

        let mut generation_config = Map::new();
        generation_config.insert("candidateCount".to_string(), json!(candidate_count));
        generation_config.insert("responseModalities".to_string(), json!(["TEXT", "IMAGE"]));
        if let Some(aspect_ratio) = self.aspect_ratio.as_deref() {
            let trimmed = aspect_ratio.trim();
            if !trimmed.is_empty() {
                generation_config.insert(
                    "imageConfig".to_string(),
                    json!({ "aspectRatio": trimmed }),
                );
            }
        }

        json!({
            "systemInstruction": { "parts": [{ "text": IMAGE_SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": Value::Object(generation_config),
        })
    }
}

fn extract_images(response: GeminiResponse) -> Vec<GeneratedImage> {
    let mut images = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        if let Some(content) = candidate.content {
            if let Some(parts) = content.parts {
                for part in parts {
                    if let GeminiPart::InlineData { inline_data } = part {
                        if inline_data.mime_type.starts_with("image/") {
                            if let Ok(bytes) = general_purpose::STANDARD.decode(inline_data.data) {
                                images.push(GeneratedImage {
                                    bytes,
                                    mime_type: inline_data.mime_type,
                                });
                            }
                        }
                    }
                }
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, candidate_count: u32) -> GeminiImageClient {
        GeminiImageClient::new("test-key", server.uri(), "test-model", candidate_count, None)
    }

    fn reference() -> Vec<ReferenceImage> {
        vec![ReferenceImage::new(b"reference-bytes".to_vec())]
    }

    fn image_body() -> String {
        let data = general_purpose::STANDARD.encode(b"generated-image");
        format!(
            r#"{{"candidates": [{{"content": {{"parts": [{{"text": "here you go"}}, {{"inlineData": {{"mimeType": "image/png", "data": "{data}"}}}}]}}}}]}}"#
        )
    }

    #[tokio::test]
    async fn decodes_inline_image_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(image_body(), "application/json"))
            .mount(&server)
            .await;

        let images = client_for(&server, 1)
            .generate("a bottle on a rock", &reference())
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].bytes, b"generated-image");
    }

    #[tokio::test]
    async fn downgrades_candidate_count_once_on_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(body_string_contains("\"candidateCount\":4"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error": {"message": "candidateCount is not supported"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(body_string_contains("\"candidateCount\":1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(image_body(), "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let images = client_for(&server, 4)
            .generate("a bottle on a rock", &reference())
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
    }

    #[tokio::test]
    async fn second_rejection_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error": {"message": "still unsupported"}}"#,
                "application/json",
            ))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server, 4)
            .generate("a bottle on a rock", &reference())
            .await
            .unwrap_err();
        match err {
            WorkflowError::Provider(message) => assert!(message.contains("still unsupported")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_only_response_is_a_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"candidates": [{"content": {"parts": [{"text": "sorry, text only"}]}}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = client_for(&server, 1)
            .generate("a bottle on a rock", &reference())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Generation(_)));
    }

    #[tokio::test]
    async fn empty_prompt_fails_validation_before_any_request() {
        let server = MockServer::start().await;
        let err = client_for(&server, 1)
            .generate("   ", &reference())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_references_fail_validation() {
        let server = MockServer::start().await;
        let err = client_for(&server, 1)
            .generate("a bottle", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}
