use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, WorkflowError};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

use super::summarize_error_body;

/// OpenAI-compatible chat-completions client used for caption writing.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: i32,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            config.writer_temperature,
            config.writer_max_tokens,
        )
    }

    pub async fn generate_caption(&self, system_prompt: &str, brief: &str) -> Result<String> {
        log_llm_timing("openai", &self.model, "chat_completion", || async {
            self.request_caption(system_prompt, brief).await
        })
        .await
    }

    async fn request_caption(&self, system_prompt: &str, brief: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": brief }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(target: "llm.chat", model = %self.model, "requesting chat completion");

        let response = get_http_client()
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                WorkflowError::Provider(format!("chat completion request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            let detail = message.unwrap_or(body_summary);
            return Err(WorkflowError::Provider(format!(
                "chat completion failed with status {status}: {detail}"
            )));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| {
                WorkflowError::Provider(format!("failed to decode chat completion: {err}"))
            })?;

        extract_completion_text(completion).map_err(WorkflowError::Generation)
    }
}

fn extract_completion_text(
    completion: ChatCompletionResponse,
) -> std::result::Result<String, String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| "chat completion contained no message content".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatClient {
        ChatClient::new("test-key", server.uri(), "gpt-4o-mini", 0.7, 2000)
    }

    #[tokio::test]
    async fn extracts_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"choices": [{"message": {"role": "assistant", "content": "  Stay cool out there.  "}}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let caption = client_for(&server)
            .generate_caption("system", "brief")
            .await
            .unwrap();
        assert_eq!(caption, "Stay cool out there.");
    }

    #[tokio::test]
    async fn missing_content_is_a_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"choices": [{"message": {"role": "assistant", "content": ""}}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate_caption("system", "brief")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Generation(_)));
    }

    #[tokio::test]
    async fn upstream_failure_is_a_provider_error_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_raw(
                r#"{"error": {"message": "rate limited", "type": "requests"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate_caption("system", "brief")
            .await
            .unwrap_err();
        match err {
            WorkflowError::Provider(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }
}
