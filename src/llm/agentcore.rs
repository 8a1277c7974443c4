use aws_config::BehaviorVersion;
use aws_sdk_bedrockagentcore::config::Region;
use aws_sdk_bedrockagentcore::primitives::Blob;
use aws_sdk_bedrockagentcore::Client;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, WorkflowError};
use crate::utils::timing::log_llm_timing;

use super::decode_caption;

/// Client for a Bedrock AgentCore runtime hosting the writer agent. The
/// runtime session id is long-lived: one id per process unless the
/// environment pins a specific session.
#[derive(Clone)]
pub struct AgentCoreClient {
    client: Client,
    runtime_arn: String,
    session_id: String,
}

impl AgentCoreClient {
    pub async fn new(config: &Config) -> Result<Self> {
        let runtime_arn = config.agent_runtime_arn.trim().to_string();
        if runtime_arn.is_empty() {
            return Err(WorkflowError::Validation(
                "AGENT_RUNTIME_ARN is required for the agentcore caption backend".to_string(),
            ));
        }

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        let session_id = if config.agent_runtime_session_id.trim().is_empty() {
            let generated = Uuid::new_v4().to_string();
            info!("No AGENT_RUNTIME_SESSION_ID configured; using generated session {generated}");
            generated
        } else {
            config.agent_runtime_session_id.trim().to_string()
        };

        Ok(Self {
            client: Client::new(&aws_config),
            runtime_arn,
            session_id,
        })
    }

    pub async fn generate_caption(&self, brief: &str) -> Result<String> {
        log_llm_timing(
            "bedrock-agentcore",
            &self.runtime_arn,
            "invoke_agent_runtime",
            || async { self.invoke(brief).await },
        )
        .await
    }

    async fn invoke(&self, brief: &str) -> Result<String> {
        let payload = json!({ "input": { "prompt": brief } }).to_string();

        let output = self
            .client
            .invoke_agent_runtime()
            .agent_runtime_arn(&self.runtime_arn)
            .runtime_session_id(&self.session_id)
            .qualifier("DEFAULT")
            .payload(Blob::new(payload.into_bytes()))
            .send()
            .await
            .map_err(|err| {
                if let Some(service_error) = err.as_service_error() {
                    WorkflowError::Provider(format!("AgentCore service error: {service_error:?}"))
                } else {
                    WorkflowError::Provider(format!("AgentCore request failed: {err}"))
                }
            })?;

        let body = output.response.collect().await.map_err(|err| {
            WorkflowError::Provider(format!("failed to read AgentCore response: {err}"))
        })?;
        let text = String::from_utf8_lossy(&body.into_bytes()).into_owned();

        decode_agent_response(&text)
    }
}

/// Decodes the runtime's response envelope: `{"result": ...}` carrying either
/// a plain string or an assistant message, `{"error": ...}` for agent-side
/// failures, and raw text when no envelope is present.
fn decode_agent_response(body: &str) -> Result<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::Generation(
            "agent runtime returned an empty response".to_string(),
        ));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(WorkflowError::Provider(format!(
                "agent runtime reported an error: {error}"
            )));
        }
        if let Some(result) = value.get("result") {
            let rendered = match result {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return decode_caption(&rendered).map_err(WorkflowError::Generation);
        }
    }

    decode_caption(trimmed).map_err(WorkflowError::Generation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_string_passes_through() {
        let caption = decode_agent_response(r#"{"result": "Launch day is here."}"#).unwrap();
        assert_eq!(caption, "Launch day is here.");
    }

    #[test]
    fn result_message_object_yields_first_text_block() {
        let body = r#"{"result": {"role": "assistant", "content": [{"text": "Sip happens."}]}}"#;
        assert_eq!(decode_agent_response(body).unwrap(), "Sip happens.");
    }

    #[test]
    fn nested_json_string_result_is_unwrapped() {
        let body = r#"{"result": "{\"role\": \"assistant\", \"content\": [{\"text\": \"inner\"}]}"}"#;
        assert_eq!(decode_agent_response(body).unwrap(), "inner");
    }

    #[test]
    fn agent_error_envelope_becomes_provider_error() {
        let err = decode_agent_response(r#"{"error": "model unavailable"}"#).unwrap_err();
        match err {
            WorkflowError::Provider(message) => assert!(message.contains("model unavailable")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn raw_text_falls_through_unchanged() {
        assert_eq!(
            decode_agent_response("plain agent output").unwrap(),
            "plain agent output"
        );
    }

    #[test]
    fn empty_body_is_a_generation_error() {
        assert!(matches!(
            decode_agent_response("  ").unwrap_err(),
            WorkflowError::Generation(_)
        ));
    }
}
