pub mod agentcore;
pub mod chat;
pub mod gemini;
pub mod media;

use serde::Deserialize;
use serde_json::Value;

pub use agentcore::AgentCoreClient;
pub use chat::ChatClient;
pub use gemini::{GeminiImageClient, GeneratedImage};

pub(crate) fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Pulls the provider's error message out of a failure body when one exists,
/// returning it alongside a truncated rendering of the whole body.
pub(crate) fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Decodes the heterogeneous caption payloads the writer backends emit.
/// A JSON assistant message (`{"role": ..., "content": [{"text": ...}]}`)
/// yields its first text block; a JSON string unwraps one level; anything
/// else falls back to the raw text. Empty payloads are an error.
pub fn decode_caption(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty caption payload".to_string());
    }

    if let Ok(message) = serde_json::from_str::<AssistantMessage>(trimmed) {
        let text = message
            .content
            .into_iter()
            .find_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        return text.ok_or_else(|| "assistant message contained no text block".to_string());
    }

    if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(trimmed) {
        let inner = inner.trim().to_string();
        if inner.is_empty() {
            return Err("empty caption payload".to_string());
        }
        return Ok(inner);
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_assistant_message_shape() {
        let raw = r#"{"role": "assistant", "content": [{"text": "Fresh hydration, anywhere."}]}"#;
        assert_eq!(
            decode_caption(raw).unwrap(),
            "Fresh hydration, anywhere."
        );
    }

    #[test]
    fn skips_textless_leading_blocks() {
        let raw = r#"{"content": [{"toolUse": {}}, {"text": "caption"}]}"#;
        assert_eq!(decode_caption(raw).unwrap(), "caption");
    }

    #[test]
    fn assistant_message_without_text_is_an_error() {
        let raw = r#"{"content": [{"toolUse": {}}]}"#;
        assert!(decode_caption(raw).is_err());
    }

    #[test]
    fn unwraps_json_string_payloads() {
        assert_eq!(decode_caption(r#""plain caption""#).unwrap(), "plain caption");
    }

    #[test]
    fn falls_back_to_raw_text_for_other_shapes() {
        let raw = "{'role': 'assistant', 'content': [{'text': 'python repr'}]}";
        assert_eq!(decode_caption(raw).unwrap(), raw);
        assert_eq!(decode_caption("just a sentence").unwrap(), "just a sentence");
    }

    #[test]
    fn empty_payloads_are_errors() {
        assert!(decode_caption("").is_err());
        assert!(decode_caption("   ").is_err());
        assert!(decode_caption(r#""""#).is_err());
    }

    #[test]
    fn error_body_summary_prefers_nested_message() {
        let (message, summary) =
            summarize_error_body(r#"{"error": {"message": "quota exceeded", "code": 429}}"#);
        assert_eq!(message.as_deref(), Some("quota exceeded"));
        assert!(summary.contains("quota exceeded"));
    }

    #[test]
    fn error_body_summary_truncates_plain_text() {
        let long = "x".repeat(3000);
        let (message, summary) = summarize_error_body(&long);
        assert!(message.is_none());
        assert!(summary.ends_with("... (truncated)"));
    }
}
