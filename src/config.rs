use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

/// Which backend produces captions. The original deployment evolved from a
/// direct chat-completions call towards the Bedrock AgentCore runtime; both
/// remain supported behind a startup-time switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionBackend {
    OpenAi,
    AgentCore,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upload_dir: PathBuf,
    pub generated_dir: PathBuf,
    pub caption_backend: CaptionBackend,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub writer_temperature: f32,
    pub writer_max_tokens: i32,
    pub agent_runtime_arn: String,
    pub agent_runtime_session_id: String,
    pub aws_region: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub image_candidate_count: u32,
    pub image_aspect_ratio: Option<String>,
    pub enable_image_generation: bool,
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_caption_backend(value: &str) -> CaptionBackend {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return CaptionBackend::OpenAi;
    }

    match trimmed.to_lowercase().as_str() {
        "openai" | "chat" => CaptionBackend::OpenAi,
        "agentcore" | "agent_core" | "bedrock" => CaptionBackend::AgentCore,
        _ => {
            warn!(
                "Unknown CAPTION_BACKEND value '{}'; defaulting to openai.",
                value
            );
            CaptionBackend::OpenAi
        }
    }
}

fn resolve_aws_region() -> String {
    env_optional("AWS_REGION")
        .or_else(|| env_optional("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|| "us-west-2".to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            port: env_u16("PORT", 8000),
            upload_dir: PathBuf::from(env_string("UPLOAD_DIR", "uploads")),
            generated_dir: PathBuf::from(env_string("GENERATED_DIR", "generated")),
            caption_backend: normalize_caption_backend(&env_string("CAPTION_BACKEND", "openai")),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: env_string("OPENAI_MODEL", "gpt-4o-mini"),
            writer_temperature: env_f32("WRITER_TEMPERATURE", 0.7),
            writer_max_tokens: env_i32("WRITER_MAX_TOKENS", 2000),
            agent_runtime_arn: env_string("AGENT_RUNTIME_ARN", ""),
            agent_runtime_session_id: env_string("AGENT_RUNTIME_SESSION_ID", ""),
            aws_region: resolve_aws_region(),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_base_url: env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash"),
            image_candidate_count: env_u32("IMAGE_CANDIDATE_COUNT", 4).max(1),
            image_aspect_ratio: env_optional("IMAGE_ASPECT_RATIO"),
            enable_image_generation: env_bool("ENABLE_IMAGE_GENERATION", true),
        })
    }
}

pub const WRITER_SYSTEM_PROMPT: &str = "You are a professional social media content writer specializing in creating engaging, viral-worthy posts across all platforms.\n\nYou will ALWAYS follow these guidelines when creating content:\n- Create content that is engaging, informative, and aligned with the brand voice\n- Research thoroughly before writing to ensure accuracy and relevance\n- Optimize content for the target audience and platform requirements\n- Always maintain a professional and creative tone\n- Focus on creating content that drives engagement and achieves marketing objectives\n- Ensure all content is original and plagiarism-free\n- Adapt content style and tone based on the target platform and audience\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_backend_defaults_to_openai() {
        assert_eq!(normalize_caption_backend(""), CaptionBackend::OpenAi);
        assert_eq!(normalize_caption_backend("openai"), CaptionBackend::OpenAi);
        assert_eq!(normalize_caption_backend("nonsense"), CaptionBackend::OpenAi);
    }

    #[test]
    fn caption_backend_accepts_agentcore_aliases() {
        assert_eq!(
            normalize_caption_backend("agentcore"),
            CaptionBackend::AgentCore
        );
        assert_eq!(
            normalize_caption_backend("Bedrock"),
            CaptionBackend::AgentCore
        );
    }

    #[test]
    fn env_helpers_fall_back_on_garbage() {
        std::env::set_var("AM_TEST_PORT_GARBAGE", "not-a-number");
        assert_eq!(env_u16("AM_TEST_PORT_GARBAGE", 8000), 8000);
        std::env::remove_var("AM_TEST_PORT_GARBAGE");

        assert!(env_bool("AM_TEST_MISSING_BOOL", true));
        assert_eq!(env_u32("AM_TEST_MISSING_U32", 4), 4);
    }
}
