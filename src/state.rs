use std::sync::Arc;

use tracing::{error, warn};

use crate::config::{CaptionBackend, Config, WRITER_SYSTEM_PROMPT};
use crate::error::Result;
use crate::llm::{AgentCoreClient, ChatClient, GeminiImageClient};

/// The configured caption backend, constructed once at startup.
pub enum CaptionClient {
    Chat(ChatClient),
    AgentRuntime(AgentCoreClient),
}

impl CaptionClient {
    pub async fn generate_caption(&self, brief: &str) -> Result<String> {
        match self {
            CaptionClient::Chat(client) => {
                client.generate_caption(WRITER_SYSTEM_PROMPT, brief).await
            }
            CaptionClient::AgentRuntime(client) => client.generate_caption(brief).await,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub caption: Option<Arc<CaptionClient>>,
    pub photographer: Option<Arc<GeminiImageClient>>,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let caption = match config.caption_backend {
            CaptionBackend::OpenAi => {
                if config.openai_api_key.trim().is_empty() {
                    warn!("OPENAI_API_KEY is not set; caption generation is disabled");
                    None
                } else {
                    Some(Arc::new(CaptionClient::Chat(ChatClient::from_config(
                        &config,
                    ))))
                }
            }
            CaptionBackend::AgentCore => match AgentCoreClient::new(&config).await {
                Ok(client) => Some(Arc::new(CaptionClient::AgentRuntime(client))),
                Err(err) => {
                    error!("Failed to initialize the AgentCore caption backend: {err}");
                    None
                }
            },
        };

        let photographer = if !config.enable_image_generation {
            None
        } else if config.gemini_api_key.trim().is_empty() {
            warn!("GEMINI_API_KEY is not set; image generation is disabled");
            None
        } else {
            Some(Arc::new(GeminiImageClient::from_config(&config)))
        };

        AppState {
            config: Arc::new(config),
            caption,
            photographer,
        }
    }
}
