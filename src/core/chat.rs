use crate::config::ChatConfig;
use crate::utils::error::{Result, SaverError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Chat completion service";

/// Thin client for an Azure-style chat-completion deployment.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SaverError::ConfigError {
                message: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Sends one system + user exchange and returns the first choice's content.
    pub async fn complete(&self, system: &str, user: String) -> Result<String> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        tracing::debug!(
            "Sending chat completion request to deployment '{}'",
            self.config.deployment
        );
        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", self.config.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Chat completion response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SaverError::remote_service(SERVICE, status, body));
        }

        extract_content(body)
    }
}

fn extract_content(body: String) -> Result<String> {
    let payload: ChatResponse = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return Err(SaverError::MalformedResponse {
                message: format!("unexpected chat completion payload: {}", e),
                raw: body,
            })
        }
    };

    match payload.choices.into_iter().next() {
        Some(choice) => Ok(choice.message.content.unwrap_or_default()),
        None => Err(SaverError::MalformedResponse {
            message: "chat completion contained no choices".to_string(),
            raw: body,
        }),
    }
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
