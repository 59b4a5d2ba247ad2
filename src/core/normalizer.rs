use crate::core::chat::ChatClient;
use crate::domain::ports::Normalizer;
use crate::utils::error::{Result, SaverError};
use async_trait::async_trait;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that formats receipt text.";

/// Turns raw OCR text into an `Item - Quantity - Price` table for the classifier.
pub struct ChatNormalizer {
    chat: ChatClient,
}

impl ChatNormalizer {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Normalizer for ChatNormalizer {
    async fn normalize(&self, raw_text: &str) -> Result<String> {
        if raw_text.trim().is_empty() {
            return Err(SaverError::ValidationError {
                message: "There is no receipt text to clean up.".to_string(),
            });
        }

        let table = self
            .chat
            .complete(SYSTEM_PROMPT, normalization_prompt(raw_text))
            .await?;
        tracing::debug!("Normalized receipt text into {} lines", table.lines().count());
        Ok(table)
    }
}

pub fn normalization_prompt(raw_text: &str) -> String {
    format!(
        r#"You are a grocery assistant. The user provides a raw receipt text:
{}

Extract only the purchased items with their quantity (default 1 if not present) and total price.
Ignore any other irrelevant text (store info, barcodes, date, etc.).
Return the result as a formatted text list like this (human readable):
Item - Quantity - Price
Milk - 1 - 3
Chips - 2 - 5"#,
        raw_text
    )
}
