use crate::core::chat::ChatClient;
use crate::domain::model::ClassificationResult;
use crate::domain::ports::Classifier;
use crate::utils::error::{Result, SaverError};
use async_trait::async_trait;

const SYSTEM_PROMPT: &str = "You are a helpful AI that outputs JSON only.";

pub struct ChatClassifier {
    chat: ChatClient,
}

impl ChatClassifier {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Classifier for ChatClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        if text.trim().is_empty() {
            return Err(SaverError::ValidationError {
                message: "Please enter your grocery list.".to_string(),
            });
        }

        let content = self.chat.complete(SYSTEM_PROMPT, classification_prompt(text)).await?;
        let result = parse_classification(&content)?;

        tracing::info!(
            "Classified {} essential and {} non-essential items",
            result.essentials.len(),
            result.non_essentials.len()
        );
        Ok(result)
    }
}

pub fn classification_prompt(grocery_text: &str) -> String {
    format!(
        r#"You are a budgeting assistant. The user will give you a grocery list with items, quantities, and prices.
Classify each item as 'Essential' or 'Non-Essential'.
Return the result as JSON like this:
{{
    "essentials": [{{"item": "Milk", "quantity": 1, "price": 3}}],
    "non_essentials": [{{"item": "Chips", "quantity": 1, "price": 4}}],
    "suggestions": ["Suggestion 1", "Suggestion 2"]
}}
Here is the list:
{}"#,
        grocery_text
    )
}

/// Parses the model's reply, keeping the raw reply on failure.
pub fn parse_classification(content: &str) -> Result<ClassificationResult> {
    serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        tracing::warn!("Chat service returned content that is not classification JSON: {}", e);
        SaverError::MalformedResponse {
            message: format!("classification is not valid JSON: {}", e),
            raw: content.to_string(),
        }
    })
}

/// Removes a surrounding ```json fence if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
