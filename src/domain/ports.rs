use crate::domain::model::{ClassificationResult, Transcript};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, image_bytes: &[u8]) -> Result<Transcript>;
}

#[async_trait]
pub trait Normalizer: Send + Sync {
    async fn normalize(&self, raw_text: &str) -> Result<String>;
}
