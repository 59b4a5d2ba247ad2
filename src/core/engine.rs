use crate::config::SaverConfig;
use crate::core::aggregator;
use crate::core::chat::ChatClient;
use crate::core::classifier::ChatClassifier;
use crate::core::normalizer::ChatNormalizer;
use crate::core::transcriber::OcrTranscriber;
use crate::core::{Classifier, Normalizer, Transcriber};
use crate::domain::model::{Analysis, ReceiptAnalysis};
use crate::utils::error::Result;

pub type DefaultEngine = AnalysisEngine<ChatClassifier, OcrTranscriber, ChatNormalizer>;

pub struct AnalysisEngine<C: Classifier, T: Transcriber, N: Normalizer> {
    classifier: C,
    transcriber: T,
    normalizer: N,
}

impl DefaultEngine {
    pub fn from_config(config: &SaverConfig) -> Result<Self> {
        let chat = ChatClient::new(config.chat.clone())?;
        Ok(Self::new(
            ChatClassifier::new(chat.clone()),
            OcrTranscriber::new(config.ocr.clone())?,
            ChatNormalizer::new(chat),
        ))
    }
}

impl<C: Classifier, T: Transcriber, N: Normalizer> AnalysisEngine<C, T, N> {
    pub fn new(classifier: C, transcriber: T, normalizer: N) -> Self {
        Self {
            classifier,
            transcriber,
            normalizer,
        }
    }

    pub async fn analyze_text(&self, text: &str) -> Result<Analysis> {
        tracing::info!("Analyzing grocery list...");
        let classification = self.classifier.classify(text).await?;
        let summary = aggregator::analyze(&classification);

        tracing::info!(
            "Total {:.2}, essentials {:.2}, non-essentials {:.2}",
            summary.total,
            summary.essentials_total,
            summary.non_essentials_total
        );
        Ok(Analysis {
            classification,
            summary,
        })
    }

    /// Transcribe, normalize, classify. An empty transcript skips the last two steps.
    pub async fn analyze_receipt(&self, image_bytes: &[u8]) -> Result<ReceiptAnalysis> {
        tracing::info!("Running OCR...");
        let transcript = self.transcriber.transcribe(image_bytes).await?;

        if transcript.is_empty() {
            tracing::warn!("No text found on this receipt");
            return Ok(ReceiptAnalysis {
                transcript,
                normalized: None,
                analysis: None,
            });
        }

        tracing::info!("Cleaning OCR text...");
        let normalized = self.normalizer.normalize(&transcript.text()).await?;
        let analysis = self.analyze_text(&normalized).await?;

        Ok(ReceiptAnalysis {
            transcript,
            normalized: Some(normalized),
            analysis: Some(analysis),
        })
    }
}
