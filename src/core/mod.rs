pub mod aggregator;
pub mod chat;
pub mod classifier;
pub mod engine;
pub mod normalizer;
pub mod transcriber;

pub use crate::domain::model::{Analysis, ClassificationResult, LineItem, ReceiptAnalysis, Transcript};
pub use crate::domain::ports::{Classifier, Normalizer, Transcriber};
pub use crate::utils::error::Result;
