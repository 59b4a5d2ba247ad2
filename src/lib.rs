pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;

pub use crate::config::SaverConfig;
pub use crate::core::engine::{AnalysisEngine, DefaultEngine};
pub use crate::domain::ports::{Classifier, Normalizer, Transcriber};
pub use crate::utils::error::{Result, SaverError};
