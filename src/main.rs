use clap::Parser;
use grocery_saver::app::report::{self, ReportOptions};
use grocery_saver::config::cli::{Command, RECEIPT_EXTENSIONS};
use grocery_saver::utils::error::ErrorSeverity;
use grocery_saver::utils::{logger, validation};
use grocery_saver::{Cli, DefaultEngine, SaverConfig, SaverError};
use std::io::Read;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting grocery-saver");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    match run(&cli).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ grocery-saver failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            if let Some(raw) = e.raw_content() {
                eprintln!("{}", raw);
            }
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run(cli: &Cli) -> Result<String, SaverError> {
    let config = SaverConfig::load(cli.config.as_deref())?;
    tracing::debug!("Configuration: {:?}", config);

    let options = ReportOptions {
        format: cli.format,
        currency: cli.currency.clone(),
    };

    match &cli.command {
        Command::Text { file } => {
            config.validate_for_text()?;

            let text = match file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let engine = DefaultEngine::from_config(&config)?;
            let analysis = engine.analyze_text(&text).await?;
            tracing::info!("✅ Analysis complete");
            report::render_analysis(&analysis, &options)
        }
        Command::Receipt { path } => {
            config.validate_for_receipt()?;
            validation::validate_file_extension("receipt", path, &RECEIPT_EXTENSIONS)?;

            let bytes = tokio::fs::read(path).await?;
            tracing::info!("📁 Read {} bytes from {}", bytes.len(), path.display());

            let engine = DefaultEngine::from_config(&config)?;
            let receipt = engine.analyze_receipt(&bytes).await?;
            tracing::info!("✅ Receipt analysis complete");
            report::render_receipt(&receipt, &options)
        }
    }
}
