use crate::app::report::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const RECEIPT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

#[derive(Debug, Clone, Parser)]
#[command(name = "grocery-saver")]
#[command(about = "Classify grocery purchases and estimate potential savings")]
pub struct Cli {
    /// Optional TOML settings file; environment variables take precedence
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, value_enum, global = true, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(long, global = true, default_value = "Rs.")]
    pub currency: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Analyze a typed list, one `Item - price` per line
    Text {
        /// Read the list from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Read a receipt image or PDF and analyze its items
    Receipt {
        /// JPG, PNG or PDF file
        path: PathBuf,
    },
}
