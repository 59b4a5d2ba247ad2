use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// A purchased good as classified by the chat service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "item", alias = "name", default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(default)]
    pub essentials: Vec<LineItem>,
    #[serde(default)]
    pub non_essentials: Vec<LineItem>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub remove_all: f64,
    pub remove_all_percent: f64,
    pub halve: f64,
    pub halve_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsSummary {
    pub essentials_total: f64,
    pub non_essentials_total: f64,
    pub total: f64,
    /// `None` when nothing was spent.
    pub savings: Option<Savings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub classification: ClassificationResult,
    pub summary: SavingsSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptAnalysis {
    pub transcript: Transcript,
    pub normalized: Option<String>,
    pub analysis: Option<Analysis>,
}

/// Text lines read off a receipt, in page then line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub lines: Vec<String>,
    pub attempts: u32,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Anything the service reports besides `succeeded`/`failed` means keep waiting.
    pub fn from_remote(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("succeeded") => JobStatus::Succeeded,
            Some("failed") => JobStatus::Failed,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrJob {
    pub operation_location: Url,
    pub status: JobStatus,
    pub lines: Vec<String>,
}

impl OcrJob {
    pub fn new(operation_location: Url) -> Self {
        Self {
            operation_location,
            status: JobStatus::Running,
            lines: Vec::new(),
        }
    }

    /// Terminal jobs ignore further updates.
    pub fn record_poll(&mut self, status: JobStatus, lines: Vec<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        if status == JobStatus::Succeeded {
            self.lines = lines;
        }
    }

    pub fn time_out(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::TimedOut;
        }
    }
}

fn default_quantity() -> f64 {
    1.0
}

/// Null or non-text names become empty rather than failing the whole result.
fn lenient_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount).unwrap_or(0.0))
}

fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(parse_amount)
        .filter(|q| *q > 0.0)
        .unwrap_or_else(default_quantity))
}

/// Reads a non-negative finite amount from a JSON number or a string like "Rs. 1,250.50".
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let s = s.trim();
            // skip a currency prefix such as "Rs." or "$"; a '.' right after a letter
            // ends the prefix rather than starting a decimal
            let start = s
                .char_indices()
                .find(|(i, c)| {
                    if c.is_ascii_digit() {
                        return true;
                    }
                    let after_letter = s[..*i]
                        .chars()
                        .next_back()
                        .is_some_and(|p| p.is_alphabetic());
                    (*c == '.' || *c == '-')
                        && !after_letter
                        && s[i + c.len_utf8()..].starts_with(|n: char| n.is_ascii_digit())
                })
                .map(|(i, _)| i)?;
            let cleaned: String = s[start..]
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    (amount.is_finite() && amount >= 0.0).then_some(amount)
}
