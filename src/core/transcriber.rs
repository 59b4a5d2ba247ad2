use crate::config::OcrConfig;
use crate::domain::model::{JobStatus, OcrJob, Transcript};
use crate::domain::ports::Transcriber;
use crate::utils::error::{Result, SaverError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use url::Url;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// Fixed-count, fixed-interval polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl From<&OcrConfig> for PollPolicy {
    fn from(config: &OcrConfig) -> Self {
        Self {
            attempts: config.poll_attempts,
            interval: config.poll_interval(),
        }
    }
}

/// One poll response from the Read API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOperation {
    pub status: Option<String>,
    #[serde(default)]
    pub analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub read_results: Vec<ReadResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadResult {
    #[serde(default)]
    pub lines: Vec<ReadLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadLine {
    #[serde(default)]
    pub text: String,
}

impl ReadOperation {
    /// Page order, then line order; trimmed, blanks dropped.
    pub fn lines(&self) -> Vec<String> {
        self.analyze_result
            .iter()
            .flat_map(|result| result.read_results.iter())
            .flat_map(|page| page.lines.iter())
            .map(|line| line.text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    operation_location: Option<String>,
}

pub struct OcrTranscriber {
    client: Client,
    config: OcrConfig,
}

impl OcrTranscriber {
    pub fn new(config: OcrConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SaverError::ConfigError {
                message: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// Starts an analysis and returns the job to poll.
    pub async fn submit(&self, image_bytes: &[u8]) -> Result<OcrJob> {
        tracing::debug!("Submitting {} bytes for OCR", image_bytes.len());
        let response = self
            .client
            .post(self.config.analyze_url())
            .header(SUBSCRIPTION_KEY_HEADER, self.config.api_key.expose())
            .header(CONTENT_TYPE, "application/octet-stream")
            .timeout(self.config.submit_timeout())
            .body(image_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        let header_location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SaverError::remote_service("OCR analyze service", status, body));
        }

        let location = header_location
            .or_else(|| {
                serde_json::from_str::<SubmitResponse>(&body)
                    .ok()
                    .and_then(|submitted| submitted.operation_location)
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
            })
            .ok_or_else(|| SaverError::Protocol {
                message: "no job handle returned".to_string(),
            })?;

        let operation_location = Url::parse(&location).map_err(|e| SaverError::Protocol {
            message: format!("job handle '{}' is not a valid URL: {}", location, e),
        })?;

        tracing::debug!("OCR job accepted at {}", operation_location);
        Ok(OcrJob::new(operation_location))
    }

    pub async fn poll_once(&self, location: Url) -> Result<ReadOperation> {
        let response = self
            .client
            .get(location)
            .header(SUBSCRIPTION_KEY_HEADER, self.config.api_key.expose())
            .timeout(self.config.poll_timeout())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SaverError::remote_service("OCR result service", status, body));
        }

        match serde_json::from_str(&body) {
            Ok(operation) => Ok(operation),
            Err(e) => Err(SaverError::MalformedResponse {
                message: format!("unexpected OCR poll payload: {}", e),
                raw: body,
            }),
        }
    }
}

#[async_trait]
impl Transcriber for OcrTranscriber {
    async fn transcribe(&self, image_bytes: &[u8]) -> Result<Transcript> {
        if image_bytes.is_empty() {
            return Err(SaverError::ValidationError {
                message: "The receipt file is empty.".to_string(),
            });
        }

        let mut job = self.submit(image_bytes).await?;
        let policy = PollPolicy::from(&self.config);
        let transcript =
            poll_until_terminal(&mut job, policy, |location| self.poll_once(location)).await?;

        tracing::info!(
            "OCR extracted {} lines after {} polls",
            transcript.lines.len(),
            transcript.attempts
        );
        Ok(transcript)
    }
}

/// Polls `job` until it reaches a terminal status or `policy.attempts` polls have been made.
///
/// Sleeps `policy.interval` between polls, never after the last one. A poll error ends the
/// loop immediately.
pub async fn poll_until_terminal<F, Fut>(
    job: &mut OcrJob,
    policy: PollPolicy,
    mut poll: F,
) -> Result<Transcript>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<ReadOperation>>,
{
    for attempt in 1..=policy.attempts {
        let operation = poll(job.operation_location.clone()).await?;
        let status = JobStatus::from_remote(operation.status.as_deref());
        tracing::debug!("OCR poll {}/{}: {:?}", attempt, policy.attempts, status);

        job.record_poll(status, operation.lines());
        match job.status {
            JobStatus::Succeeded => {
                return Ok(Transcript {
                    lines: job.lines.clone(),
                    attempts: attempt,
                })
            }
            JobStatus::Failed => {
                tracing::warn!("OCR job {} reported failure", job.operation_location);
                return Err(SaverError::JobFailed { attempts: attempt });
            }
            JobStatus::Running | JobStatus::TimedOut => {}
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    job.time_out();
    tracing::warn!(
        "OCR job {} still running after {} polls",
        job.operation_location,
        policy.attempts
    );
    Err(SaverError::Timeout {
        attempts: policy.attempts,
    })
}
