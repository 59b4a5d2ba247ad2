use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaverError {
    #[error("{service} returned HTTP {status}")]
    RemoteService {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, raw: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("OCR job did not finish after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("OCR job failed after {attempts} polls")]
    JobFailed { attempts: u32 },

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    RemoteService,
    Data,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<reqwest::Error> for SaverError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("could not connect: {}", err)
        } else {
            err.to_string()
        };
        SaverError::Unexpected { message }
    }
}

impl SaverError {
    /// Builds a `RemoteService` error, pretty-printing the body when it is JSON.
    pub fn remote_service(
        service: impl Into<String>,
        status: reqwest::StatusCode,
        body: String,
    ) -> Self {
        let body = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or(body);

        SaverError::RemoteService {
            service: service.into(),
            status: status.as_u16(),
            body,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SaverError::RemoteService { .. } | SaverError::JobFailed { .. } => {
                ErrorCategory::RemoteService
            }
            SaverError::MalformedResponse { .. } | SaverError::Protocol { .. } => {
                ErrorCategory::Data
            }
            SaverError::Timeout { .. } | SaverError::Unexpected { .. } => ErrorCategory::Network,
            SaverError::IoError(_) => ErrorCategory::System,
            SaverError::ConfigError { .. }
            | SaverError::MissingConfigError { .. }
            | SaverError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SaverError::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SaverError::RemoteService { .. }
            | SaverError::Timeout { .. }
            | SaverError::Unexpected { .. } => ErrorSeverity::Medium,
            SaverError::MalformedResponse { .. }
            | SaverError::Protocol { .. }
            | SaverError::JobFailed { .. }
            | SaverError::ConfigError { .. }
            | SaverError::MissingConfigError { .. }
            | SaverError::InvalidConfigValueError { .. }
            | SaverError::ValidationError { .. } => ErrorSeverity::High,
            SaverError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Raw remote text kept for manual inspection.
    pub fn raw_content(&self) -> Option<&str> {
        match self {
            SaverError::MalformedResponse { raw, .. } => Some(raw.as_str()),
            SaverError::RemoteService { body, .. } if !body.trim().is_empty() => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SaverError::RemoteService {
                service, status, ..
            } => format!("{} rejected the request (HTTP {}).", service, status),
            SaverError::MalformedResponse { .. } => {
                "The AI did not return valid JSON. Showing raw content below.".to_string()
            }
            SaverError::Protocol { message } => format!("OCR did not behave as expected: {}.", message),
            SaverError::Timeout { .. } => "OCR timed out while reading the receipt.".to_string(),
            SaverError::JobFailed { .. } => "OCR failed to process the receipt.".to_string(),
            SaverError::Unexpected { message } => {
                format!("Unexpected error talking to a remote service: {}", message)
            }
            SaverError::IoError(e) => format!("Could not read input: {}", e),
            SaverError::ConfigError { message } => format!("Configuration problem: {}", message),
            SaverError::MissingConfigError { field } => {
                format!("Missing required setting '{}'.", field)
            }
            SaverError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            SaverError::ValidationError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::RemoteService => {
                "Check the API key, deployment name and endpoint, then try again"
            }
            ErrorCategory::Data => "Try again; the service occasionally returns unusable output",
            ErrorCategory::Network => "Check your network connection and retry",
            ErrorCategory::Configuration => {
                "Set the AZURE_* environment variables or pass --config with a valid TOML file"
            }
            ErrorCategory::Input => "Check the input text or file and try again",
            ErrorCategory::System => "Check that the file exists and is readable",
        }
    }
}

pub type Result<T> = std::result::Result<T, SaverError>;
