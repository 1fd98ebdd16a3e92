use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("The currency code \"{code}\" is incorrect: {reason}")]
    InvalidCurrency { code: String, reason: String },

    #[error("The date \"{value}\" is incorrect")]
    InvalidDate { value: String },

    #[error("The summa \"{value}\" is incorrect")]
    InvalidAmount { value: String },

    #[error("API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API responded with status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    ParseError { endpoint: String, message: String },

    #[error("The rate for currency \"{currency}\" not found")]
    RateNotFound { currency: String },

    #[error("The period from {start} to {end} is empty")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("The period from {start} to {end} is more than {max_days} days")]
    PeriodTooLong {
        start: NaiveDate,
        end: NaiveDate,
        max_days: i64,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chart rendering failed: {message}")]
    ChartError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad input or missing data; the user can fix the call.
    High,
    /// Transient remote failure.
    Medium,
    /// The environment is broken (config, filesystem, renderer).
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ConverterError {
    pub fn invalid_currency(code: impl Into<String>, reason: impl Into<String>) -> Self {
        ConverterError::InvalidCurrency {
            code: code.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ConverterError::ParseError {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConverterError::InvalidCurrency { .. }
            | ConverterError::InvalidDate { .. }
            | ConverterError::InvalidAmount { .. }
            | ConverterError::EmptyRange { .. }
            | ConverterError::PeriodTooLong { .. } => ErrorCategory::Input,
            ConverterError::RequestError(_) | ConverterError::HttpStatus { .. } => {
                ErrorCategory::Network
            }
            ConverterError::ParseError { .. } | ConverterError::RateNotFound { .. } => {
                ErrorCategory::Data
            }
            ConverterError::ConfigError { .. } | ConverterError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
            ConverterError::IoError(_) | ConverterError::ChartError { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConverterError::InvalidCurrency { code, .. } => {
                format!("The currency code \"{}\" is incorrect", code)
            }
            ConverterError::RequestError(e) if e.is_timeout() => {
                "The rate service did not answer in time".to_string()
            }
            ConverterError::RequestError(e) if e.is_connect() => {
                "Could not connect to the rate service".to_string()
            }
            ConverterError::RequestError(_) => "The request to the rate service failed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Use an ISO 4217 alphabetic code (e.g. USD or USD-EUR) and dates as YYYY-MM-DD"
            }
            ErrorCategory::Network => "Check the network connection and try again later",
            ErrorCategory::Data => "Try another date; the bank may not quote this currency on it",
            ErrorCategory::Configuration => "Check the configuration file and CLI options",
            ErrorCategory::System => "Check that the output location is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
