use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::{
    normalize_currency_code, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.nbrb.by/exrates";
pub const DEFAULT_BASE_CURRENCY: &str = "BYN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub api: ApiConfig,
    pub conversion: ConversionConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 2,
            timeout_secs: 5,
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub base_currency: String,
    pub decimal_places: u32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            decimal_places: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Period length used when only the end date is given.
    pub default_days: i64,
    pub max_period_days: i64,
    /// Draw caption and axis labels. Needs system fonts.
    pub labels: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("rate_dynamics.png"),
            width: 1024,
            height: 640,
            default_days: 30,
            max_period_days: 365,
            labels: true,
        }
    }
}

impl ConverterConfig {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConverterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConverterError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` placeholders with environment values, e.g. `${NBRB_API_URL}`.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConverterError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for ConverterConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_range("api.connect_timeout_secs", self.api.connect_timeout_secs, 1, 300)?;
        validate_range("api.timeout_secs", self.api.timeout_secs, 1, 300)?;

        let base = normalize_currency_code(&self.conversion.base_currency).map_err(|_| {
            ConverterError::InvalidConfigValue {
                field: "conversion.base_currency".to_string(),
                value: self.conversion.base_currency.clone(),
                reason: "expected an ISO 4217 alphabetic code".to_string(),
            }
        })?;
        // every official rate is quoted in rubles
        if base != DEFAULT_BASE_CURRENCY {
            return Err(ConverterError::InvalidConfigValue {
                field: "conversion.base_currency".to_string(),
                value: self.conversion.base_currency.clone(),
                reason: format!("the bank only quotes rates in {}", DEFAULT_BASE_CURRENCY),
            });
        }
        // rust_decimal keeps at most 28 fractional digits
        validate_range("conversion.decimal_places", self.conversion.decimal_places, 0, 28)?;

        validate_path(
            "plot.output_path",
            &self.plot.output_path.to_string_lossy(),
        )?;
        validate_range("plot.width", self.plot.width, 200, 8192)?;
        validate_range("plot.height", self.plot.height, 200, 8192)?;
        validate_range("plot.max_period_days", self.plot.max_period_days, 1, 3660)?;
        validate_range(
            "plot.default_days",
            self.plot.default_days,
            0,
            self.plot.max_period_days,
        )?;

        Ok(())
    }
}

impl ConfigProvider for ConverterConfig {
    fn base_currency(&self) -> &str {
        &self.conversion.base_currency
    }

    fn decimal_places(&self) -> u32 {
        self.conversion.decimal_places
    }

    fn max_period_days(&self) -> i64 {
        self.plot.max_period_days
    }
}
