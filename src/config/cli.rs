use super::ConverterConfig;
use crate::domain::model::{ConversionRequest, CurrencyPair};
use crate::utils::error::Result;
use crate::utils::validation::{normalize_currency_code, parse_amount, parse_date, Validate};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "converter", version)]
#[command(about = "Command-line currency converter using the rates of the National Bank of the Republic of Belarus")]
pub struct CliConfig {
    /// The summa to convert (default 1) followed by the ISO 4217 currency code;
    /// use "FROM-TO" to set a target currency other than the base one
    #[arg(value_name = "[SUMMA] CURRENCY", num_args = 1..=2, required = true)]
    pub operands: Vec<String>,

    /// The date for the rate (YYYY-MM-DD), or the end of the period for --plot
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// The first day of the period for --plot (default: DATE minus plot.default_days)
    #[arg(long, value_name = "DATE", requires = "plot")]
    pub start: Option<String>,

    /// Print the rate on the date
    #[arg(long, conflicts_with = "plot")]
    pub rate: bool,

    /// Write a PNG chart of the rate dynamics for the period (see --output)
    #[arg(long)]
    pub plot: bool,

    /// TOML settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to write the chart (overrides plot.output_path)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

/// What the user asked for, with every argument parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Rate {
        currency: String,
        date: Option<NaiveDate>,
    },
    Convert(ConversionRequest),
    Plot {
        currency: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl CliConfig {
    pub fn currency(&self) -> &str {
        self.operands.last().map(String::as_str).unwrap_or_default()
    }

    pub fn summa(&self) -> Result<Decimal> {
        match self.operands.as_slice() {
            [summa, _] => parse_amount(summa),
            _ => Ok(Decimal::ONE),
        }
    }

    fn date(&self) -> Result<Option<NaiveDate>> {
        self.date.as_deref().map(parse_date).transpose()
    }

    fn start(&self) -> Result<Option<NaiveDate>> {
        self.start.as_deref().map(parse_date).transpose()
    }

    pub fn command(&self, config: &ConverterConfig, today: NaiveDate) -> Result<Command> {
        if self.plot {
            let currency = normalize_currency_code(self.currency())?;
            let end = self.date()?.unwrap_or(today);
            let start = match self.start()? {
                Some(start) => start,
                None => end - Duration::days(config.plot.default_days),
            };
            return Ok(Command::Plot {
                currency,
                start,
                end,
            });
        }

        if self.rate {
            return Ok(Command::Rate {
                currency: normalize_currency_code(self.currency())?,
                date: self.date()?,
            });
        }

        let pair = CurrencyPair::parse(self.currency(), &config.conversion.base_currency)?;
        Ok(Command::Convert(ConversionRequest {
            amount: self.summa()?,
            from_currency: pair.from,
            to_currency: pair.to,
            date: self.date()?,
        }))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.summa()?;
        self.date()?;
        self.start()?;
        if let Some(output) = &self.output {
            crate::utils::validation::validate_path("--output", &output.to_string_lossy())?;
        }
        Ok(())
    }
}
