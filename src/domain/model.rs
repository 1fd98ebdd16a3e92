use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::normalize_currency_code;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Price of `scale` units of `currency` in the base currency on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub currency: String,
    pub date: Option<NaiveDate>,
    pub scale: Decimal,
    pub rate: Decimal,
}

impl Rate {
    /// The base currency is quoted against itself one to one.
    pub fn unit(currency: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            currency: currency.into(),
            date,
            scale: Decimal::ONE,
            rate: Decimal::ONE,
        }
    }

    pub fn as_pair(&self) -> (Decimal, Decimal) {
        (self.scale, self.rate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
    pub date: Option<NaiveDate>,
}

/// "USD" converts into the base currency, "USD-EUR" converts USD into EUR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn parse(value: &str, base_currency: &str) -> Result<Self> {
        let mut parts = value.split('-');
        let from = parts.next().unwrap_or_default();
        let to = parts.next();

        if parts.next().is_some() {
            return Err(ConverterError::invalid_currency(
                value,
                "use CODE or FROM-TO",
            ));
        }

        Ok(Self {
            from: normalize_currency_code(from)?,
            to: normalize_currency_code(to.unwrap_or(base_currency))?,
        })
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A catalogue entry. The bank assigns a new id whenever a currency changes
/// its scale or is redenominated, so one code may have several entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub id: u32,
    pub code: String,
    pub scale: Decimal,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}

impl CurrencyInfo {
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date_start <= end && start <= self.date_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Chronologically ordered rates of one currency, all quoted per `scale` units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub currency: String,
    pub base_currency: String,
    pub scale: Decimal,
    pub points: Vec<RatePoint>,
}

impl PlotSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn min_rate(&self) -> Option<Decimal> {
        self.points.iter().map(|p| p.rate).min()
    }

    pub fn max_rate(&self) -> Option<Decimal> {
        self.points.iter().map(|p| p.rate).max()
    }
}
