use crate::domain::model::{CurrencyInfo, PlotSeries, Rate, RatePoint};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

pub trait ConfigProvider: Send + Sync {
    fn base_currency(&self) -> &str;
    fn decimal_places(&self) -> u32;
    fn max_period_days(&self) -> i64;
}

/// Source of quoted rates. All quotes are expressed in the base currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Rate on `date`, or today's rate when `date` is `None`.
    async fn fetch_rate(&self, code: &str, date: Option<NaiveDate>) -> Result<Rate>;
    async fn fetch_currencies(&self) -> Result<Vec<CurrencyInfo>>;
    /// Daily rates of one catalogue entry, inclusive on both ends.
    async fn fetch_dynamics(
        &self,
        currency_id: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>>;
}

pub trait ChartRenderer: Send + Sync {
    /// Renders the series and returns where the chart was written.
    fn render(&self, series: &PlotSeries) -> Result<PathBuf>;
}
