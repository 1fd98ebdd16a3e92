use crate::core::{ChartRenderer, ConfigProvider, PlotSeries, Rate, RatePoint, RateProvider};
use crate::domain::model::ConversionRequest;
use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::{normalize_currency_code, validate_period};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Converts amounts through the base currency using the quotes of a
/// [`RateProvider`]. Every call is independent; nothing is cached.
pub struct Converter<P: RateProvider, C: ConfigProvider, R: ChartRenderer> {
    provider: P,
    config: C,
    renderer: R,
}

impl<P: RateProvider, C: ConfigProvider, R: ChartRenderer> Converter<P, C, R> {
    pub fn new(provider: P, config: C, renderer: R) -> Self {
        Self {
            provider,
            config,
            renderer,
        }
    }

    pub fn base_currency(&self) -> &str {
        self.config.base_currency()
    }

    fn is_base(&self, code: &str) -> bool {
        code.eq_ignore_ascii_case(self.config.base_currency())
    }

    /// Returns the `(scale, rate)` quote of `currency` on `date` (today when `None`).
    pub async fn get_rate(&self, currency: &str, date: Option<NaiveDate>) -> Result<Rate> {
        let code = normalize_currency_code(currency)?;
        if self.is_base(&code) {
            return Ok(Rate::unit(code, date));
        }

        let rate = self.provider.fetch_rate(&code, date).await?;
        tracing::info!(
            "Rate of {} on {}: {} per {}",
            code,
            rate.date.map_or_else(|| "today".to_string(), |d| d.to_string()),
            rate.rate,
            rate.scale
        );
        Ok(rate)
    }

    /// Converts `amount` from one currency into another, pivoting through the
    /// base currency. The result is rounded to the configured decimal places.
    pub async fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: Option<NaiveDate>,
    ) -> Result<Decimal> {
        let from = normalize_currency_code(from_currency)?;
        let to = normalize_currency_code(to_currency)?;

        if from == to {
            return Ok(amount);
        }

        // at most two sequential lookups; the base currency needs none
        let from_rate = self.get_rate(&from, date).await?;
        let to_rate = self.get_rate(&to, date).await?;

        let converted = amount
            .checked_div(from_rate.scale)
            .and_then(|v| v.checked_mul(from_rate.rate))
            .and_then(|v| v.checked_div(to_rate.rate))
            .and_then(|v| v.checked_mul(to_rate.scale))
            .ok_or_else(|| ConverterError::InvalidAmount {
                value: amount.to_string(),
            })?;

        Ok(converted.round_dp_with_strategy(
            self.config.decimal_places(),
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    pub async fn convert_request(&self, request: &ConversionRequest) -> Result<Decimal> {
        self.convert(
            request.amount,
            &request.from_currency,
            &request.to_currency,
            request.date,
        )
        .await
    }

    /// Daily rates of `currency` between `start` and `end` inclusive, all
    /// normalised to the scale the currency is quoted in most recently.
    pub async fn get_rate_dynamics(
        &self,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PlotSeries> {
        let code = normalize_currency_code(currency)?;
        validate_period(start, end, self.config.max_period_days())?;

        if self.is_base(&code) {
            return Err(ConverterError::invalid_currency(
                code,
                "the base currency has no rate history",
            ));
        }

        let mut entries: Vec<_> = self
            .provider
            .fetch_currencies()
            .await?
            .into_iter()
            .filter(|c| c.code == code && c.overlaps(start, end))
            .collect();

        if entries.is_empty() {
            return Err(ConverterError::invalid_currency(
                code,
                format!("not quoted between {} and {}", start, end),
            ));
        }

        entries.sort_by_key(|c| (c.date_start, c.date_end));
        let scale = entries[entries.len() - 1].scale;

        let mut rates: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for entry in &entries {
            let period_start = start.max(entry.date_start);
            let period_end = end.min(entry.date_end);
            let points = self
                .provider
                .fetch_dynamics(entry.id, period_start, period_end)
                .await?;

            tracing::debug!(
                "Currency id {} quoted per {}: {} rates",
                entry.id,
                entry.scale,
                points.len()
            );
            for point in points {
                let rate = point
                    .rate
                    .checked_mul(scale)
                    .and_then(|v| v.checked_div(entry.scale))
                    .ok_or_else(|| {
                        ConverterError::parse(
                            "rates/dynamics",
                            format!("rate {} out of range on {}", point.rate, point.date),
                        )
                    })?;
                rates.insert(point.date, rate);
            }
        }

        if rates.is_empty() {
            return Err(ConverterError::RateNotFound { currency: code });
        }

        Ok(PlotSeries {
            currency: code,
            base_currency: self.config.base_currency().to_ascii_uppercase(),
            scale,
            points: rates
                .into_iter()
                .map(|(date, rate)| RatePoint { date, rate })
                .collect(),
        })
    }

    /// Renders the rate history of `currency` and returns where the chart went.
    pub async fn make_plot(
        &self,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf> {
        let series = self.get_rate_dynamics(currency, start, end).await?;
        let path = self.renderer.render(&series)?;
        tracing::info!(
            "Rendered {} rates of {} to {}",
            series.len(),
            series.currency,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::domain::model::CurrencyInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProvider {
        rates: HashMap<String, (Decimal, Decimal)>,
        currencies: Vec<CurrencyInfo>,
        dynamics: HashMap<u32, Vec<RatePoint>>,
        requests: AtomicUsize,
    }

    impl FakeProvider {
        fn with_rate(mut self, code: &str, scale: i64, rate: Decimal) -> Self {
            self.rates
                .insert(code.to_string(), (Decimal::new(scale, 0), rate));
            self
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for FakeProvider {
        async fn fetch_rate(&self, code: &str, date: Option<NaiveDate>) -> Result<Rate> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let (scale, rate) = self
                .rates
                .get(code)
                .copied()
                .ok_or_else(|| ConverterError::invalid_currency(code, "unknown"))?;
            Ok(Rate {
                currency: code.to_string(),
                date,
                scale,
                rate,
            })
        }

        async fn fetch_currencies(&self) -> Result<Vec<CurrencyInfo>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.currencies.clone())
        }

        async fn fetch_dynamics(
            &self,
            currency_id: u32,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<RatePoint>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .dynamics
                .get(&currency_id)
                .map(|points| {
                    points
                        .iter()
                        .filter(|p| p.date >= start && p.date <= end)
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Mutex<Vec<PlotSeries>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&self, series: &PlotSeries) -> Result<PathBuf> {
            if let Ok(mut rendered) = self.rendered.lock() {
                rendered.push(series.clone());
            }
            Ok(PathBuf::from("chart.png"))
        }
    }

    fn converter(provider: FakeProvider) -> Converter<FakeProvider, ConverterConfig, RecordingRenderer> {
        Converter::new(
            provider,
            ConverterConfig::default(),
            RecordingRenderer::default(),
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn test_identity_conversion_needs_no_request() {
        let converter = converter(FakeProvider::default());
        let amount = dec("123.456789");
        let result = converter
            .convert(amount, "usd", "USD", Some(day(2022, 2, 14)))
            .await
            .unwrap();
        assert_eq!(result, amount);
        assert_eq!(converter.provider.requests(), 0);
    }

    #[tokio::test]
    async fn test_base_currency_rate_is_unit() {
        let converter = converter(FakeProvider::default());
        let rate = converter.get_rate("byn", None).await.unwrap();
        assert_eq!(rate.as_pair(), (Decimal::ONE, Decimal::ONE));
        assert_eq!(converter.provider.requests(), 0);
    }

    #[tokio::test]
    async fn test_convert_into_base_currency() {
        let provider = FakeProvider::default().with_rate("USD", 10, dec("2"));
        let converter = converter(provider);
        let result = converter
            .convert(dec("100"), "usd", "byn", None)
            .await
            .unwrap();
        assert_eq!(result, dec("20"));
        assert_eq!(converter.provider.requests(), 1);
    }

    #[tokio::test]
    async fn test_convert_from_base_currency() {
        let provider = FakeProvider::default().with_rate("USD", 1, dec("2"));
        let converter = converter(provider);
        let result = converter
            .convert(dec("100"), "byn", "usd", None)
            .await
            .unwrap();
        assert_eq!(result, dec("50"));
    }

    #[tokio::test]
    async fn test_cross_conversion_pivots_through_base() {
        let provider = FakeProvider::default()
            .with_rate("EUR", 1, dec("2.9288"))
            .with_rate("USD", 1, dec("2.5749"));
        let converter = converter(provider);
        let result = converter
            .convert(dec("100"), "EUR", "USD", Some(day(2022, 2, 14)))
            .await
            .unwrap();
        // 292.88 / 2.5749 = 113.74422...
        assert_eq!(result, dec("113.7442"));
        assert_eq!(converter.provider.requests(), 2);
    }

    #[tokio::test]
    async fn test_cross_conversion_respects_scales() {
        let provider = FakeProvider::default()
            .with_rate("RUB", 100, dec("3.3551"))
            .with_rate("JPY", 100, dec("2.2"));
        let converter = converter(provider);
        let result = converter
            .convert(dec("1000"), "RUB", "JPY", None)
            .await
            .unwrap();
        // 1000 RUB = 33.551 BYN = 1525.0454... JPY
        assert_eq!(result, dec("1525.0455"));
    }

    #[tokio::test]
    async fn test_overflowing_amount_is_invalid_amount() {
        let provider = FakeProvider::default().with_rate("RUB", 100, dec("3.3551"));
        let converter = converter(provider);
        assert!(matches!(
            converter.convert(Decimal::MAX, "BYN", "RUB", None).await,
            Err(ConverterError::InvalidAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_currency_is_invalid_currency() {
        let converter = converter(FakeProvider::default());
        assert!(matches!(
            converter.get_rate("XYZ", None).await,
            Err(ConverterError::InvalidCurrency { .. })
        ));
        assert!(matches!(
            converter.convert(dec("1"), "US1", "BYN", None).await,
            Err(ConverterError::InvalidCurrency { .. })
        ));
    }

    fn redenominated_rub() -> FakeProvider {
        let mut provider = FakeProvider::default();
        provider.currencies = vec![
            CurrencyInfo {
                id: 190,
                code: "RUB".to_string(),
                scale: Decimal::ONE,
                date_start: day(2016, 7, 1),
                date_end: day(2021, 7, 8),
            },
            CurrencyInfo {
                id: 298,
                code: "RUB".to_string(),
                scale: Decimal::new(100, 0),
                date_start: day(2021, 7, 9),
                date_end: day(2050, 1, 1),
            },
            CurrencyInfo {
                id: 145,
                code: "USD".to_string(),
                scale: Decimal::ONE,
                date_start: day(2016, 7, 1),
                date_end: day(2050, 1, 1),
            },
        ];
        provider.dynamics.insert(
            190,
            vec![
                RatePoint { date: day(2021, 7, 7), rate: dec("0.034") },
                RatePoint { date: day(2021, 7, 8), rate: dec("0.0341") },
            ],
        );
        provider.dynamics.insert(
            298,
            vec![
                RatePoint { date: day(2021, 7, 10), rate: dec("3.42") },
                RatePoint { date: day(2021, 7, 9), rate: dec("3.41") },
            ],
        );
        provider
    }

    #[tokio::test]
    async fn test_dynamics_normalises_to_latest_scale() {
        let converter = converter(redenominated_rub());
        let series = converter
            .get_rate_dynamics("rub", day(2021, 7, 7), day(2021, 7, 10))
            .await
            .unwrap();

        assert_eq!(series.scale, Decimal::new(100, 0));
        let dates: Vec<_> = series.points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![day(2021, 7, 7), day(2021, 7, 8), day(2021, 7, 9), day(2021, 7, 10)]
        );
        assert_eq!(series.points[0].rate, dec("3.4"));
        assert_eq!(series.points[1].rate, dec("3.41"));
        // one catalogue request plus one dynamics request per entry
        assert_eq!(converter.provider.requests(), 3);
    }

    #[tokio::test]
    async fn test_dynamics_rejects_long_and_reversed_periods() {
        let converter = converter(redenominated_rub());
        assert!(matches!(
            converter
                .get_rate_dynamics("RUB", day(2020, 2, 1), day(2022, 2, 1))
                .await,
            Err(ConverterError::PeriodTooLong { .. })
        ));
        assert!(matches!(
            converter
                .get_rate_dynamics("RUB", day(2022, 2, 14), day(2022, 2, 1))
                .await,
            Err(ConverterError::EmptyRange { .. })
        ));
        assert_eq!(converter.provider.requests(), 0);
    }

    #[tokio::test]
    async fn test_dynamics_unknown_or_base_currency() {
        let converter = converter(redenominated_rub());
        assert!(matches!(
            converter
                .get_rate_dynamics("EUR", day(2022, 2, 1), day(2022, 2, 14))
                .await,
            Err(ConverterError::InvalidCurrency { .. })
        ));
        assert!(matches!(
            converter
                .get_rate_dynamics("BYN", day(2022, 2, 1), day(2022, 2, 14))
                .await,
            Err(ConverterError::InvalidCurrency { .. })
        ));
    }

    #[tokio::test]
    async fn test_dynamics_without_rates() {
        let converter = converter(redenominated_rub());
        assert!(matches!(
            converter
                .get_rate_dynamics("USD", day(2022, 2, 1), day(2022, 2, 14))
                .await,
            Err(ConverterError::RateNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_make_plot_renders_series() {
        let converter = converter(redenominated_rub());
        let path = converter
            .make_plot("RUB", day(2021, 7, 9), day(2021, 7, 10))
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("chart.png"));

        let rendered = converter.renderer.rendered.lock().unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].len(), 2);
    }

    #[tokio::test]
    async fn test_make_plot_empty_range_renders_nothing() {
        let converter = converter(redenominated_rub());
        assert!(matches!(
            converter
                .make_plot("RUB", day(2021, 7, 10), day(2021, 7, 9))
                .await,
            Err(ConverterError::EmptyRange { .. })
        ));
        assert!(converter.renderer.rendered.lock().unwrap().is_empty());
    }
}
