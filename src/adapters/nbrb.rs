use crate::config::toml_config::ApiConfig;
use crate::domain::model::{CurrencyInfo, Rate, RatePoint};
use crate::domain::ports::RateProvider;
use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::DATE_FORMAT;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `parammode=2` makes the bank look a currency up by its ISO alphabetic code.
const PARAM_MODE_ISO_CODE: &str = "2";

#[derive(Debug, Deserialize)]
struct RateDto {
    #[serde(rename = "Cur_Abbreviation")]
    abbreviation: Option<String>,
    #[serde(rename = "Date")]
    date: Option<NaiveDateTime>,
    #[serde(rename = "Cur_Scale")]
    scale: Option<Decimal>,
    #[serde(rename = "Cur_OfficialRate")]
    official_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CurrencyDto {
    #[serde(rename = "Cur_ID")]
    id: u32,
    #[serde(rename = "Cur_Abbreviation", default)]
    abbreviation: String,
    #[serde(rename = "Cur_Scale")]
    scale: Option<Decimal>,
    #[serde(rename = "Cur_DateStart")]
    date_start: Option<NaiveDateTime>,
    #[serde(rename = "Cur_DateEnd")]
    date_end: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
struct DynamicsDto {
    #[serde(rename = "Date")]
    date: NaiveDateTime,
    #[serde(rename = "Cur_OfficialRate")]
    official_rate: Option<Decimal>,
}

/// Client for the exchange-rate API of the National Bank of the Republic of Belarus.
#[derive(Debug, Clone)]
pub struct NbrbClient {
    client: Client,
    base_url: String,
}

impl NbrbClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        tracing::debug!("Making API request to: {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        tracing::debug!("API response status: {}", response.status());
        Ok(response)
    }

    fn ensure_success(response: &Response, url: &str) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ConverterError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ConverterError::parse(url, e.to_string()))
    }

    fn format_date(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }
}

#[async_trait]
impl RateProvider for NbrbClient {
    async fn fetch_rate(&self, code: &str, date: Option<NaiveDate>) -> Result<Rate> {
        let url = self.endpoint(&format!("rates/{}", code));
        let mut query = vec![("parammode", PARAM_MODE_ISO_CODE.to_string())];
        if let Some(date) = date {
            query.push(("ondate", Self::format_date(date)));
        }

        let response = self.get(&url, &query).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ConverterError::invalid_currency(
                code,
                "unknown to the rate service",
            ));
        }
        Self::ensure_success(&response, &url)?;

        let json: serde_json::Value = Self::read_json(response, &url).await?;
        let is_empty = match &json {
            serde_json::Value::Null => true,
            serde_json::Value::Object(obj) => obj.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(ConverterError::RateNotFound {
                currency: code.to_string(),
            });
        }

        let dto: RateDto =
            serde_json::from_value(json).map_err(|e| ConverterError::parse(&url, e.to_string()))?;
        let rate = dto.official_rate.ok_or_else(|| ConverterError::RateNotFound {
            currency: code.to_string(),
        })?;
        let scale = dto.scale.unwrap_or(Decimal::ONE);

        if rate <= Decimal::ZERO || scale <= Decimal::ZERO {
            return Err(ConverterError::parse(
                &url,
                format!("non-positive quote: {} per {}", rate, scale),
            ));
        }

        Ok(Rate {
            currency: dto.abbreviation.unwrap_or_else(|| code.to_string()),
            date: dto.date.map(|d| d.date()).or(date),
            scale,
            rate,
        })
    }

    async fn fetch_currencies(&self) -> Result<Vec<CurrencyInfo>> {
        let url = self.endpoint("currencies");
        let response = self.get(&url, &[]).await?;
        Self::ensure_success(&response, &url)?;

        let entries: Vec<CurrencyDto> = Self::read_json(response, &url).await?;
        let total = entries.len();

        // entries without a validity window cannot be matched to a period
        let currencies: Vec<CurrencyInfo> = entries
            .into_iter()
            .filter_map(|dto| {
                Some(CurrencyInfo {
                    id: dto.id,
                    code: dto.abbreviation.to_ascii_uppercase(),
                    scale: dto.scale.filter(|s| *s > Decimal::ZERO).unwrap_or(Decimal::ONE),
                    date_start: dto.date_start?.date(),
                    date_end: dto.date_end?.date(),
                })
            })
            .collect();

        tracing::debug!("Loaded {} of {} catalogue entries", currencies.len(), total);
        Ok(currencies)
    }

    async fn fetch_dynamics(
        &self,
        currency_id: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>> {
        let url = self.endpoint(&format!("rates/dynamics/{}", currency_id));
        let query = [
            ("startdate", Self::format_date(start)),
            ("enddate", Self::format_date(end)),
        ];

        let response = self.get(&url, &query).await?;
        Self::ensure_success(&response, &url)?;

        let entries: Vec<DynamicsDto> = Self::read_json(response, &url).await?;
        Ok(entries
            .into_iter()
            .filter_map(|dto| {
                Some(RatePoint {
                    date: dto.date.date(),
                    rate: dto.official_rate?,
                })
            })
            .collect())
    }
}
