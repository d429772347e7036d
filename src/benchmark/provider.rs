//! Benchmark rate providers: a fixed value and the central bank SGS series

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;

use super::{BenchmarkRateProvider, RateQuote};
use crate::error::RateFetchError;

/// Latest SELIC annualized observation (SGS series 4189)
pub const SELIC_SERIES_URL: &str = "https://api.bcb.gov.br/dados/serie/bcdata.sgs.4189/dados/ultimos/1?formato=json";

/// Date format of SGS observations
const SGS_DATE_FORMAT: &str = "%d/%m/%Y";

/// Always returns the same rate
#[derive(Debug, Clone, Copy)]
pub struct FixedRateProvider {
    annual_pct: f64,
}

impl FixedRateProvider {
    pub fn new(annual_pct: f64) -> Self {
        Self { annual_pct }
    }
}

#[async_trait]
impl BenchmarkRateProvider for FixedRateProvider {
    async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
        Ok(RateQuote {
            annual_pct: self.annual_pct,
            reference_date: None,
        })
    }
}

/// One SGS observation, as published
#[derive(Debug, Deserialize)]
struct SgsObservation {
    data: String,
    valor: String,
}

/// Fetches the current SELIC from the central bank open data API
#[derive(Debug, Clone)]
pub struct BcbSelicProvider {
    client: reqwest::Client,
    url: String,
}

impl BcbSelicProvider {
    pub fn new(request_timeout: Duration) -> Result<Self, RateFetchError> {
        Self::with_url(SELIC_SERIES_URL, request_timeout)
    }

    pub fn with_url(url: impl Into<String>, request_timeout: Duration) -> Result<Self, RateFetchError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl BenchmarkRateProvider for BcbSelicProvider {
    async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
        debug!("fetching benchmark rate from {}", self.url);
        let observations: Vec<SgsObservation> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        latest_quote(&observations)
    }
}

fn latest_quote(observations: &[SgsObservation]) -> Result<RateQuote, RateFetchError> {
    let latest = observations.last().ok_or(RateFetchError::Empty)?;
    Ok(RateQuote {
        annual_pct: parse_rate_value(&latest.valor)?,
        reference_date: NaiveDate::parse_from_str(latest.data.trim(), SGS_DATE_FORMAT).ok(),
    })
}

/// Parse a published rate, normalizing a decimal comma ("10,50" -> 10.5)
pub fn parse_rate_value(raw: &str) -> Result<f64, RateFetchError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RateFetchError::Parse(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_value() {
        assert_eq!(parse_rate_value("10,50").unwrap(), 10.5);
        assert_eq!(parse_rate_value(" 14.9 ").unwrap(), 14.9);
        assert!(matches!(parse_rate_value("n/d"), Err(RateFetchError::Parse(_))));
    }

    #[test]
    fn test_latest_quote_from_payload() {
        let payload = r#"[{"data":"16/10/2026","valor":"14,90"}]"#;
        let observations: Vec<SgsObservation> = serde_json::from_str(payload).unwrap();
        let quote = latest_quote(&observations).unwrap();

        assert_eq!(quote.annual_pct, 14.9);
        assert_eq!(quote.reference_date, NaiveDate::from_ymd_opt(2026, 10, 16));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(latest_quote(&[]), Err(RateFetchError::Empty)));
    }

    #[test]
    fn test_unparseable_date_is_tolerated() {
        let observations = vec![SgsObservation {
            data: "2026-10-16".to_string(),
            valor: "15".to_string(),
        }];
        let quote = latest_quote(&observations).unwrap();
        assert_eq!(quote.annual_pct, 15.0);
        assert_eq!(quote.reference_date, None);
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let quote = FixedRateProvider::new(11.0).fetch_current_rate().await.unwrap();
        assert_eq!(quote.annual_pct, 11.0);
    }
}
