//! Benchmark (SELIC) rate used to value the capital alternative
//!
//! The rate is resolved once per run and threaded by value into the
//! computation. Any fetch failure or timeout resolves to the configured
//! default and is recorded in the returned [`BenchmarkRate`].

mod cache;
mod provider;

pub use cache::CachedRateProvider;
pub use provider::{parse_rate_value, BcbSelicProvider, FixedRateProvider, SELIC_SERIES_URL};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::RateFetchError;

/// A single observation from a rate source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Annual rate in percent (10.5 for 10.5%)
    pub annual_pct: f64,
    pub reference_date: Option<NaiveDate>,
}

/// Source of the benchmark current rate
#[async_trait]
pub trait BenchmarkRateProvider: Send + Sync {
    async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError>;
}

#[async_trait]
impl<P: BenchmarkRateProvider + ?Sized> BenchmarkRateProvider for Arc<P> {
    async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
        (**self).fetch_current_rate().await
    }
}

/// Where the rate used by a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Fetched,
    /// Fetch failed; configured default substituted
    Fallback,
    /// Given directly by the caller
    Supplied,
}

/// The benchmark rate actually used in a run's math
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRate {
    pub annual_pct: f64,
    pub source: RateSource,
    pub reference_date: Option<NaiveDate>,
}

impl BenchmarkRate {
    pub fn supplied(annual_pct: f64) -> Self {
        Self {
            annual_pct,
            source: RateSource::Supplied,
            reference_date: None,
        }
    }

    pub fn fallback(default_pct: f64) -> Self {
        Self {
            annual_pct: default_pct,
            source: RateSource::Fallback,
            reference_date: None,
        }
    }

    pub fn fetched(quote: RateQuote) -> Self {
        Self {
            annual_pct: quote.annual_pct,
            source: RateSource::Fetched,
            reference_date: quote.reference_date,
        }
    }

    /// Presentation should disclose that the live rate was unavailable
    pub fn used_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

/// Fetch the current rate within `timeout`, substituting `default_pct` on any failure
pub async fn resolve_benchmark<P>(provider: &P, timeout: Duration, default_pct: f64) -> BenchmarkRate
where
    P: BenchmarkRateProvider + ?Sized,
{
    let outcome = match tokio::time::timeout(timeout, provider.fetch_current_rate()).await {
        Ok(result) => result,
        Err(_) => Err(RateFetchError::Timeout(timeout)),
    };

    match outcome {
        Ok(quote) if quote.annual_pct.is_finite() => {
            info!("benchmark rate fetched: {}% a.a.", quote.annual_pct);
            BenchmarkRate::fetched(quote)
        }
        Ok(quote) => {
            warn!(
                "benchmark source returned non-finite rate {}, using default {}%",
                quote.annual_pct, default_pct
            );
            BenchmarkRate::fallback(default_pct)
        }
        Err(err) => {
            warn!("benchmark rate unavailable ({}), using default {}%", err, default_pct);
            BenchmarkRate::fallback(default_pct)
        }
    }
}

/// Like [`resolve_benchmark`], for a provider whose construction may have failed
pub async fn resolve_benchmark_from<P>(
    provider: &Result<P, RateFetchError>,
    timeout: Duration,
    default_pct: f64,
) -> BenchmarkRate
where
    P: BenchmarkRateProvider,
{
    match provider {
        Ok(provider) => resolve_benchmark(provider, timeout, default_pct).await,
        Err(err) => {
            warn!("benchmark provider unavailable ({}), using default {}%", err, default_pct);
            BenchmarkRate::fallback(default_pct)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl BenchmarkRateProvider for FailingProvider {
        async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
            Err(RateFetchError::Empty)
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl BenchmarkRateProvider for SlowProvider {
        async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(RateQuote {
                annual_pct: 99.0,
                reference_date: None,
            })
        }
    }

    #[tokio::test]
    async fn test_fetched_rate_used() {
        let provider = FixedRateProvider::new(14.25);
        let rate = resolve_benchmark(&provider, Duration::from_secs(1), 10.5).await;
        assert_eq!(rate.annual_pct, 14.25);
        assert_eq!(rate.source, RateSource::Fetched);
        assert!(!rate.used_fallback());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_default() {
        let rate = resolve_benchmark(&FailingProvider, Duration::from_secs(1), 10.5).await;
        assert_eq!(rate.annual_pct, 10.5);
        assert!(rate.used_fallback());
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_default() {
        let rate = resolve_benchmark(&SlowProvider, Duration::from_millis(20), 10.5).await;
        assert_eq!(rate.annual_pct, 10.5);
        assert!(rate.used_fallback());
    }

    #[tokio::test]
    async fn test_non_finite_quote_rejected() {
        let provider = FixedRateProvider::new(f64::NAN);
        let rate = resolve_benchmark(&provider, Duration::from_secs(1), 10.5).await;
        assert!(rate.used_fallback());
    }

    #[tokio::test]
    async fn test_unbuilt_provider_falls_back_to_default() {
        let provider: Result<FixedRateProvider, RateFetchError> = Err(RateFetchError::Empty);
        let rate = resolve_benchmark_from(&provider, Duration::from_secs(1), 10.5).await;
        assert_eq!(rate.annual_pct, 10.5);
        assert_eq!(rate.source, RateSource::Fallback);

        let provider: Result<FixedRateProvider, RateFetchError> = Ok(FixedRateProvider::new(13.0));
        let rate = resolve_benchmark_from(&provider, Duration::from_secs(1), 10.5).await;
        assert_eq!(rate.source, RateSource::Fetched);
    }

    #[tokio::test]
    async fn test_shared_provider() {
        let provider: Arc<dyn BenchmarkRateProvider> = Arc::new(FixedRateProvider::new(12.0));
        let rate = resolve_benchmark(&provider, Duration::from_secs(1), 10.5).await;
        assert_eq!(rate.annual_pct, 12.0);
    }
}
