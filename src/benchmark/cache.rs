//! Time-bounded cache in front of a rate provider
//!
//! The slot is only written after a fetch completes successfully, so a run
//! cancelled mid-fetch leaves the previous value intact.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;

use super::{BenchmarkRateProvider, RateQuote};
use crate::error::RateFetchError;

/// Cached quote with the instant it was stored
#[derive(Debug, Clone)]
struct CachedQuote {
    quote: RateQuote,
    stored_at: Instant,
}

/// Serves the last successful quote while it is younger than `ttl`
#[derive(Debug)]
pub struct CachedRateProvider<P> {
    inner: P,
    ttl: Duration,
    slot: Mutex<Option<CachedQuote>>,
}

impl<P> CachedRateProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Quote still within its time to live, if any
    pub fn fresh_quote(&self) -> Option<RateQuote> {
        self.slot
            .lock()
            .as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| cached.quote.clone())
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

#[async_trait]
impl<P: BenchmarkRateProvider> BenchmarkRateProvider for CachedRateProvider<P> {
    async fn fetch_current_rate(&self) -> Result<RateQuote, RateFetchError> {
        if let Some(quote) = self.fresh_quote() {
            debug!("benchmark rate served from cache: {}%", quote.annual_pct);
            return Ok(quote);
        }

        let quote = self.inner.fetch_current_rate().await?;
        *self.slot.lock() = Some(CachedQuote {
            quote: quote.clone(),
            stored_at: Instant::now(),
        });
        Ok(quote)
    }
}
