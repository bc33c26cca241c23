//! Price Aggregator
//!
//! Combines the cached quotes into the views served over HTTP: the raw
//! quote list, the average, and the per-source slippage.
//!
//! # Architecture
//! ```text
//! DolarHoy → $1,000 / $1,010
//!                ↓
//! Cronista → $1,020 / $1,030  →  [Aggregator]  →  Average: $1,010 / $1,020
//! ```

use crate::{
    cache::QuoteCache,
    error::{QuoteError, Result},
    slippage::slippage_of,
    types::{AverageResult, Quote, SlippageEntry},
};
use std::sync::Arc;
use tracing::debug;

/// Service object behind the HTTP handlers
pub struct QuoteAggregator {
    cache: Arc<QuoteCache>,
}

impl QuoteAggregator {
    pub fn new(cache: Arc<QuoteCache>) -> Self {
        Self { cache }
    }

    /// Quotes from every source that answered
    pub async fn get_quotes(&self) -> Vec<Quote> {
        self.cache.get().await
    }

    /// Average buy and sell price across valid quotes
    ///
    /// # Errors
    /// * `NoQuotes` - no source returned a quote
    /// * `NoValidQuotes` - every quote has a zero price
    pub async fn get_average(&self) -> Result<AverageResult> {
        let quotes = self.cache.get().await;
        average_of(&quotes)
    }

    /// Deviation of each quote from the average
    ///
    /// Reads the cache once so the average and the entries come from the
    /// same quote set.
    pub async fn get_slippage(&self) -> Result<Vec<SlippageEntry>> {
        let quotes = self.cache.get().await;
        let average = average_of(&quotes)?;
        Ok(slippage_of(&quotes, &average))
    }
}

/// Arithmetic mean of buy and sell prices
///
/// Quotes with a zero (or `NaN`) price on either side are skipped.
///
/// # Example
/// ```text
/// [{buy: 1000, sell: 1010}, {buy: 1020, sell: 1030}]
///   → {average_buy_price: 1010, average_sell_price: 1020}
/// ```
pub fn average_of(quotes: &[Quote]) -> Result<AverageResult> {
    if quotes.is_empty() {
        return Err(QuoteError::NoQuotes);
    }

    let (total_buy, total_sell, count) = quotes
        .iter()
        .filter(|quote| quote.has_valid_prices())
        .fold((0.0, 0.0, 0usize), |(buy, sell, n), quote| {
            (buy + quote.buy_price, sell + quote.sell_price, n + 1)
        });

    if count == 0 {
        return Err(QuoteError::NoValidQuotes);
    }

    let average = AverageResult {
        average_buy_price: total_buy / count as f64,
        average_sell_price: total_sell / count as f64,
    };

    debug!(
        "Average over {} quotes: buy ${} / sell ${}",
        count, average.average_buy_price, average.average_sell_price
    );

    Ok(average)
}
