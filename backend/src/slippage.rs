//! Slippage Calculator
//!
//! # Formula
//! ```text
//! buy_price_slippage  = (buy  - average_buy_price) / average_buy_price
//! sell_price_slippage = (sell - average_buy_price) / average_buy_price
//! ```
//!
//! Both sides are normalized by the average *buy* price.

use crate::types::{AverageResult, Quote, SlippageEntry};

pub const INVALID_PRICE_ERROR: &str = "Could not retrieve valid price from this source.";

/// One entry per quote, in the same order
pub fn slippage_of(quotes: &[Quote], average: &AverageResult) -> Vec<SlippageEntry> {
    quotes
        .iter()
        .map(|quote| entry_for(quote, average))
        .collect()
}

fn entry_for(quote: &Quote, average: &AverageResult) -> SlippageEntry {
    if !quote.has_valid_prices() {
        return SlippageEntry {
            buy_price_slippage: None,
            sell_price_slippage: None,
            source: quote.source.clone(),
            error: Some(INVALID_PRICE_ERROR.to_string()),
        };
    }

    let base = average.average_buy_price;

    SlippageEntry {
        buy_price_slippage: Some((quote.buy_price - base) / base),
        sell_price_slippage: Some((quote.sell_price - base) / base),
        source: quote.source.clone(),
        error: None,
    }
}
