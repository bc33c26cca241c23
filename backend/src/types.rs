use serde::Serialize;

/// A buy/sell quote scraped from one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Price at which the source buys dollars (ARS)
    pub buy_price: f64,

    /// Price at which the source sells dollars (ARS)
    pub sell_price: f64,

    /// URL the quote was scraped from
    pub source: String,
}

impl Quote {
    /// Both prices are usable for aggregation.
    ///
    /// A price of exactly zero counts as missing, same as `NaN`.
    pub fn has_valid_prices(&self) -> bool {
        is_truthy(self.buy_price) && is_truthy(self.sell_price)
    }
}

fn is_truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

/// Mean prices across all valid quotes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageResult {
    pub average_buy_price: f64,
    pub average_sell_price: f64,
}

/// Deviation of a single quote from the average
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlippageEntry {
    pub buy_price_slippage: Option<f64>,
    pub sell_price_slippage: Option<f64>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
