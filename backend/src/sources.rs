//! Quote Sources
//!
//! Each source scrapes one public page for the buy/sell dollar price.
//!
//! # Sources
//! ```text
//! DolarHoy  → first and second ".val" element
//! Cronista  → ".buy .val" and ".sell .val"
//! ```
//!
//! A source never fails loudly: any problem is logged and reported as
//! `None`, so one broken page cannot take the other one down.

use crate::{
    config::ScraperConfig,
    error::{QuoteError, Result},
    price_parser::parse_price,
    renderer::{PageRenderer, RenderSession},
    types::Quote,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const DOLAR_HOY_URL: &str = "https://www.dolarhoy.com/";
pub const CRONISTA_URL: &str = "https://www.cronista.com/MercadosOnline/moneda.html?id=ARSB";

/// Anything that can produce a quote on demand
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Page the quote comes from
    fn url(&self) -> &str;

    /// Fetch a fresh quote, or `None` if anything went wrong
    async fn fetch(&self) -> Option<Quote>;
}

/// Where the buy and sell prices live on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceLocator {
    /// Buy is the first match, sell is the second
    Positional { selector: String },

    /// Buy and sell each have their own selector
    Selectors { buy: String, sell: String },
}

/// A quote source backed by a rendered web page
pub struct ScrapedSource {
    name: String,
    url: String,
    locator: PriceLocator,
    page_load_timeout: Duration,
    element_timeout: Duration,
    renderer: Arc<dyn PageRenderer>,
}

impl ScrapedSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        locator: PriceLocator,
        renderer: Arc<dyn PageRenderer>,
        config: &ScraperConfig,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            locator,
            page_load_timeout: config.page_load_timeout,
            element_timeout: config.element_timeout,
            renderer,
        }
    }

    /// dolarhoy.com lists several `.val` cells; the first two are buy and sell
    pub fn dolar_hoy(renderer: Arc<dyn PageRenderer>, config: &ScraperConfig) -> Self {
        Self::new(
            "DolarHoy",
            DOLAR_HOY_URL,
            PriceLocator::Positional { selector: ".val".to_string() },
            renderer,
            config,
        )
    }

    pub fn cronista(renderer: Arc<dyn PageRenderer>, config: &ScraperConfig) -> Self {
        Self::new(
            "Cronista",
            CRONISTA_URL,
            PriceLocator::Selectors {
                buy: ".buy .val".to_string(),
                sell: ".sell .val".to_string(),
            },
            renderer,
            config,
        )
    }

    /// Run the scrape inside an already launched session
    async fn scrape(&self, session: &mut dyn RenderSession) -> Result<Quote> {
        session.goto(&self.url, self.page_load_timeout).await?;

        let (buy_text, sell_text) = match &self.locator {
            PriceLocator::Positional { selector } => {
                session.wait_for_selector(selector, self.element_timeout).await?;

                let mut texts = session.inner_texts(selector)?.into_iter();
                match (texts.next(), texts.next()) {
                    (Some(buy), Some(sell)) => (Some(buy), Some(sell)),
                    _ => {
                        return Err(QuoteError::ElementNotFound(format!(
                            "Could not find price elements on {}.",
                            self.name
                        )));
                    }
                }
            }
            PriceLocator::Selectors { buy, sell } => {
                session.wait_for_selector(buy, self.element_timeout).await?;
                session.wait_for_selector(sell, self.element_timeout).await?;

                (
                    session.inner_texts(buy)?.into_iter().next(),
                    session.inner_texts(sell)?.into_iter().next(),
                )
            }
        };

        let buy_price = parse_price(buy_text.as_deref());
        let sell_price = parse_price(sell_text.as_deref());

        if buy_price.is_nan() || sell_price.is_nan() {
            return Err(QuoteError::Parse(format!(
                "Could not parse prices from {}. Got: \"{}\", \"{}\"",
                self.name,
                buy_text.as_deref().unwrap_or("null"),
                sell_text.as_deref().unwrap_or("null"),
            )));
        }

        Ok(Quote {
            buy_price,
            sell_price,
            source: self.url.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for ScrapedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Option<Quote> {
        let session = match self.renderer.launch().await {
            Ok(session) => session,
            Err(e) => {
                error!("Error scraping {}: {}", self.url, e);
                return None;
            }
        };

        let mut session = SessionGuard::new(session);
        let result = self.scrape(session.get()).await;
        session.close().await;

        match result {
            Ok(quote) => {
                debug!(
                    "{} quote: buy ${} / sell ${}",
                    self.name, quote.buy_price, quote.sell_price
                );
                Some(quote)
            }
            Err(e) => {
                error!("Error scraping {}: {}", self.url, e);
                None
            }
        }
    }
}

/// Closes the wrapped session even when the fetch is dropped midway
struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn RenderSession>) -> Self {
        Self { session: Some(session) }
    }

    fn get(&mut self) -> &mut dyn RenderSession {
        // Only `close` and `drop` take the session, and both consume the guard
        self.session.as_deref_mut().unwrap_or_else(|| unreachable!())
    }

    async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Fetch dropped before finishing, closing session in background");
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(session.close());
            }
        }
    }
}

/// The two production sources, in the order their quotes are reported
pub fn default_sources(
    renderer: Arc<dyn PageRenderer>,
    config: &ScraperConfig,
) -> Vec<Arc<dyn QuoteSource>> {
    vec![
        Arc::new(ScrapedSource::dolar_hoy(renderer.clone(), config)),
        Arc::new(ScrapedSource::cronista(renderer, config)),
    ]
}
