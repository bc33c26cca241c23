//! Page Renderer
//!
//! Loads a web page and reads the text of elements matched by CSS selectors.
//! Scrapers only see the [`PageRenderer`] / [`RenderSession`] traits, so the
//! backing engine can be swapped (or stubbed in tests).
//!
//! # Session lifecycle
//! ```text
//! launch → goto(url) → wait_for_selector(..) → inner_texts(..) → close
//! ```
//! Callers must `close` every launched session, whether the scrape worked
//! or not.

use crate::error::{QuoteError, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Something that can open isolated browsing sessions
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn RenderSession>>;
}

/// A single browsing session holding at most one loaded page
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url`, failing if the page is not loaded within `timeout`
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until at least one element matches `selector`
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Trimmed text of every element matching `selector`, in document order
    fn inner_texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Release the session
    async fn close(self: Box<Self>);
}

/// Renderer backed by plain HTTP requests and static HTML matching
///
/// Pages are fetched with a fixed desktop `User-Agent`. While waiting for an
/// element the page is re-fetched every `poll_interval` until it shows up.
pub struct HttpRenderer {
    user_agent: String,
    poll_interval: Duration,
}

impl HttpRenderer {
    pub fn new(user_agent: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            poll_interval,
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .build()?;

        Ok(Box::new(HttpSession {
            client,
            poll_interval: self.poll_interval,
            url: None,
            body: None,
        }))
    }
}

pub struct HttpSession {
    client: reqwest::Client,
    poll_interval: Duration,
    url: Option<String>,
    body: Option<String>,
}

impl HttpSession {
    async fn load(&self, url: &str) -> Result<String> {
        let body = self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    fn has_match(&self, selector: &str) -> Result<bool> {
        Ok(!self.inner_texts(selector)?.is_empty())
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Loading {}", url);

        let body = tokio::time::timeout(timeout, self.load(url))
            .await
            .map_err(|_| QuoteError::Timeout(format!(
                "Navigation timeout of {} ms exceeded", timeout.as_millis()
            )))??;

        self.url = Some(url.to_string());
        self.body = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let url = self.url.clone().ok_or_else(|| QuoteError::ElementNotFound(
            format!("no page loaded while waiting for `{}`", selector)
        ))?;
        let deadline = Instant::now() + timeout;

        loop {
            if self.has_match(selector)? {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(QuoteError::Timeout(format!(
                    "Waiting for selector `{}` failed: {} ms exceeded",
                    selector,
                    timeout.as_millis()
                )));
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;

            // A failed reload keeps the previous page; the deadline ends the loop
            match tokio::time::timeout_at(deadline, self.load(&url)).await {
                Ok(Ok(body)) => self.body = Some(body),
                Ok(Err(e)) => debug!("Reload of {} failed: {}", url, e),
                Err(_) => {}
            }
        }
    }

    fn inner_texts(&self, selector: &str) -> Result<Vec<String>> {
        let selector_parsed = Selector::parse(selector)
            .map_err(|e| QuoteError::InvalidSelector(format!("{}: {:?}", selector, e)))?;

        let Some(body) = &self.body else {
            return Ok(Vec::new());
        };

        let document = Html::parse_document(body);
        Ok(document
            .select(&selector_parsed)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect())
    }

    async fn close(self: Box<Self>) {
        debug!("Closing session for {:?}", self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    const PAGE: &str = r#"
        <html><body>
            <div class="buy"><span class="val">$1.000,00</span></div>
            <div class="sell"><span class="val">$1.020,50</span></div>
        </body></html>
    "#;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn renderer() -> HttpRenderer {
        HttpRenderer::new("test-agent", Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_reads_texts_in_document_order() {
        let base = serve(Router::new().route("/", get(|| async { axum::response::Html(PAGE) }))).await;

        let mut session = renderer().launch().await.unwrap();
        session.goto(&format!("{}/", base), Duration::from_secs(5)).await.unwrap();
        session.wait_for_selector(".val", Duration::from_secs(1)).await.unwrap();

        let texts = session.inner_texts(".val").unwrap();
        assert_eq!(texts, vec!["$1.000,00", "$1.020,50"]);

        let sell = session.inner_texts(".sell .val").unwrap();
        assert_eq!(sell, vec!["$1.020,50"]);

        session.close().await;
    }

    #[tokio::test]
    async fn test_sends_user_agent() {
        let router = Router::new().route(
            "/",
            get(|headers: axum::http::HeaderMap| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let base = serve(router).await;

        let mut session = renderer().launch().await.unwrap();
        session.goto(&format!("{}/", base), Duration::from_secs(5)).await.unwrap();

        let body = session.inner_texts("body").unwrap();
        assert_eq!(body, vec!["test-agent"]);
        session.close().await;
    }

    #[tokio::test]
    async fn test_missing_element_times_out() {
        let base = serve(Router::new().route("/", get(|| async { axum::response::Html(PAGE) }))).await;

        let mut session = renderer().launch().await.unwrap();
        session.goto(&format!("{}/", base), Duration::from_secs(5)).await.unwrap();

        let result = session.wait_for_selector(".missing", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(QuoteError::Timeout(_))));
        session.close().await;
    }

    #[tokio::test]
    async fn test_error_status_fails_navigation() {
        let router = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(router).await;

        let mut session = renderer().launch().await.unwrap();
        let result = session.goto(&format!("{}/", base), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(QuoteError::Http(_))));
        session.close().await;
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let session = renderer().launch().await.unwrap();
        let result = session.inner_texts("[[");
        assert!(matches!(result, Err(QuoteError::InvalidSelector(_))));
        session.close().await;
    }
}
