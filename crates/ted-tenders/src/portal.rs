//! Portal navigation on top of one render context.
//!
//! Every load is paced, waits for the page's dynamic content, then reads
//! back the rendered HTML.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{PortalConfig, SearchFilters};
use crate::error::{ExtractError, RenderError};
use crate::pacing::Pacer;
use crate::renderer::RenderContext;

/// HTML of one fully rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Reject identifiers that cannot safely be placed in a detail URL.
pub fn validate_notice_id(id: &str) -> Result<&str, ExtractError> {
    static NOTICE_ID: OnceLock<Regex> = OnceLock::new();
    let re = NOTICE_ID.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$").expect("notice id regex is valid")
    });
    if re.is_match(id) {
        Ok(id)
    } else {
        Err(ExtractError::InvalidNoticeId(id.to_string()))
    }
}

/// The portal as seen through one browser tab.
pub struct Portal {
    ctx: Box<dyn RenderContext>,
    config: PortalConfig,
    pacer: Pacer,
}

impl Portal {
    pub fn new(ctx: Box<dyn RenderContext>, config: PortalConfig) -> Self {
        let pacer = Pacer::new(config.request_pause);
        Self { ctx, config, pacer }
    }

    /// Render one page of search results (1-based).
    pub async fn search_page(
        &mut self,
        filters: &SearchFilters,
        page: u32,
    ) -> Result<RenderedPage, RenderError> {
        let url = filters
            .search_url(&self.config.base_url, page)
            .map_err(|e| RenderError::InvalidUrl(e.to_string()))?;
        let wait = self.config.search_wait_selector.clone();
        self.load(url.as_str(), &wait).await
    }

    /// Render the detail page of a validated notice.
    pub async fn notice_page(&mut self, notice_id: &str) -> Result<RenderedPage, RenderError> {
        let url = self
            .config
            .detail_url(notice_id)
            .map_err(|e| RenderError::InvalidUrl(e.to_string()))?;
        let wait = self.config.detail_wait_selector.clone();
        self.load(url.as_str(), &wait).await
    }

    /// Navigate, wait for `wait_selector`, settle, then read the HTML.
    ///
    /// A wait timeout is not fatal: the page is read as it is and the
    /// extractor decides whether enough of it rendered.
    pub async fn load(&mut self, url: &str, wait_selector: &str) -> Result<RenderedPage, RenderError> {
        self.pacer.wait().await;

        debug!("navigating to {url}");
        let nav = self.ctx.navigate(url, self.config.navigation_timeout).await?;
        debug!(load_ms = nav.load_time_ms, "loaded {}", nav.final_url);

        match self
            .ctx
            .wait_for_selector(wait_selector, self.config.wait_timeout)
            .await
        {
            Ok(()) => {
                if !self.config.settle_delay.is_zero() {
                    tokio::time::sleep(self.config.settle_delay).await;
                }
            }
            Err(e) => warn!("{e}; continuing with partially rendered {url}"),
        }

        let html = self.ctx.get_html().await?;
        if html.trim().is_empty() {
            return Err(RenderError::EmptyPage(url.to_string()));
        }

        Ok(RenderedPage {
            url: nav.final_url,
            html,
        })
    }

    /// Release the browser tab.
    pub async fn close(self) -> Result<(), RenderError> {
        self.ctx.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::FixtureContext;
    use std::time::Duration;

    #[test]
    fn test_validate_notice_id() {
        assert!(validate_notice_id("123456-2024").is_ok());
        assert!(validate_notice_id("2024-X").is_ok());
        assert!(validate_notice_id("").is_err());
        assert!(validate_notice_id("1/../2").is_err());
        assert!(validate_notice_id("12 34").is_err());
        assert!(validate_notice_id("-12").is_err());
    }

    #[tokio::test]
    async fn test_notice_page_uses_detail_url() {
        let ctx = FixtureContext::new()
            .with_page(
                "https://ted.europa.eu/en/notice/-/detail/1-2024",
                "<html><body><app-notice-detail>ok</app-notice-detail></body></html>",
            );
        let log = ctx.visits();
        let mut portal = Portal::new(Box::new(ctx), PortalConfig::default().without_pauses());

        let page = portal.notice_page("1-2024").await.unwrap();
        assert!(page.html.contains("ok"));
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["https://ted.europa.eu/en/notice/-/detail/1-2024"]
        );
    }

    #[tokio::test]
    async fn test_wait_timeout_still_returns_html() {
        let ctx = FixtureContext::new().with_page("https://x.test/a", "<html><body>partial</body></html>");
        let mut portal = Portal::new(Box::new(ctx), PortalConfig::default().without_pauses());

        let page = portal.load("https://x.test/a", "app-notice-detail").await.unwrap();
        assert!(page.html.contains("partial"));
    }

    #[tokio::test]
    async fn test_unknown_page_is_navigation_error() {
        let mut portal = Portal::new(
            Box::new(FixtureContext::new()),
            PortalConfig::default().without_pauses(),
        );
        let err = portal.load("https://x.test/missing", "body").await.unwrap_err();
        assert!(matches!(err, RenderError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_empty_page_is_error() {
        let ctx = FixtureContext::new().with_page("https://x.test/blank", "  ");
        let mut portal = Portal::new(Box::new(ctx), PortalConfig::default().without_pauses());
        let err = portal.load("https://x.test/blank", "body").await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyPage(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_are_paced() {
        let ctx = FixtureContext::new()
            .with_page("https://x.test/1", "<html><body>1</body></html>")
            .with_page("https://x.test/2", "<html><body>2</body></html>");
        let mut config = PortalConfig::default().without_pauses();
        config.request_pause = Duration::from_secs(3);
        let mut portal = Portal::new(Box::new(ctx), config);

        let start = tokio::time::Instant::now();
        portal.load("https://x.test/1", "body").await.unwrap();
        portal.load("https://x.test/2", "body").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
