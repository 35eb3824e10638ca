//! In-memory renderer serving fixed HTML by URL.
//!
//! Stands in for Chromium when replaying saved portal pages: navigation to
//! an unknown URL fails like a network error, and selector waits succeed
//! only when the stored markup contains a match.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{NavigationResult, RenderContext, Renderer};
use crate::error::RenderError;

/// Shared log of every URL navigated to, in order.
pub type VisitLog = Arc<Mutex<Vec<String>>>;

/// A renderer whose tabs all serve the same page set.
#[derive(Default)]
pub struct FixtureRenderer {
    pages: HashMap<String, String>,
    visits: VisitLog,
    open_contexts: Arc<AtomicUsize>,
    shutdowns: AtomicUsize,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn visits(&self) -> VisitLog {
        Arc::clone(&self.visits)
    }

    /// Tabs created and not yet closed.
    pub fn open_contexts(&self) -> usize {
        self.open_contexts.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError> {
        self.open_contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureContext {
            pages: self.pages.clone(),
            visits: Arc::clone(&self.visits),
            current: None,
            open_contexts: Some(Arc::clone(&self.open_contexts)),
        }))
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One tab over a fixed page set.
#[derive(Default)]
pub struct FixtureContext {
    pages: HashMap<String, String>,
    visits: VisitLog,
    current: Option<String>,
    open_contexts: Option<Arc<AtomicUsize>>,
}

impl FixtureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn visits(&self) -> VisitLog {
        Arc::clone(&self.visits)
    }

    fn current_html(&self) -> Result<&str, RenderError> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .map(String::as_str)
            .ok_or_else(|| RenderError::Script("no page loaded".to_string()))
    }
}

#[async_trait]
impl RenderContext for FixtureContext {
    async fn navigate(
        &mut self,
        url: &str,
        _timeout: Duration,
    ) -> Result<NavigationResult, RenderError> {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(url.to_string());
        }
        if !self.pages.contains_key(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let html = self.current_html()?;
        let sel = Selector::parse(selector)
            .map_err(|e| RenderError::Script(format!("invalid selector '{selector}': {e}")))?;
        if Html::parse_document(html).select(&sel).next().is_some() {
            Ok(())
        } else {
            Err(RenderError::Timeout {
                what: format!("waiting for '{selector}'"),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn get_html(&self) -> Result<String, RenderError> {
        self.current_html().map(str::to_string)
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        if let Some(open) = &self.open_contexts {
            open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_context_serves_pages() {
        let renderer = FixtureRenderer::new()
            .with_page("https://x.test/", "<html><body><app-notice-summary/></body></html>");
        let mut ctx = renderer.new_context().await.unwrap();
        assert_eq!(renderer.open_contexts(), 1);

        ctx.navigate("https://x.test/", Duration::from_secs(1))
            .await
            .unwrap();
        ctx.wait_for_selector("app-notice-summary", Duration::from_secs(1))
            .await
            .unwrap();
        let missing = ctx
            .wait_for_selector("app-notice-detail", Duration::from_secs(1))
            .await;
        assert!(matches!(missing, Err(RenderError::Timeout { .. })));
        assert!(ctx.get_html().await.unwrap().contains("app-notice-summary"));

        let err = ctx
            .navigate("https://x.test/other", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Navigation { .. }));

        ctx.close().await.unwrap();
        assert_eq!(renderer.open_contexts(), 0);
        assert_eq!(
            renderer.visits().lock().unwrap().as_slice(),
            ["https://x.test/", "https://x.test/other"]
        );
    }
}
