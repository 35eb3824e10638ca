//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (Chromium via chromiumoxide in production, an
//! in-memory page set in tests).

pub mod chromium;
pub mod fixture;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError>;
    /// Close the browser. Safe to call more than once.
    async fn shutdown(&self) -> Result<(), RenderError>;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout: Duration)
        -> Result<NavigationResult, RenderError>;
    /// Block until an element matching `selector` is present.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), RenderError>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String, RenderError>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}
