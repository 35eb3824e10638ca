//! Start-time configuration for a run.
//!
//! Everything here is fixed before the browser launches; nothing is adjusted
//! from portal or service feedback during the run.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Portal root used for both search and detail pages.
pub const DEFAULT_PORTAL_URL: &str = "https://ted.europa.eu";

/// Element that appears once the search result list has rendered.
pub const SEARCH_WAIT_SELECTOR: &str = "app-notice-summary";

/// Element that appears once a notice detail page has rendered.
pub const DETAIL_WAIT_SELECTOR: &str = "app-notice-detail";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/118.0.0.0 Safari/537.36";

pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.google.com";
pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://api.exchangerate-api.com";

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchFilters,
    pub portal: PortalConfig,
    pub browser: BrowserSettings,
    pub services: ServiceConfig,
    /// ISO 4217 code every value is converted to.
    pub target_currency: String,
    /// Language code text fields are translated to.
    pub target_language: String,
    /// Upper bound on result pages, for portals that repeat their last page.
    pub max_pages: u32,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let search = SearchFilters::default();
        let output = search.default_output_path();
        Self {
            search,
            portal: PortalConfig::default(),
            browser: BrowserSettings::default(),
            services: ServiceConfig::default(),
            target_currency: "INR".to_string(),
            target_language: "en".to_string(),
            max_pages: 50,
            output,
        }
    }
}

/// Which notices to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    /// Full-text search term (product category).
    pub keyword: String,
    /// Publication year facet.
    pub year: u16,
    /// Notice scope: `ACTIVE`, `ALL` or `LATEST`.
    pub scope: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            keyword: "Adalimumab".to_string(),
            year: 2024,
            scope: "ACTIVE".to_string(),
        }
    }
}

impl SearchFilters {
    /// Build the URL of one (1-based) page of search results.
    pub fn search_url(&self, base: &str, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(base)?.join("/en/search/result")?;
        url.query_pairs_mut()
            .append_pair("FT", &self.keyword)
            .append_pair("search-scope", &self.scope)
            .append_pair("scope", &self.scope)
            .append_pair("onlyLatestVersions", "false")
            .append_pair("facet.publication-date", &self.year.to_string())
            .append_pair("sortColumn", "publication-number")
            .append_pair("sortOrder", "DESC")
            .append_pair("page", &page.to_string())
            .append_pair("simpleSearchRef", "true");
        Ok(url)
    }

    /// `adalimumab_tenders_2024.csv` style file name.
    pub fn default_output_path(&self) -> PathBuf {
        let slug: String = self
            .keyword
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        let slug = if slug.is_empty() { "notices".to_string() } else { slug };
        PathBuf::from(format!("{slug}_tenders_{}.csv", self.year))
    }
}

/// Portal navigation and pacing.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub search_wait_selector: String,
    pub detail_wait_selector: String,
    pub navigation_timeout: Duration,
    pub wait_timeout: Duration,
    /// Extra pause after the wait selector appears.
    pub settle_delay: Duration,
    /// Minimum spacing between two navigations.
    pub request_pause: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
            search_wait_selector: SEARCH_WAIT_SELECTOR.to_string(),
            detail_wait_selector: DETAIL_WAIT_SELECTOR.to_string(),
            navigation_timeout: Duration::from_secs(60),
            wait_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            request_pause: Duration::from_secs(3),
        }
    }
}

impl PortalConfig {
    /// Detail page URL for a validated notice identifier.
    pub fn detail_url(&self, notice_id: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(&format!("/en/notice/-/detail/{notice_id}"))
    }

    /// Config with every pause set to zero, for fixtures and tests.
    pub fn without_pauses(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self.request_pause = Duration::ZERO;
        self
    }
}

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Explicit Chromium binary; discovered when `None`.
    pub chromium_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
        }
    }
}

/// Endpoints of the translation and exchange-rate services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub translate_url: String,
    pub exchange_rate_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            exchange_rate_url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}
