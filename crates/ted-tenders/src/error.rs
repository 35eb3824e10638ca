//! Error taxonomy for the extraction pipeline.
//!
//! Each adapter has its own error type. Only [`PipelineError`] aborts a run;
//! the others are handled per notice by the driver.

/// Failures of the browser session: launch, navigation, page retrieval.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Chromium not found (set TED_TENDERS_CHROMIUM_PATH or install chromium)")]
    BrowserNotFound,

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{what} timed out after {timeout_ms}ms")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Page at {0} returned no content")]
    EmptyPage(String),
}

/// Failures of the field extractor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// A required field is absent; usually a portal layout change.
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Invalid notice identifier: {0:?}")]
    InvalidNoticeId(String),
}

/// Failures of the translation service adapter.
#[derive(thiserror::Error, Debug)]
pub enum TranslationError {
    #[error("Translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation service returned HTTP {0}")]
    Service(u16),

    #[error("Translation service returned no text")]
    EmptyResponse,

    #[error("Text of {len} characters exceeds the {max} character limit")]
    TextTooLong { len: usize, max: usize },
}

/// Failures of the currency conversion adapter.
#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate service returned HTTP {0}")]
    Service(u16),

    #[error("Malformed rate response: {0}")]
    Decode(String),
}

/// Failures while writing the result table.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a whole run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Could not open a browser tab: {0}")]
    Session(#[source] RenderError),

    #[error("Search page {page} failed: {source}")]
    Search {
        page: u32,
        #[source]
        source: RenderError,
    },

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}
