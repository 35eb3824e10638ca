//! TED Tenders: procurement notice extraction from the TED portal.
//!
//! Renders search and notice pages in headless Chromium, extracts notice
//! fields, translates free text, converts estimated values to one currency
//! and exports the result as CSV.

pub mod config;
pub mod currency;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod pacing;
pub mod pipeline;
pub mod portal;
pub mod renderer;
pub mod table;
pub mod translate;
pub mod types;

pub use config::Config;
pub use currency::{CurrencyConverter, ExchangeRateApi};
pub use error::{
    ConversionError, ExportError, ExtractError, PipelineError, RenderError, TranslationError,
};
pub use pipeline::{run_with_renderer, Pipeline, RunOutcome, RunStats, Stage};
pub use renderer::chromium::ChromiumRenderer;
pub use renderer::{RenderContext, Renderer};
pub use table::ResultTable;
pub use translate::{GoogleTranslator, Translator};
pub use types::{Notice, Organisation, Row, SearchHit};
