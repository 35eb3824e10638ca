//! Translation adapter backed by the Google Translate mobile page.

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::TranslationError;
use crate::http_client::HttpClient;

/// Language every text field is translated to unless configured otherwise.
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Longest text the service accepts in one request.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Translates free text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Text already in `target` comes back unchanged.
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}

/// Text with nothing to translate: blank, or only codes and numbers.
///
/// A word counts as a code when it has no letters or mixes letters with
/// digits (`a1b2c3`, `ORG-0001`, `01/06/2024`). Anything else goes to the
/// service, which detects the source language itself.
pub fn is_untranslatable(text: &str) -> bool {
    text.split_whitespace().all(|word| {
        !word.chars().any(char::is_alphabetic) || word.chars().any(|c| c.is_ascii_digit())
    })
}

/// Scrapes `translate.google.com/m`, auto-detecting the source language.
pub struct GoogleTranslator {
    http: HttpClient,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        if is_untranslatable(text) {
            return Ok(text.to_string());
        }
        let len = text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(TranslationError::TextTooLong {
                len,
                max: MAX_TEXT_CHARS,
            });
        }

        let url = format!("{}/m", self.base_url);
        let resp = self
            .http
            .get(&url, &[("sl", "auto"), ("tl", target), ("q", text)])
            .await?;
        if !resp.is_success() {
            return Err(TranslationError::Service(resp.status));
        }

        parse_translation(&resp.body).ok_or(TranslationError::EmptyResponse)
    }
}

/// Pull the translated text out of the mobile result page.
fn parse_translation(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("div.result-container, div.t0").ok()?;
    let el = document.select(&sel).next()?;
    let text = el.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
