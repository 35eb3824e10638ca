//! The extract-transform-load driver.
//!
//! `Searching` walks result pages until one comes back empty, `Detailing`
//! visits each collected notice in discovery order, `Done` ends the run.
//! Failures local to one notice degrade or skip that notice; only a failure
//! on the first search page aborts the run.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::currency::{normalise_code, round_cents, CurrencyConverter};
use crate::error::{ExtractError, PipelineError, RenderError};
use crate::extract::{extract_notice, parse_search_results};
use crate::portal::{validate_notice_id, Portal};
use crate::renderer::Renderer;
use crate::table::ResultTable;
use crate::translate::Translator;
use crate::types::{Notice, Row, SearchHit};

/// Where the driver is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Next result page to render (1-based).
    Searching { page: u32 },
    /// Index of the next notice to visit.
    Detailing { next: usize },
    Done,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_visited: u32,
    pub notices_found: usize,
    pub notices_visited: usize,
    /// Notices whose detail page failed to render.
    pub render_failures: usize,
    /// Notices visited but missing a required field.
    pub missing_fields: usize,
    /// Search results never visited because their identifier is unusable.
    pub invalid_ids: usize,
    pub translation_fallbacks: usize,
    pub conversion_fallbacks: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table: ResultTable,
    pub stats: RunStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Write the table as CSV. Nothing is written for an empty table.
    pub fn export(&self, path: &Path) -> Result<bool, PipelineError> {
        if self.table.is_empty() {
            warn!("no rows produced; {} not written", path.display());
            return Ok(false);
        }
        self.table.write_csv(path)?;
        Ok(true)
    }
}

/// Outcome of valuing one notice.
#[derive(Debug, Clone, PartialEq)]
enum Valuation {
    Converted { amount: f64, currency: String },
    /// Conversion failed; the original amount and currency are kept.
    Unconverted {
        amount: f64,
        currency: String,
        reason: String,
    },
    Missing { reason: String },
}

/// Sequential driver over one portal tab and the two services.
pub struct Pipeline {
    portal: Portal,
    translator: Arc<dyn Translator>,
    converter: Arc<dyn CurrencyConverter>,
    config: Config,
    stage: Stage,
    hits: Vec<SearchHit>,
    table: ResultTable,
    stats: RunStats,
}

impl Pipeline {
    pub fn new(
        portal: Portal,
        translator: Arc<dyn Translator>,
        converter: Arc<dyn CurrencyConverter>,
        config: Config,
    ) -> Self {
        Self {
            portal,
            translator,
            converter,
            config,
            stage: Stage::Searching { page: 1 },
            hits: Vec::new(),
            table: ResultTable::new(),
            stats: RunStats::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Drive the run until `Done`.
    pub async fn run(&mut self) -> Result<RunOutcome, PipelineError> {
        let started_at = Utc::now();
        info!(
            keyword = %self.config.search.keyword,
            year = self.config.search.year,
            currency = %self.config.target_currency,
            "starting run"
        );

        while self.stage != Stage::Done {
            self.step().await?;
        }

        let finished_at = Utc::now();
        let stats = self.stats.clone();
        info!(
            pages = stats.pages_visited,
            found = stats.notices_found,
            visited = stats.notices_visited,
            rows = self.table.len(),
            render_failures = stats.render_failures,
            missing_fields = stats.missing_fields,
            invalid_ids = stats.invalid_ids,
            translation_fallbacks = stats.translation_fallbacks,
            conversion_fallbacks = stats.conversion_fallbacks,
            elapsed_s = (finished_at - started_at).num_seconds(),
            "run complete"
        );

        Ok(RunOutcome {
            table: std::mem::take(&mut self.table),
            stats,
            started_at,
            finished_at,
        })
    }

    /// Advance by one page or one notice and return the new stage.
    ///
    /// On error the stage is left unchanged.
    pub async fn step(&mut self) -> Result<Stage, PipelineError> {
        let next = match self.stage {
            Stage::Searching { page } => self.search_step(page).await?,
            Stage::Detailing { next } => match self.hits.get(next).cloned() {
                Some(hit) => {
                    info!("detail {}/{}: {}", next + 1, self.hits.len(), hit.notice_number);
                    self.detail_step(&hit).await;
                    Stage::Detailing { next: next + 1 }
                }
                None => Stage::Done,
            },
            Stage::Done => Stage::Done,
        };
        self.stage = next;
        Ok(next)
    }

    /// Release the browser tab. Close failures are logged, not returned.
    pub async fn close(self) {
        if let Err(e) = self.portal.close().await {
            warn!("failed to close browser tab: {e}");
        }
    }

    async fn search_step(&mut self, page: u32) -> Result<Stage, PipelineError> {
        let detailing = Stage::Detailing { next: 0 };
        if page > self.config.max_pages {
            warn!("stopping at the {} page limit", self.config.max_pages);
            return Ok(detailing);
        }

        info!("search page {page}");
        let rendered = match self.portal.search_page(&self.config.search, page).await {
            Ok(rendered) => rendered,
            Err(source) if page == 1 => return Err(PipelineError::Search { page, source }),
            Err(e) => {
                warn!("search page {page} failed, keeping earlier pages: {e}");
                return Ok(detailing);
            }
        };
        self.stats.pages_visited += 1;

        let hits = match parse_search_results(&rendered.html) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("search page {page} has no results table ({e}); treating it as the last page");
                return Ok(detailing);
            }
        };
        if hits.is_empty() {
            info!("search page {page} is empty; {} notices found", self.hits.len());
            return Ok(detailing);
        }

        info!("search page {page}: {} notices", hits.len());
        self.stats.notices_found += hits.len();
        self.hits.extend(hits);
        Ok(Stage::Searching { page: page + 1 })
    }

    async fn detail_step(&mut self, hit: &SearchHit) {
        let id = match validate_notice_id(&hit.notice_number) {
            Ok(id) => id,
            Err(e) => {
                warn!("skipping search result: {e}");
                self.stats.invalid_ids += 1;
                return;
            }
        };

        let rendered = match self.portal.notice_page(id).await {
            Ok(rendered) => rendered,
            Err(e) => {
                self.skip_render_failure(id, e);
                return;
            }
        };
        self.stats.notices_visited += 1;

        let notice = match extract_notice(&rendered.html) {
            Ok(notice) => notice,
            Err(e) => {
                self.skip_extract_failure(id, e);
                return;
            }
        };
        if notice.notice_number != hit.notice_number {
            warn!(
                "detail page for {} reports publication number {}",
                hit.notice_number, notice.notice_number
            );
        }

        let row = self.build_row(hit, notice).await;
        self.table.push(row);
        info!("processed {id}");
    }

    fn skip_render_failure(&mut self, id: &str, e: RenderError) {
        error!("skipping {id}: {e}");
        self.stats.render_failures += 1;
    }

    fn skip_extract_failure(&mut self, id: &str, e: ExtractError) {
        warn!("skipping {id}: {e}");
        self.stats.missing_fields += 1;
    }

    async fn build_row(&mut self, hit: &SearchHit, notice: Notice) -> Row {
        let description = match notice.description.as_deref().or(hit.description.as_deref()) {
            Some(text) => self.translate_field(text).await,
            None => String::new(),
        };
        let buyer_name = self.translate_opt(notice.buyer_name.as_deref()).await;
        let procedure_id = self.translate_opt(notice.procedure_id.as_deref()).await;

        let mut organisations = notice.organisations.clone();
        for org in &mut organisations {
            org.name = self.translate_field(&org.name).await;
        }
        let organisations = serde_json::to_string(&organisations).unwrap_or_else(|e| {
            warn!("failed to serialize organisations for {}: {e}", notice.notice_number);
            "[]".to_string()
        });

        let valuation = self.value(&notice).await;
        let (value, currency, value_converted, conversion_note) = match valuation {
            Valuation::Converted { amount, currency } => {
                (Some(round_cents(amount)), Some(currency), true, None)
            }
            Valuation::Unconverted {
                amount,
                currency,
                reason,
            } => (Some(amount), Some(currency), false, Some(reason)),
            Valuation::Missing { reason } => (None, None, false, Some(reason)),
        };

        Row {
            notice_number: notice.notice_number,
            description,
            value,
            currency,
            buyer_name,
            organisations,
            pdf_link: notice.pdf_link,
            value_converted,
            original_value: notice.value_text,
            original_currency: notice.currency,
            conversion_note,
            buyer_email: notice.buyer_email,
            procedure_id,
            country: hit.country.clone(),
            publication_date: hit.publication_date.clone(),
            deadline: hit.deadline.clone(),
            start_date: notice.start_date,
            end_date: notice.end_date,
        }
    }

    /// Translate, keeping the original text on any failure.
    async fn translate_field(&mut self, text: &str) -> String {
        match self
            .translator
            .translate(text, &self.config.target_language)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!("translation failed, keeping original text: {e}");
                self.stats.translation_fallbacks += 1;
                text.to_string()
            }
        }
    }

    async fn translate_opt(&mut self, text: Option<&str>) -> Option<String> {
        match text {
            Some(t) => Some(self.translate_field(t).await),
            None => None,
        }
    }

    async fn value(&mut self, notice: &Notice) -> Valuation {
        let Some(text) = notice.value_text.as_deref() else {
            return Valuation::Missing {
                reason: "no estimated value".to_string(),
            };
        };
        let Some(amount) = notice.estimated_value.filter(|a| *a != 0.0) else {
            return Valuation::Missing {
                reason: format!("invalid amount: {text}"),
            };
        };
        let Some(currency) = notice.currency.as_deref().map(str::trim).filter(|c| !c.is_empty())
        else {
            return Valuation::Missing {
                reason: "no currency".to_string(),
            };
        };
        let currency = normalise_code(currency).unwrap_or_else(|| currency.to_string());

        let target = &self.config.target_currency;
        match self.converter.convert(amount, &currency, target).await {
            Ok(converted) => Valuation::Converted {
                amount: converted,
                currency: target.clone(),
            },
            Err(e) => {
                warn!(
                    "conversion of {amount} {currency} to {target} failed, keeping original: {e}"
                );
                self.stats.conversion_fallbacks += 1;
                Valuation::Unconverted {
                    amount,
                    currency,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Run the whole pipeline in one tab of `renderer`.
///
/// The tab is closed whether or not the run succeeds; shutting the renderer
/// down stays with the caller that launched it.
pub async fn run_with_renderer(
    renderer: &dyn Renderer,
    translator: Arc<dyn Translator>,
    converter: Arc<dyn CurrencyConverter>,
    config: Config,
) -> Result<RunOutcome, PipelineError> {
    let ctx = renderer
        .new_context()
        .await
        .map_err(PipelineError::Session)?;
    let portal = Portal::new(ctx, config.portal.clone());
    let mut pipeline = Pipeline::new(portal, translator, converter, config);
    let result = pipeline.run().await;
    pipeline.close().await;
    result
}
