//! One recommendation request from validated input to response payload.

use std::collections::HashSet;

use giftrec_core::{AppConfig, CanonicalItem, Catalog};
use serde::Serialize;
use serde_json::Value;

use crate::budget::{filter_by_budget, run_cascade, Stage};
use crate::planner::{LadderStep, QueryContext, QueryPlanner};
use crate::source::ProductSource;

pub const DEFAULT_COUNTRY: &str = "BR";
pub const DEFAULT_REQUEST_LANGUAGE: &str = "pt-BR";
const DEBUG_PRICE_SAMPLE: usize = 10;
const EMPTY_RESULT_NOTE: &str = "upstream returned no items for any query";

/// Validates and defaults a request body into a [`QueryContext`].
///
/// Never fails: every missing or malformed field falls back to its default.
/// Country must be two ASCII letters; interests keep only non-blank strings
/// and fall back to the catalog's default interest when none remain.
#[must_use]
pub fn parse_request(body: &Value, page: u32, catalog: &Catalog) -> QueryContext {
    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let country = text("country")
        .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map_or_else(|| DEFAULT_COUNTRY.to_string(), str::to_ascii_uppercase);

    let language = text("language").unwrap_or(DEFAULT_REQUEST_LANGUAGE).to_string();

    let budget_bucket = catalog.bucket(text("budget_bucket"));

    let mut interests: Vec<String> = body
        .get("interests")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if interests.is_empty() {
        interests.push(catalog.default_interest.clone());
    }

    QueryContext {
        country,
        language,
        budget_bucket,
        interests,
        page: page.max(1),
    }
}

/// Tunables for aggregation and slicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendSettings {
    /// Consecutive pages walked per request, starting at the requested one.
    pub max_pages: u32,
    /// Aggregation stops early once this many items match the budget.
    pub target_items: usize,
    /// Items returned in `items`; the rest are counted in `alt_count`.
    pub primary_items: usize,
    pub nearest_limit: usize,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            max_pages: 1,
            target_items: 12,
            primary_items: 6,
            nearest_limit: 12,
        }
    }
}

impl RecommendSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_pages: config.max_pages.max(1),
            target_items: config.target_items,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub items: Vec<CanonicalItem>,
    pub alt_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugReport>,
}

/// Diagnostic counters returned when the caller asks for them. Never carries
/// credentials, only whether they are present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub env_ok: bool,
    pub page: u32,
    pub pages_fetched: u32,
    pub budget_bucket: String,
    pub ladder_step: Option<LadderStep>,
    pub fetched: usize,
    pub kept: usize,
    pub stage: Stage,
    pub rescue_used: bool,
    pub fetched_prices: Vec<f64>,
    pub kept_prices: Vec<f64>,
    pub ae_error: Option<String>,
}

/// Tracks identities already aggregated. An item repeats a previous one when
/// it shares its id, its affiliate URL, or its case-folded title.
#[derive(Default)]
struct SeenItems {
    ids: HashSet<String>,
    urls: HashSet<String>,
    titles: HashSet<String>,
}

impl SeenItems {
    fn insert(&mut self, item: &CanonicalItem) -> bool {
        let title = item.title.trim().to_lowercase();
        if self.ids.contains(&item.id)
            || self.urls.contains(&item.url_aff)
            || self.titles.contains(&title)
        {
            return false;
        }
        self.ids.insert(item.id.clone());
        self.urls.insert(item.url_aff.clone());
        self.titles.insert(title);
        true
    }
}

/// Request orchestrator. Stateless across requests; shareable behind an `Arc`.
pub struct Recommender<S> {
    source: S,
    catalog: Catalog,
    settings: RecommendSettings,
}

impl<S: ProductSource> Recommender<S> {
    #[must_use]
    pub fn new(source: S, catalog: Catalog, settings: RecommendSettings) -> Self {
        Self {
            source,
            catalog,
            settings,
        }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Produces the best-effort item list for one request.
    ///
    /// Upstream failures never escape: they are captured, reported through
    /// `debug.aeError`, and the cascade carries on with whatever was fetched.
    pub async fn recommend(&self, ctx: &QueryContext, debug: bool) -> RecommendResponse {
        let planner = QueryPlanner::new(&self.source, &self.catalog);
        let range = ctx.budget_bucket.range();

        let mut fetched: Vec<CanonicalItem> = Vec::new();
        let mut seen = SeenItems::default();
        let mut errors: Vec<String> = Vec::new();
        let mut ladder_step = None;
        let mut pages_fetched = 0;
        let mut upstream_unusable = false;

        for offset in 0..self.settings.max_pages {
            let page_ctx = ctx.with_page(ctx.page.saturating_add(offset));
            let outcome = match planner.fetch(&page_ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(page = page_ctx.page, error = %e, "upstream unusable");
                    errors.push(e.to_string());
                    upstream_unusable = true;
                    break;
                }
            };

            pages_fetched += 1;
            errors.extend(outcome.errors);
            if ladder_step.is_none() {
                ladder_step = outcome.step;
            }
            if outcome.items.is_empty() {
                break;
            }

            fetched.extend(outcome.items.into_iter().filter(|item| seen.insert(item)));

            if filter_by_budget(&fetched, &range).len() >= self.settings.target_items {
                break;
            }
        }

        let cascade = run_cascade(
            &planner,
            ctx,
            &fetched,
            upstream_unusable,
            self.settings.nearest_limit,
        )
        .await;
        errors.extend(cascade.errors);

        // Rescue results never went through page aggregation.
        let mut final_seen = SeenItems::default();
        let mut kept: Vec<CanonicalItem> = cascade
            .items
            .into_iter()
            .filter(|item| final_seen.insert(item))
            .collect();
        for item in &mut kept {
            item.budget_hint = self
                .catalog
                .bucket_for_price(item.price.value)
                .unwrap_or_default()
                .to_string();
        }

        tracing::info!(
            bucket = %ctx.budget_bucket.label,
            page = ctx.page,
            fetched = fetched.len(),
            kept = kept.len(),
            stage = ?cascade.stage,
            "recommendation assembled"
        );

        let debug_report = debug.then(|| DebugReport {
            env_ok: self.source.is_configured(),
            page: ctx.page,
            pages_fetched,
            budget_bucket: ctx.budget_bucket.label.clone(),
            ladder_step,
            fetched: fetched.len(),
            kept: kept.len(),
            stage: cascade.stage,
            rescue_used: cascade.stage == Stage::Rescue,
            fetched_prices: price_sample(&fetched),
            kept_prices: price_sample(&kept),
            ae_error: diagnostic_note(&errors, kept.is_empty()),
        });

        let alt_count = kept.len().saturating_sub(self.settings.primary_items);
        kept.truncate(self.settings.primary_items);

        RecommendResponse {
            items: kept,
            alt_count,
            debug: debug_report,
        }
    }
}

fn price_sample(items: &[CanonicalItem]) -> Vec<f64> {
    items
        .iter()
        .take(DEBUG_PRICE_SAMPLE)
        .map(|item| item.price.value)
        .collect()
}

/// Captured errors joined with ` | `; a fixed note when the result is empty
/// without any error to explain it.
fn diagnostic_note(errors: &[String], empty: bool) -> Option<String> {
    if !errors.is_empty() {
        Some(errors.join(" | "))
    } else if empty {
        Some(EMPTY_RESULT_NOTE.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
