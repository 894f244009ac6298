//! The fallback ladder: progressively relaxed upstream queries.
//!
//! Steps run strictly in order, one upstream call each, and the ladder stops
//! at the first step that yields any item. A failing step counts as an empty
//! one; only a configuration error aborts, since every later step would hit
//! it too.

use std::fmt;

use giftrec_affiliate::{AffiliateError, SearchQuery, SortOrder};
use giftrec_core::{BudgetBucket, BudgetRange, CanonicalItem, Catalog};
use serde::Serialize;

use crate::source::ProductSource;

/// Upstream language used once the requested one has been given up on.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Fractional widening applied to a bucket's bounds by the widened steps.
pub const WIDEN_RATIO: f64 = 0.2;

const STRICT_PAGE_SIZE: u32 = 20;
const RELAXED_PAGE_SIZE: u32 = 40;
const WIDENED_PAGE_SIZE: u32 = 50;
const RESCUE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderStep {
    Strict,
    NoShipping,
    DefaultLanguage,
    WidenedPrice,
    Rescue,
}

impl LadderStep {
    /// The regular ladder, in the order it is walked. Rescue is a separate
    /// entry point.
    pub const LADDER: [LadderStep; 4] = [
        LadderStep::Strict,
        LadderStep::NoShipping,
        LadderStep::DefaultLanguage,
        LadderStep::WidenedPrice,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LadderStep::Strict => "strict",
            LadderStep::NoShipping => "no_shipping",
            LadderStep::DefaultLanguage => "default_language",
            LadderStep::WidenedPrice => "widened_price",
            LadderStep::Rescue => "rescue",
        }
    }
}

impl fmt::Display for LadderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped inputs that drive keyword selection and upstream
/// parameters. Lives for one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// Two-letter upper-case shipping country.
    pub country: String,
    /// Caller language tag, e.g. `pt-BR`.
    pub language: String,
    pub budget_bucket: BudgetBucket,
    pub interests: Vec<String>,
    pub page: u32,
}

impl QueryContext {
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// Result of a ladder walk.
#[derive(Debug, Clone, Default)]
pub struct LadderOutcome {
    pub items: Vec<CanonicalItem>,
    /// The step that produced `items`, or `None` if every step came back empty.
    pub step: Option<LadderStep>,
    /// Captured per-step failures, formatted as `step: message`.
    pub errors: Vec<String>,
}

/// Maps a caller language tag onto one the upstream understands.
#[must_use]
pub fn target_language(language: &str) -> &'static str {
    let lower = language.trim().to_ascii_lowercase();
    if lower.starts_with("pt") {
        "pt"
    } else if lower == "ru" || lower.starts_with("ru-") {
        "ru"
    } else {
        DEFAULT_LANGUAGE
    }
}

/// Builds the upstream query for one ladder step.
#[must_use]
pub fn build_query(step: LadderStep, ctx: &QueryContext, keywords: &str) -> SearchQuery {
    let range = ctx.budget_bucket.range();
    let mut query = SearchQuery::new(keywords);
    query.page_no = ctx.page.max(1);
    query.sort = Some(SortOrder::VolumeDesc);

    let (language, bounds, page_size) = match step {
        LadderStep::Strict => {
            query.ship_to_country = Some(ctx.country.clone());
            (target_language(&ctx.language), range, STRICT_PAGE_SIZE)
        }
        LadderStep::NoShipping => (target_language(&ctx.language), range, RELAXED_PAGE_SIZE),
        LadderStep::DefaultLanguage => (DEFAULT_LANGUAGE, range, RELAXED_PAGE_SIZE),
        LadderStep::WidenedPrice => (
            DEFAULT_LANGUAGE,
            range.widened(WIDEN_RATIO),
            WIDENED_PAGE_SIZE,
        ),
        LadderStep::Rescue => {
            query.sort = Some(SortOrder::SalePriceAsc);
            (
                DEFAULT_LANGUAGE,
                BudgetRange::new(range.min, None),
                RESCUE_PAGE_SIZE,
            )
        }
    };

    query.target_language = Some(language.to_string());
    query.min_price = Some(bounds.min);
    query.max_price = bounds.max;
    query.page_size = page_size;
    query
}

/// Walks the ladder against a [`ProductSource`].
pub struct QueryPlanner<'a, S> {
    source: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S: ProductSource> QueryPlanner<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, catalog: &'a Catalog) -> Self {
        Self { source, catalog }
    }

    /// Space-joined keyword phrases for the context's interests.
    #[must_use]
    pub fn keywords(&self, ctx: &QueryContext) -> String {
        self.catalog.keywords_for(ctx.interests.as_slice()).join(" ")
    }

    /// Runs the ladder for `ctx.page`, stopping at the first non-empty step.
    ///
    /// # Errors
    ///
    /// Returns [`AffiliateError::Configuration`] when credentials are
    /// missing. Every other failure is captured in
    /// [`LadderOutcome::errors`] and the walk continues.
    pub async fn fetch(&self, ctx: &QueryContext) -> Result<LadderOutcome, AffiliateError> {
        let keywords = self.keywords(ctx);
        let mut errors = Vec::new();

        for step in LadderStep::LADDER {
            let items = self.attempt(step, ctx, &keywords, &mut errors).await?;
            if !items.is_empty() {
                return Ok(LadderOutcome {
                    items,
                    step: Some(step),
                    errors,
                });
            }
        }

        Ok(LadderOutcome {
            items: Vec::new(),
            step: None,
            errors,
        })
    }

    /// Single rescue query: lower bound only, default language, cheapest
    /// first.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::fetch`].
    pub async fn rescue(&self, ctx: &QueryContext) -> Result<LadderOutcome, AffiliateError> {
        let keywords = self.keywords(ctx);
        let mut errors = Vec::new();
        let items = self
            .attempt(LadderStep::Rescue, ctx, &keywords, &mut errors)
            .await?;
        let step = (!items.is_empty()).then_some(LadderStep::Rescue);
        Ok(LadderOutcome {
            items,
            step,
            errors,
        })
    }

    async fn attempt(
        &self,
        step: LadderStep,
        ctx: &QueryContext,
        keywords: &str,
        errors: &mut Vec<String>,
    ) -> Result<Vec<CanonicalItem>, AffiliateError> {
        let query = build_query(step, ctx, keywords);
        match self.source.search(&query).await {
            Ok(items) => {
                tracing::debug!(
                    %step,
                    page = query.page_no,
                    count = items.len(),
                    "ladder step completed"
                );
                Ok(items)
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                tracing::warn!(%step, page = query.page_no, error = %e, "ladder step failed");
                errors.push(format!("{step}: {e}"));
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;
