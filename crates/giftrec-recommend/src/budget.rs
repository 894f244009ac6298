//! Budget filtering and the rescue cascade that runs when it comes up empty.

use giftrec_core::{BudgetRange, CanonicalItem};
use serde::Serialize;

use crate::planner::{QueryContext, QueryPlanner, WIDEN_RATIO};
use crate::source::ProductSource;

/// Items priced below this share of the bucket floor never qualify as
/// nearest-to-floor.
pub const NEAREST_CUTOFF_RATIO: f64 = 0.6;

/// Which cascade stage produced the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Strict,
    Widened,
    Rescue,
    Nearest,
    None,
}

/// Items whose price lies inside `range`. Idempotent.
#[must_use]
pub fn filter_by_budget(items: &[CanonicalItem], range: &BudgetRange) -> Vec<CanonicalItem> {
    items
        .iter()
        .filter(|item| range.contains(item.price.value))
        .cloned()
        .collect()
}

/// Up to `limit` items closest to `floor`, ignoring anything cheaper than
/// [`NEAREST_CUTOFF_RATIO`] of it. Ties keep their fetch order.
#[must_use]
pub fn nearest_to_floor(items: &[CanonicalItem], floor: f64, limit: usize) -> Vec<CanonicalItem> {
    let cutoff = floor * NEAREST_CUTOFF_RATIO;
    let mut candidates: Vec<&CanonicalItem> = items
        .iter()
        .filter(|item| item.price.value.is_finite() && item.price.value >= cutoff)
        .collect();

    candidates.sort_by(|a, b| {
        let da = (a.price.value - floor).abs();
        let db = (b.price.value - floor).abs();
        da.total_cmp(&db)
    });

    candidates.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub items: Vec<CanonicalItem>,
    pub stage: Stage,
    pub errors: Vec<String>,
}

/// Strict filter, then each fallback in turn, stopping at the first stage
/// that keeps anything:
///
/// 1. strict budget filter over `fetched`
/// 2. the same filter with bounds widened by [`WIDEN_RATIO`]
/// 3. a rescue query, strictly filtered
/// 4. nearest-to-floor over `fetched`
///
/// The rescue query is skipped when `upstream_unusable` is set, because it
/// would fail the same way the ladder did.
pub async fn run_cascade<S: ProductSource>(
    planner: &QueryPlanner<'_, S>,
    ctx: &QueryContext,
    fetched: &[CanonicalItem],
    upstream_unusable: bool,
    nearest_limit: usize,
) -> CascadeOutcome {
    let range = ctx.budget_bucket.range();
    let mut errors = Vec::new();

    let strict = filter_by_budget(fetched, &range);
    if !strict.is_empty() {
        return outcome(strict, Stage::Strict, errors);
    }

    let widened = filter_by_budget(fetched, &range.widened(WIDEN_RATIO));
    if !widened.is_empty() {
        return outcome(widened, Stage::Widened, errors);
    }

    if !upstream_unusable {
        match planner.rescue(ctx).await {
            Ok(rescue) => {
                errors.extend(rescue.errors);
                let kept = filter_by_budget(&rescue.items, &range);
                if !kept.is_empty() {
                    return outcome(kept, Stage::Rescue, errors);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "rescue query failed");
                errors.push(format!("rescue: {e}"));
            }
        }
    }

    let nearest = nearest_to_floor(fetched, range.min, nearest_limit);
    if !nearest.is_empty() {
        return outcome(nearest, Stage::Nearest, errors);
    }

    outcome(Vec::new(), Stage::None, errors)
}

fn outcome(items: Vec<CanonicalItem>, stage: Stage, errors: Vec<String>) -> CascadeOutcome {
    CascadeOutcome {
        items,
        stage,
        errors,
    }
}
