use giftrec_core::Catalog;

use super::*;
use crate::test_support::{config_error, items, transport_error, FakeSource};

fn context(bucket: &str) -> QueryContext {
    let catalog = Catalog::builtin();
    QueryContext {
        country: "BR".to_string(),
        language: "pt-BR".to_string(),
        budget_bucket: catalog.bucket(Some(bucket)),
        interests: vec!["Tech & Gadgets".to_string()],
        page: 1,
    }
}

#[test]
fn target_language_maps_known_prefixes() {
    assert_eq!(target_language("pt-BR"), "pt");
    assert_eq!(target_language("PT"), "pt");
    assert_eq!(target_language("ru"), "ru");
    assert_eq!(target_language("es-MX"), "en");
    assert_eq!(target_language(""), "en");
}

#[test]
fn strict_query_keeps_every_constraint() {
    let query = build_query(LadderStep::Strict, &context("$50-99"), "lamp");
    assert_eq!(query.ship_to_country.as_deref(), Some("BR"));
    assert_eq!(query.target_language.as_deref(), Some("pt"));
    assert_eq!(query.min_price, Some(50.0));
    assert_eq!(query.max_price, Some(99.0));
    assert_eq!(query.sort, Some(SortOrder::VolumeDesc));
    assert_eq!(query.page_size, 20);
}

#[test]
fn relaxed_steps_drop_shipping_then_language() {
    let ctx = context("$50-99");

    let no_ship = build_query(LadderStep::NoShipping, &ctx, "lamp");
    assert!(no_ship.ship_to_country.is_none());
    assert_eq!(no_ship.target_language.as_deref(), Some("pt"));
    assert_eq!(no_ship.page_size, 40);

    let default_lang = build_query(LadderStep::DefaultLanguage, &ctx, "lamp");
    assert!(default_lang.ship_to_country.is_none());
    assert_eq!(default_lang.target_language.as_deref(), Some("en"));
    assert_eq!(default_lang.max_price, Some(99.0));
}

#[test]
fn widened_step_stretches_bounds_by_twenty_percent() {
    let query = build_query(LadderStep::WidenedPrice, &context("$50-99"), "lamp");
    let min = query.min_price.unwrap();
    let max = query.max_price.unwrap();
    assert!((min - 40.0).abs() < 1e-9);
    assert!((max - 118.8).abs() < 1e-9);
    assert_eq!(query.page_size, 50);
    assert_eq!(query.target_language.as_deref(), Some("en"));
}

#[test]
fn rescue_query_has_lower_bound_only_sorted_by_price() {
    let query = build_query(LadderStep::Rescue, &context("$100-499"), "lamp");
    assert_eq!(query.min_price, Some(100.0));
    assert!(query.max_price.is_none());
    assert_eq!(query.sort, Some(SortOrder::SalePriceAsc));
    assert_eq!(query.target_language.as_deref(), Some("en"));
    assert!(query.ship_to_country.is_none());
}

#[test]
fn unbounded_bucket_sends_no_upper_bound() {
    let query = build_query(LadderStep::Strict, &context("$1000+"), "lamp");
    assert_eq!(query.min_price, Some(1000.0));
    assert!(query.max_price.is_none());
}

#[test]
fn keywords_union_interests_or_fall_back() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![]);
    let planner = QueryPlanner::new(&source, &catalog);

    let mut ctx = context("$11-49");
    ctx.interests = vec!["Home & Decor".to_string(), "Tech & Gadgets".to_string()];
    assert_eq!(
        planner.keywords(&ctx),
        "aroma diffuser led strip desk lamp mini projector smart lamp earbuds power bank"
    );

    ctx.interests = vec!["Unknown".to_string()];
    assert_eq!(planner.keywords(&ctx), "gift present");
}

#[tokio::test]
async fn ladder_stops_at_first_non_empty_step() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![
        Ok(vec![]),
        Ok(items(&[("a", 60.0), ("b", 70.0)])),
        Ok(items(&[("never", 1.0)])),
    ]);
    let planner = QueryPlanner::new(&source, &catalog);

    let outcome = planner.fetch(&context("$50-99")).await.unwrap();

    assert_eq!(outcome.step, Some(LadderStep::NoShipping));
    assert_eq!(outcome.items.len(), 2);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn strict_success_makes_exactly_one_call() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![Ok(items(&[("a", 60.0)]))]);
    let planner = QueryPlanner::new(&source, &catalog);

    let outcome = planner.fetch(&context("$50-99")).await.unwrap();

    assert_eq!(outcome.step, Some(LadderStep::Strict));
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn exhausted_ladder_returns_empty_after_four_calls() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![]);
    let planner = QueryPlanner::new(&source, &catalog);

    let outcome = planner.fetch(&context("$50-99")).await.unwrap();

    assert!(outcome.items.is_empty());
    assert!(outcome.step.is_none());
    assert!(outcome.errors.is_empty());
    assert_eq!(source.calls().len(), 4);
}

#[tokio::test]
async fn failing_step_is_recorded_and_ladder_continues() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![
        Err(transport_error()),
        Ok(vec![]),
        Ok(items(&[("a", 55.0)])),
    ]);
    let planner = QueryPlanner::new(&source, &catalog);

    let outcome = planner.fetch(&context("$50-99")).await.unwrap();

    assert_eq!(outcome.step, Some(LadderStep::DefaultLanguage));
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("strict: upstream HTTP 503"));
}

#[tokio::test]
async fn configuration_error_aborts_ladder() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![Err(config_error())]);
    let planner = QueryPlanner::new(&source, &catalog);

    let err = planner.fetch(&context("$50-99")).await.unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn rescue_issues_single_query() {
    let catalog = Catalog::builtin();
    let source = FakeSource::new(vec![Ok(items(&[("r", 120.0)]))]);
    let planner = QueryPlanner::new(&source, &catalog);

    let outcome = planner.rescue(&context("$100-499")).await.unwrap();

    assert_eq!(outcome.step, Some(LadderStep::Rescue));
    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sort, Some(SortOrder::SalePriceAsc));
}
