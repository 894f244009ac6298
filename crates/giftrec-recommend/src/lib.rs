pub mod budget;
pub mod orchestrator;
pub mod planner;
pub mod source;

pub use budget::{filter_by_budget, nearest_to_floor, Stage};
pub use orchestrator::{
    parse_request, DebugReport, RecommendResponse, RecommendSettings, Recommender,
};
pub use planner::{LadderOutcome, LadderStep, QueryContext, QueryPlanner};
pub use source::ProductSource;

#[cfg(test)]
pub(crate) mod test_support;
