//! In-memory [`ProductSource`] used by the planner and orchestrator tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use giftrec_affiliate::{AffiliateError, SearchQuery};
use giftrec_core::{CanonicalItem, Price};

use crate::source::ProductSource;

/// Answers queries from a script of canned results, in order, and records
/// every query. Once the script runs out it answers with an empty list.
pub(crate) struct FakeSource {
    script: Mutex<VecDeque<Result<Vec<CanonicalItem>, AffiliateError>>>,
    calls: Mutex<Vec<SearchQuery>>,
}

impl FakeSource {
    pub(crate) fn new(script: Vec<Result<Vec<CanonicalItem>, AffiliateError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProductSource for FakeSource {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<CanonicalItem>, AffiliateError>> + Send {
        self.calls.lock().unwrap().push(query.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        async move { next }
    }
}

pub(crate) fn item(id: &str, price: f64) -> CanonicalItem {
    CanonicalItem {
        id: id.to_string(),
        title: format!("Item {id}"),
        image: format!("https://img.example.com/{id}.jpg"),
        price: Price::new(price, "USD"),
        merchant: "AliExpress".to_string(),
        source: "aliexpress".to_string(),
        url_aff: format!("https://s.click.example.com/{id}"),
        budget_hint: String::new(),
        delivery_estimate: None,
        badges: Vec::new(),
        tags: Vec::new(),
        why: std::collections::BTreeMap::new(),
    }
}

pub(crate) fn items(prices: &[(&str, f64)]) -> Vec<CanonicalItem> {
    prices.iter().map(|(id, p)| item(id, *p)).collect()
}

pub(crate) fn transport_error() -> AffiliateError {
    AffiliateError::Transport {
        status: 503,
        body: "busy".to_string(),
    }
}

pub(crate) fn config_error() -> AffiliateError {
    AffiliateError::Configuration("missing AE_APP_KEY".to_string())
}
