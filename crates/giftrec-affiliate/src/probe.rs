//! Shape introspection of a live gateway response, for manual debugging.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::client::AffiliateClient;
use crate::error::AffiliateError;
use crate::extract::extract_products;
use crate::normalize::{resolve, ALIASES};
use crate::types::SearchQuery;

/// Paths deeper than this are left out of [`ProbeReport::sizes`].
pub const MAX_SNAPSHOT_DEPTH: usize = 4;
const MAX_SAMPLE_KEYS: usize = 20;
const PRICED_MIN: f64 = 11.0;
const PRICED_MAX: f64 = 99.0;

/// Parameters of one probe call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRequest {
    pub keywords: String,
    pub lang: String,
    pub page: u32,
    pub ship: Option<String>,
    pub priced: bool,
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self {
            keywords: "gift present".to_string(),
            lang: "en".to_string(),
            page: 1,
            ship: None,
            priced: false,
        }
    }
}

impl ProbeRequest {
    #[must_use]
    pub fn to_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.keywords.clone());
        query.target_language = Some(self.lang.clone());
        query.page_no = self.page.max(1);
        query.ship_to_country = self.ship.clone();
        if self.priced {
            query.min_price = Some(PRICED_MIN);
            query.max_price = Some(PRICED_MAX);
        }
        query
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub meta: ProbeRequest,
    /// Array lengths keyed by dotted JSON path.
    pub sizes: BTreeMap<String, usize>,
    pub found_count: usize,
    pub sample_keys: Vec<String>,
    pub sample_title: Option<String>,
}

/// Runs one raw query and summarizes where the arrays in the body are and
/// what the first product record looks like.
///
/// # Errors
///
/// Any [`AffiliateError`] from the underlying call.
pub async fn probe(
    client: &AffiliateClient,
    request: &ProbeRequest,
) -> Result<ProbeReport, AffiliateError> {
    let body = client.query_raw(&request.to_query()).await?;
    Ok(summarize(request.clone(), &body))
}

pub(crate) fn summarize(meta: ProbeRequest, body: &Value) -> ProbeReport {
    let products = extract_products(body);
    let first = products.first();

    let sample_keys = first
        .and_then(Value::as_object)
        .map(|obj| obj.keys().take(MAX_SAMPLE_KEYS).cloned().collect())
        .unwrap_or_default();

    let sample_title = first
        .and_then(|record| resolve(record, ALIASES.title))
        .and_then(Value::as_str)
        .map(str::to_string);

    ProbeReport {
        meta,
        sizes: array_sizes(body, MAX_SNAPSHOT_DEPTH),
        found_count: products.len(),
        sample_keys,
        sample_title,
    }
}

/// Records the length of every array reachable within `max_depth` levels.
/// The root array, if any, is keyed `$`.
#[must_use]
pub fn array_sizes(body: &Value, max_depth: usize) -> BTreeMap<String, usize> {
    let mut sizes = BTreeMap::new();
    walk(body, "$", 0, max_depth, &mut sizes);
    sizes
}

fn walk(
    value: &Value,
    path: &str,
    depth: usize,
    max_depth: usize,
    sizes: &mut BTreeMap<String, usize>,
) {
    if depth > max_depth {
        return;
    }
    match value {
        Value::Array(items) => {
            sizes.insert(path.to_string(), items.len());
            if let Some(first) = items.first() {
                walk(first, &format!("{path}[0]"), depth + 1, max_depth, sizes);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path == "$" {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, &child_path, depth + 1, max_depth, sizes);
            }
        }
        _ => {}
    }
}
