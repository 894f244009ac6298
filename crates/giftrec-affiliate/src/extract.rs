//! Locating the product list inside a gateway response.
//!
//! The payload shape differs between API versions and accounts: the list can
//! sit under a namespaced response wrapper, a bare `result`, or `data`, and the
//! wrapper value is sometimes a JSON document encoded as a string. Known paths
//! are tried first; a bounded tree walk is the safety net. Every failure mode
//! ends in an empty list, never an error.

use serde_json::Value;

/// Maximum nesting depth the fallback walk descends to.
pub const MAX_SEARCH_DEPTH: usize = 6;

/// Wrapper locations, in priority order. The body itself is the last resort.
const WRAPPER_PATHS: &[&[&str]] = &[
    &[
        "aliexpress_affiliate_product_query_response",
        "resp_result",
        "result",
    ],
    &["aliexpress_affiliate_product_query_response", "result"],
    &["result"],
    &["data"],
];

/// List locations inside the unwrapped payload, in priority order.
const LIST_PATHS: &[&[&str]] = &[
    &["result_list", "products", "product"],
    &["result_list", "products"],
    &["result_list", "product"],
    &["result_list"],
    &["products", "product"],
    &["products"],
    &["items"],
];

/// Keys whose presence marks an object as a product record.
const PRODUCT_MARKERS: &[&str] = &[
    "product_id",
    "item_id",
    "product_title",
    "title",
    "item_title",
];

/// Returns the product records found in a gateway response body, or an
/// empty list when nothing usable is present.
#[must_use]
pub fn extract_products(body: &Value) -> Vec<Value> {
    let payload = unwrap_payload(body);

    for path in LIST_PATHS {
        if let Some(Value::Array(list)) = lookup_path(&payload, path) {
            return list.clone();
        }
    }

    find_array(&payload, MAX_SEARCH_DEPTH, looks_like_product)
        .cloned()
        .unwrap_or_default()
}

/// Picks the first defined wrapper value and decodes it once more if it is
/// a JSON-encoded string. Undecodable strings are kept as-is.
fn unwrap_payload(body: &Value) -> Value {
    let node = WRAPPER_PATHS
        .iter()
        .find_map(|path| lookup_path(body, path).filter(|v| !v.is_null()))
        .unwrap_or(body);

    match node {
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| node.clone()),
        other => other.clone(),
    }
}

/// Follows a sequence of object keys.
pub(crate) fn lookup_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

/// `true` for an object that carries an id-like or title-like field.
#[must_use]
pub fn looks_like_product(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| PRODUCT_MARKERS.iter().any(|key| obj.contains_key(*key)))
}

/// Depth-limited search for the first array whose first element satisfies
/// `predicate`.
///
/// The root sits at depth 0; nodes deeper than `max_depth` are not visited.
/// Object members are visited in key order. Arrays that fail the predicate
/// are still descended into, since wrapper arrays sometimes hold the real
/// list one level down.
pub fn find_array<P>(value: &Value, max_depth: usize, predicate: P) -> Option<&Vec<Value>>
where
    P: Fn(&Value) -> bool + Copy,
{
    find_array_at(value, 0, max_depth, predicate)
}

fn find_array_at<P>(
    value: &Value,
    depth: usize,
    max_depth: usize,
    predicate: P,
) -> Option<&Vec<Value>>
where
    P: Fn(&Value) -> bool + Copy,
{
    if depth > max_depth {
        return None;
    }

    match value {
        Value::Array(items) => {
            if items.first().is_some_and(predicate) {
                return Some(items);
            }
            items
                .iter()
                .find_map(|item| find_array_at(item, depth + 1, max_depth, predicate))
        }
        Value::Object(map) => map
            .values()
            .find_map(|child| find_array_at(child, depth + 1, max_depth, predicate)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
