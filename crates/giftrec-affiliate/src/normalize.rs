//! Normalization of raw gateway product records into [`CanonicalItem`]s.
//!
//! Field names drift between API versions, so every canonical field is
//! resolved through an ordered alias table. Records missing a title, image,
//! affiliate URL or parseable price are dropped; that is routine and not
//! logged as an error.

use giftrec_core::{default_why, CanonicalItem, Price, DEFAULT_CURRENCY};
use serde_json::Value;

pub const MERCHANT: &str = "AliExpress";
pub const SOURCE_TAG: &str = "aliexpress";

/// A lookup location: object keys, where a numeric segment indexes an array.
pub type FieldPath = &'static [&'static str];

/// Ordered aliases for each canonical field. The first non-empty hit wins.
pub struct AliasTable {
    pub id: &'static [FieldPath],
    pub title: &'static [FieldPath],
    pub image: &'static [FieldPath],
    pub price: &'static [FieldPath],
    pub currency: &'static [FieldPath],
    pub url: &'static [FieldPath],
}

pub const ALIASES: AliasTable = AliasTable {
    id: &[&["product_id"], &["item_id"]],
    title: &[
        &["product_title"],
        &["title"],
        &["item_title"],
        &["subject"],
    ],
    image: &[
        &["product_main_image_url"],
        &["image_url"],
        &["product_image"],
        &["product_small_image_urls", "0"],
        &["product_small_image_urls", "string", "0"],
    ],
    price: &[
        &["target_sale_price"],
        &["sale_price"],
        &["app_sale_price"],
        &["original_price"],
    ],
    currency: &[
        &["target_sale_price_currency"],
        &["sale_price_currency"],
        &["currency"],
    ],
    url: &[
        &["promotion_link"],
        &["target_url"],
        &["product_detail_url"],
        &["detail_url"],
    ],
};

/// Converts one raw product record into a [`CanonicalItem`], or `None` when
/// a required field is missing or the price does not parse.
#[must_use]
pub fn normalize_product(raw: &Value) -> Option<CanonicalItem> {
    let title = resolve_text(raw, ALIASES.title)?;
    let image = resolve_text(raw, ALIASES.image)?;
    let url_aff = resolve_text(raw, ALIASES.url)?;
    let value = resolve(raw, ALIASES.price).and_then(parse_price)?;

    let currency = resolve_text(raw, ALIASES.currency)
        .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.to_ascii_uppercase());

    let id = resolve(raw, ALIASES.id)
        .and_then(value_to_text)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Some(CanonicalItem {
        id,
        title,
        image,
        price: Price::new(value, currency),
        merchant: MERCHANT.to_string(),
        source: SOURCE_TAG.to_string(),
        url_aff,
        budget_hint: String::new(),
        delivery_estimate: None,
        badges: Vec::new(),
        tags: Vec::new(),
        why: default_why(),
    })
}

/// Returns the first alias whose value is a non-blank string or a number.
#[must_use]
pub fn resolve<'a>(record: &'a Value, aliases: &[FieldPath]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|path| lookup(record, path))
        .find(|value| match value {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(_) => true,
            _ => false,
        })
}

fn resolve_text(record: &Value, aliases: &[FieldPath]) -> Option<String> {
    resolve(record, aliases).and_then(value_to_text)
}

fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |node, segment| match node {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => node.get(*segment),
    })
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses an upstream price into a non-negative finite number with at most
/// two decimals.
///
/// Numbers pass through. Strings keep only digits and periods (currency
/// symbols, spaces and thousands-separator commas are stripped) before
/// parsing. Extra decimals are cut, not rounded up: `"US $58.999"` is 58.99.
#[must_use]
pub fn parse_price(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => truncate_to_cents(n.as_f64()?),
        Value::String(s) => parse_price_text(s)?,
        _ => return None,
    };

    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

fn parse_price_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // Truncate in the text so binary float error cannot push 58.99 to 58.98.
    let cleaned = match cleaned.split_once('.') {
        Some((whole, fraction)) if !fraction.contains('.') => {
            format!("{whole}.{}", &fraction[..fraction.len().min(2)])
        }
        _ => cleaned,
    };

    cleaned.parse::<f64>().ok()
}

fn truncate_to_cents(value: f64) -> f64 {
    // The epsilon keeps values like 0.29 (stored as 0.28999…) at 0.29.
    ((value * 100.0) + 1e-6).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_record() -> Value {
        json!({
            "product_id": 1_005_006_123_456_i64,
            "product_title": "Mini Projector 1080p",
            "product_main_image_url": "https://ae01.example.com/p.jpg",
            "target_sale_price": "58.99",
            "target_sale_price_currency": "usd",
            "promotion_link": "https://s.click.example.com/e/_abc"
        })
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalizes_complete_record() {
        let item = normalize_product(&full_record()).expect("complete record normalizes");
        assert_eq!(item.id, "1005006123456");
        assert_eq!(item.title, "Mini Projector 1080p");
        assert_eq!(item.image, "https://ae01.example.com/p.jpg");
        assert!(approx(item.price.value, 58.99));
        assert_eq!(item.price.currency, "USD");
        assert_eq!(item.price.display, "$58.99");
        assert_eq!(item.merchant, "AliExpress");
        assert_eq!(item.source, "aliexpress");
        assert_eq!(item.url_aff, "https://s.click.example.com/e/_abc");
        assert!(item.delivery_estimate.is_none());
        assert!(item.badges.is_empty() && item.tags.is_empty());
        assert_eq!(item.why.len(), 2);
        assert!(item.why.contains_key("ru"));
    }

    #[test]
    fn drops_record_missing_required_fields() {
        for key in [
            "product_title",
            "product_main_image_url",
            "promotion_link",
            "target_sale_price",
        ] {
            let mut record = full_record();
            record.as_object_mut().unwrap().remove(key);
            assert!(
                normalize_product(&record).is_none(),
                "record without {key} should be dropped"
            );
        }
    }

    #[test]
    fn drops_record_with_unparseable_price() {
        let mut record = full_record();
        record["target_sale_price"] = json!("free");
        assert!(normalize_product(&record).is_none());
    }

    #[test]
    fn blank_alias_falls_through_to_next() {
        let record = json!({
            "product_title": "  ",
            "title": "Scratch Map",
            "product_small_image_urls": { "string": ["https://img.example.com/s.jpg"] },
            "sale_price": 12,
            "detail_url": "https://example.com/item/1"
        });
        let item = normalize_product(&record).expect("aliases resolve");
        assert_eq!(item.title, "Scratch Map");
        assert_eq!(item.image, "https://img.example.com/s.jpg");
        assert!(approx(item.price.value, 12.0));
        assert_eq!(item.url_aff, "https://example.com/item/1");
    }

    #[test]
    fn small_image_array_is_used_when_main_image_missing() {
        let mut record = full_record();
        record.as_object_mut().unwrap().remove("product_main_image_url");
        record["product_small_image_urls"] = json!(["https://img.example.com/0.jpg"]);
        let item = normalize_product(&record).unwrap();
        assert_eq!(item.image, "https://img.example.com/0.jpg");
    }

    #[test]
    fn missing_id_gets_random_value() {
        let mut record = full_record();
        record.as_object_mut().unwrap().remove("product_id");
        let a = normalize_product(&record).unwrap();
        let b = normalize_product(&record).unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn non_default_currency_uses_code_suffix() {
        let mut record = full_record();
        record["target_sale_price"] = json!("249,90");
        record["target_sale_price_currency"] = json!("BRL");
        let item = normalize_product(&record).unwrap();
        assert!(approx(item.price.value, 24_990.0));
        assert_eq!(item.price.display, "24990.00 BRL");
    }

    #[test]
    fn parse_price_strips_symbols_and_truncates() {
        assert_eq!(parse_price(&json!("US $58.999")), Some(58.99));
        assert_eq!(parse_price(&json!("$1,299.50")), Some(1299.5));
        assert_eq!(parse_price(&json!("R$ 0.29")), Some(0.29));
    }

    #[test]
    fn parse_price_passes_numbers_through() {
        assert_eq!(parse_price(&json!(15)), Some(15.0));
        assert_eq!(parse_price(&json!(0.29)), Some(0.29));
        assert_eq!(parse_price(&json!(12.345)), Some(12.34));
    }

    #[test]
    fn parse_price_rejects_garbage() {
        assert_eq!(parse_price(&json!("")), None);
        assert_eq!(parse_price(&json!("1.2.3")), None);
        assert_eq!(parse_price(&json!(null)), None);
        assert_eq!(parse_price(&json!(-4)), None);
    }
}
