use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Currency assumed when an upstream record carries none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Stock "why this fits" line per front-end locale.
pub const WHY_BLURBS: [(&str, &str); 2] = [
    ("ru", "Под интересы и бюджет. Доставка в ваш регион."),
    (
        "pt-BR",
        "Alinha interesses e orçamento. Envio para sua região.",
    ),
];

/// [`WHY_BLURBS`] keyed by locale.
#[must_use]
pub fn default_why() -> BTreeMap<String, String> {
    WHY_BLURBS
        .iter()
        .map(|(lang, text)| ((*lang).to_string(), (*text).to_string()))
        .collect()
}

/// A product normalized into the shape the quiz front-end renders.
///
/// Only emitted when title, image and affiliate URL are non-empty and the
/// price parsed to a finite, non-negative number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// Upstream product id, or a random UUID when the record had none.
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: Price,
    pub merchant: String,
    /// Constant tag naming the upstream, e.g. `"aliexpress"`.
    pub source: String,
    pub url_aff: String,
    /// Catalog bucket label the price falls into; empty when none matches.
    #[serde(default)]
    pub budget_hint: String,
    /// Rendered by the front-end when known; the gateway never supplies one.
    #[serde(default)]
    pub delivery_estimate: Option<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Short localized blurb keyed by locale, e.g. `"pt-BR"`.
    #[serde(default)]
    pub why: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    /// ISO 4217 code, e.g. `"USD"`.
    pub currency: String,
    /// Pre-formatted label, e.g. `"$12.50"` or `"12.50 BRL"`.
    pub display: String,
}

impl Price {
    /// Builds a price with its display string.
    #[must_use]
    pub fn new(value: f64, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let display = format_price(value, &currency);
        Self {
            value,
            currency,
            display,
        }
    }
}

/// Formats a price for display: symbol-prefixed for the default currency,
/// `"<value> <CODE>"` for everything else.
#[must_use]
pub fn format_price(value: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case(DEFAULT_CURRENCY) {
        format!("${value:.2}")
    } else {
        format!("{value:.2} {currency}")
    }
}
