//! Request-side types for the product query method.

use std::collections::BTreeMap;

/// Upstream result ordering accepted by the product query method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    VolumeDesc,
    SalePriceAsc,
}

impl SortOrder {
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::VolumeDesc => "VOLUME_DESC",
            SortOrder::SalePriceAsc => "SALE_PRICE_ASC",
        }
    }
}

/// Business parameters for one product query.
///
/// Every `Option` that is `None` is omitted from the request entirely rather
/// than being sent as an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub keywords: String,
    pub target_language: Option<String>,
    pub page_no: u32,
    pub page_size: u32,
    pub sort: Option<SortOrder>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub ship_to_country: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            target_language: None,
            page_no: 1,
            page_size: 20,
            sort: None,
            min_price: None,
            max_price: None,
            ship_to_country: None,
        }
    }

    /// Business parameters as the string map that gets signed and sent.
    /// `tracking_id` is added here because it travels with every query.
    pub(crate) fn to_params(&self, tracking_id: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("keywords".to_string(), self.keywords.clone());
        params.insert("page_no".to_string(), self.page_no.to_string());
        params.insert("page_size".to_string(), self.page_size.to_string());
        params.insert("tracking_id".to_string(), tracking_id.to_string());

        if let Some(lang) = non_empty(self.target_language.as_deref()) {
            params.insert("target_language".to_string(), lang.to_string());
        }
        if let Some(sort) = self.sort {
            params.insert("sort".to_string(), sort.as_param().to_string());
        }
        if let Some(min) = self.min_price.filter(|v| v.is_finite()) {
            params.insert("min_price".to_string(), format_amount(min));
        }
        if let Some(max) = self.max_price.filter(|v| v.is_finite()) {
            params.insert("max_price".to_string(), format_amount(max));
        }
        if let Some(country) = non_empty(self.ship_to_country.as_deref()) {
            params.insert("ship_to_country".to_string(), country.to_string());
        }

        params
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whole amounts without a fraction, everything else with two decimals.
fn format_amount(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// The three secrets every signed call needs.
#[derive(Clone)]
pub struct Credentials {
    pub app_key: String,
    pub app_secret: String,
    pub tracking_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &"[redacted]")
            .field("app_secret", &"[redacted]")
            .field("tracking_id", &"[redacted]")
            .finish()
    }
}
