//! HTTP client for the affiliate gateway's product query method.
//!
//! Wraps `reqwest` with request signing, credential management, and the
//! gateway's error envelope. Product lists are located by
//! [`crate::extract`] and normalized by [`crate::normalize`].

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use giftrec_core::{AppConfig, CanonicalItem};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::AffiliateError;
use crate::extract::extract_products;
use crate::normalize::normalize_product;
use crate::sign::{gateway_timestamp, sign_params};
use crate::types::{Credentials, SearchQuery};

pub const PRODUCT_QUERY_METHOD: &str = "aliexpress.affiliate.product.query";
const SIGN_METHOD: &str = "md5";
const RESPONSE_FORMAT: &str = "json";
const PROTOCOL_VERSION: &str = "1.0";

/// Client for the affiliate gateway.
///
/// Credentials are optional at construction time: a client without them
/// answers every call with [`AffiliateError::Configuration`] before touching
/// the network, so a misconfigured deployment still serves (empty) results.
pub struct AffiliateClient {
    client: Client,
    gateway_url: Url,
    credentials: Option<Credentials>,
    missing: Vec<&'static str>,
}

impl AffiliateClient {
    /// Creates a client from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`AffiliateError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AffiliateError::Configuration`] if the gateway URL is
    /// invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, AffiliateError> {
        let mut missing = Vec::new();
        if config.ae_app_key.is_none() {
            missing.push("AE_APP_KEY");
        }
        if config.ae_app_secret.is_none() {
            missing.push("AE_APP_SECRET");
        }
        if config.ae_tracking_id.is_none() {
            missing.push("AE_TRACKING_ID");
        }

        let credentials = match (
            &config.ae_app_key,
            &config.ae_app_secret,
            &config.ae_tracking_id,
        ) {
            (Some(app_key), Some(app_secret), Some(tracking_id)) => Some(Credentials {
                app_key: app_key.clone(),
                app_secret: app_secret.clone(),
                tracking_id: tracking_id.clone(),
            }),
            _ => None,
        };

        let mut client = Self::with_gateway(
            &config.ae_gateway_url,
            credentials,
            config.upstream_timeout_secs,
            &config.user_agent,
        )?;
        client.missing = missing;
        Ok(client)
    }

    /// Creates a client against an explicit gateway URL (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AffiliateError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AffiliateError::Configuration`] if `gateway_url` is not a
    /// valid URL.
    pub fn with_gateway(
        gateway_url: &str,
        credentials: Option<Credentials>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, AffiliateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        let gateway_url = Url::parse(gateway_url).map_err(|e| {
            AffiliateError::Configuration(format!("invalid gateway URL '{gateway_url}': {e}"))
        })?;

        let missing = if credentials.is_some() {
            Vec::new()
        } else {
            vec!["AE_APP_KEY", "AE_APP_SECRET", "AE_TRACKING_ID"]
        };

        Ok(Self {
            client,
            gateway_url,
            credentials,
            missing,
        })
    }

    /// `true` when all credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Runs one product query and returns the normalized items.
    ///
    /// Records that fail normalization are dropped silently; an unrecognized
    /// payload shape yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`AffiliateError::Configuration`] if credentials are missing.
    /// - [`AffiliateError::Transport`] on a non-2xx HTTP status.
    /// - [`AffiliateError::Upstream`] if the body carries an error envelope.
    /// - [`AffiliateError::Http`] on network failure or timeout.
    /// - [`AffiliateError::Deserialize`] if the body is not JSON.
    pub async fn search_products(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CanonicalItem>, AffiliateError> {
        let body = self.query_raw(query).await?;
        let raw = extract_products(&body);
        let items: Vec<CanonicalItem> = raw.iter().filter_map(normalize_product).collect();

        tracing::debug!(
            page = query.page_no,
            raw = raw.len(),
            normalized = items.len(),
            "upstream product query completed"
        );

        Ok(items)
    }

    /// Runs one product query and returns the raw response body, already
    /// checked for an error envelope.
    ///
    /// # Errors
    ///
    /// Same as [`Self::search_products`].
    pub async fn query_raw(&self, query: &SearchQuery) -> Result<Value, AffiliateError> {
        let credentials = self.credentials()?;
        let business = query.to_params(&credentials.tracking_id);
        self.call(PRODUCT_QUERY_METHOD, business, credentials).await
    }

    fn credentials(&self) -> Result<&Credentials, AffiliateError> {
        self.credentials.as_ref().ok_or_else(|| {
            AffiliateError::Configuration(format!("missing {}", self.missing.join(", ")))
        })
    }

    /// Signs and POSTs one gateway call.
    async fn call(
        &self,
        method: &str,
        business: BTreeMap<String, String>,
        credentials: &Credentials,
    ) -> Result<Value, AffiliateError> {
        let form = signed_form(method, business, credentials, Utc::now());

        let response = self
            .client
            .post(self.gateway_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AffiliateError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| AffiliateError::Deserialize {
                context: method.to_string(),
                source: e,
            })?;

        check_error_envelope(&body)?;
        Ok(body)
    }
}

/// Merges the fixed protocol fields into the business parameters and
/// appends the signature.
pub(crate) fn signed_form(
    method: &str,
    business: BTreeMap<String, String>,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let mut params = business;
    params.insert("method".to_string(), method.to_string());
    params.insert("app_key".to_string(), credentials.app_key.clone());
    params.insert("sign_method".to_string(), SIGN_METHOD.to_string());
    params.insert("format".to_string(), RESPONSE_FORMAT.to_string());
    params.insert("v".to_string(), PROTOCOL_VERSION.to_string());
    params.insert("timestamp".to_string(), gateway_timestamp(now));

    let sign = sign_params(&params, &credentials.app_secret);
    params.insert("sign".to_string(), sign);
    params
}

/// Returns [`AffiliateError::Upstream`] when the body carries an
/// `error_response` envelope. The envelope takes precedence over any data.
pub(crate) fn check_error_envelope(body: &Value) -> Result<(), AffiliateError> {
    let Some(envelope) = body.get("error_response").filter(|v| !v.is_null()) else {
        return Ok(());
    };

    let text_field = |key: &str| {
        envelope
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let message = text_field("sub_msg")
        .or_else(|| text_field("msg"))
        .unwrap_or_else(|| {
            serde_json::to_string(envelope).unwrap_or_else(|_| "unknown error".to_string())
        });

    Err(AffiliateError::Upstream(message))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
