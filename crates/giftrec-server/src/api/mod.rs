mod diagnostics;
mod recommendations;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use giftrec_affiliate::AffiliateClient;
use giftrec_core::AppConfig;
use giftrec_recommend::Recommender;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, REQUEST_ID_HEADER};

/// Which upstream credentials are present. Values never leave the process,
/// only these flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPresence {
    pub app_key: bool,
    pub app_secret: bool,
    pub tracking_id: bool,
}

impl CredentialPresence {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            app_key: config.ae_app_key.is_some(),
            app_secret: config.ae_app_secret.is_some(),
            tracking_id: config.ae_tracking_id.is_some(),
        }
    }

    #[must_use]
    pub fn all(self) -> bool {
        self.app_key && self.app_secret && self.tracking_id
    }
}

/// Shared, read-only state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender<AffiliateClient>>,
    pub credentials: CredentialPresence,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct HealthData {
    status: &'static str,
    upstream_configured: bool,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "method_not_allowed" => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Builds the service router. The upstream probe is only mounted when
/// `diagnostics_enabled` is set.
pub fn build_app(state: AppState, diagnostics_enabled: bool) -> Router {
    let mut router = Router::new().route("/health", get(health)).route(
        "/recommendations",
        post(recommendations::recommend)
            .options(recommendations::preflight)
            .fallback(recommendations::method_not_allowed),
    );

    if diagnostics_enabled {
        router = router.route(
            "/diagnostics/upstream",
            get(diagnostics::probe_upstream).post(diagnostics::probe_upstream),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthData {
        status: "ok",
        upstream_configured: state.recommender.source().is_configured(),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
