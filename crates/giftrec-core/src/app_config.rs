use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub ae_app_key: Option<String>,
    pub ae_app_secret: Option<String>,
    pub ae_tracking_id: Option<String>,
    pub ae_gateway_url: String,
    pub upstream_timeout_secs: u64,
    pub user_agent: String,
    pub max_pages: u32,
    pub target_items: usize,
    pub catalog_path: Option<PathBuf>,
    pub diagnostics_enabled: bool,
}

impl AppConfig {
    /// `true` when all three upstream credentials are present.
    #[must_use]
    pub fn upstream_configured(&self) -> bool {
        self.ae_app_key.is_some() && self.ae_app_secret.is_some() && self.ae_tracking_id.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "ae_app_key",
                &self.ae_app_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "ae_app_secret",
                &self.ae_app_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "ae_tracking_id",
                &self.ae_tracking_id.as_ref().map(|_| "[redacted]"),
            )
            .field("ae_gateway_url", &self.ae_gateway_url)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_pages", &self.max_pages)
            .field("target_items", &self.target_items)
            .field("catalog_path", &self.catalog_path)
            .field("diagnostics_enabled", &self.diagnostics_enabled)
            .finish()
    }
}
