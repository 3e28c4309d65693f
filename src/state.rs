use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::clients::gemini::GeminiClient;
use crate::clients::mailer::{HttpMailer, Mailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AdminAuthService, AnalysisService, MediaStore};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client is reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("CivicWatch/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub media: Arc<MediaStore>,

    pub analysis: Arc<AnalysisService>,

    pub admin_auth: Arc<AdminAuthService>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn media(&self) -> &Arc<MediaStore> {
        &self.media
    }

    #[must_use]
    pub const fn analysis(&self) -> &Arc<AnalysisService> {
        &self.analysis
    }

    #[must_use]
    pub const fn admin_auth(&self) -> &Arc<AdminAuthService> {
        &self.admin_auth
    }
}

/// Wires the state together with an explicit mail transport; tests inject
/// a capturing one here.
pub async fn create_app_state_with_mailer(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let http_client = build_shared_http_client(config.gemini.request_timeout_seconds)?;

    let media = Arc::new(MediaStore::new(
        &config.general.media_path,
        &config.server.public_base_url,
    ));

    let gemini = Arc::new(GeminiClient::with_shared_client(
        http_client.clone(),
        config.gemini.api_key.clone(),
    ));

    let analysis = Arc::new(AnalysisService::new(
        http_client,
        gemini,
        config.gemini.models.clone(),
        store.clone(),
    ));

    let admin_auth = Arc::new(AdminAuthService::new(
        store.clone(),
        mailer,
        config.auth.code_ttl_minutes,
        config.auth.session_ttl_minutes,
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        media,
        analysis,
        admin_auth,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let mail_client = build_shared_http_client(config.email.send_timeout_seconds)?;
    let mailer = Arc::new(HttpMailer::with_shared_client(
        mail_client,
        config.email.clone(),
    ));

    create_app_state_with_mailer(config, prometheus_handle, mailer).await
}
