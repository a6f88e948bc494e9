/// Configuration management for post-service
///
/// Loaded once at startup from environment variables (nested keys use `__`, e.g.
/// `DATABASE__URL`) on top of development defaults, then passed explicitly into the
/// components that need it.
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Moderation/admin service notified on post creation
    pub admin_service: ServiceEndpoint,
    /// Scheduler that activates promotions at their dates
    pub agent_service: ServiceEndpoint,
    pub image_store: ImageStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for multipart uploads, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ServiceEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageStoreConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Overrides the upload endpoint derived from `cloud_name`
    pub upload_url: Option<String>,
    pub timeout_ms: u64,
}

impl ImageStoreConfig {
    pub fn upload_endpoint(&self) -> String {
        self.upload_url.clone().unwrap_or_else(|| {
            format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                self.cloud_name
            )
        })
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            config::Config::builder()
                .add_source(config::Environment::default().separator("__")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.max_upload_bytes", 8 * 1024 * 1024)?
            .set_default("database.url", "postgres://localhost/posts")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 5)?
            .set_default("auth.jwt_secret", "development-secret-change-in-production")?
            .set_default("admin_service.base_url", "http://gateway:8000")?
            .set_default("admin_service.timeout_ms", 5000)?
            .set_default("agent_service.base_url", "http://gateway:8000")?
            .set_default("agent_service.timeout_ms", 5000)?
            .set_default("image_store.cloud_name", "")?
            .set_default("image_store.api_key", "")?
            .set_default("image_store.api_secret", "")?
            .set_default("image_store.timeout_ms", 30000)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
