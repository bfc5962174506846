use std::time::Duration;

use common::storage::memory::DEFAULT_MAX_IMAGE_SIZE;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_root: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Basic auth is enforced only when a user is configured.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub edit_window_secs: u64,
    pub max_image_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    /// Zero disables the reaper.
    pub ttl_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub images: ImageConfig,
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.api_root", "/")?
            .set_default("store.edit_window_secs", 300)?
            .set_default("store.max_image_size", DEFAULT_MAX_IMAGE_SIZE)?
            .set_default("images.ttl_secs", 0)?
            .set_default("images.cleanup_interval_secs", 60)?
            .set_default("debug", false)?
            // Load from config/memstore.toml unless --config points elsewhere
            .add_source(File::with_name(&cli.config.to_string_lossy()).required(false))
            // Override from environment (e.g., MEMSTORE__AUTH__SECRET)
            .add_source(Environment::with_prefix("MEMSTORE").separator("__"))
            .set_override_option("server.host", cli.host.clone())?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.api_root", cli.api_root.clone())?
            .set_override_option("auth.user", cli.auth_user.clone())?
            .set_override_option("auth.password", cli.auth_passwd.clone())?
            .set_override_option("auth.secret", cli.secret.clone())?
            .set_override_option("store.edit_window_secs", cli.edit_window)?
            .set_override_option("store.max_image_size", cli.max_image_size)?
            .set_override_option("images.ttl_secs", cli.image_ttl)?
            .set_override_option("images.cleanup_interval_secs", cli.cleanup_interval)?
            .set_override_option("debug", cli.debug.then_some(true))?
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "a secret is required (--secret or SECRET)".into(),
            ));
        }
        if self.auth.user.as_deref().is_some_and(str::is_empty) {
            self.auth.user = None;
        }
        if self.images.cleanup_interval_secs == 0 {
            return Err(ConfigError::Message(
                "cleanup interval must be at least one second".into(),
            ));
        }
        let root = self.server.api_root.trim();
        self.server.api_root = if root.starts_with('/') {
            root.to_string()
        } else {
            format!("/{root}")
        };
        Ok(())
    }

    pub fn edit_window(&self) -> Duration {
        Duration::from_secs(self.store.edit_window_secs)
    }

    /// Reaper retention, `None` when the reaper is off.
    pub fn image_ttl(&self) -> Option<Duration> {
        (self.images.ttl_secs > 0).then(|| Duration::from_secs(self.images.ttl_secs))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.images.cleanup_interval_secs)
    }

    /// Settings for an in-process server, mostly for tests.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                api_root: "/".into(),
            },
            auth: AuthConfig {
                secret: secret.into(),
                ..AuthConfig::default()
            },
            store: StoreConfig {
                edit_window_secs: 300,
                max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            },
            images: ImageConfig {
                ttl_secs: 0,
                cleanup_interval_secs: 60,
            },
            debug: false,
        }
    }
}
