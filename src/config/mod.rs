use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod settings;

pub use settings::{PoolSizing, SessionTiming, Settings};

pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config/gateway.yaml";

/// Highest retry budget a session may be configured with
pub const MAX_RETRIES: u32 = 3;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Loads configuration from a YAML file; a missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            serde_yml::from_str::<AppConfig>(&content)
                .with_context(|| format!("cannot parse YAML in {}", path.display()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Path from `GATEWAY_CONFIG`, or the default location
    pub fn default_path() -> String {
        env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(listen) = env::var("GATEWAY_LISTEN") {
            self.settings.server.listen = listen;
        }
        if let Some(workers) = env_usize("GATEWAY_DISCOVERY_WORKERS")? {
            self.settings.pools.discovery.workers = workers;
        }
        if let Some(workers) = env_usize("GATEWAY_POLLING_WORKERS")? {
            self.settings.pools.polling.workers = workers;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        for (name, pool) in [("discovery", &s.pools.discovery), ("polling", &s.pools.polling)] {
            if pool.workers == 0 {
                bail!("{} pool needs at least one worker", name);
            }
            if pool.queue_capacity == 0 {
                bail!("{} queue capacity must be positive", name);
            }
        }
        for (name, timing) in [
            ("discovery", &s.sessions.discovery),
            ("polling", &s.sessions.polling),
        ] {
            if timing.timeout_ms == 0 {
                bail!("{} session timeout must be positive", name);
            }
            if timing.retries > MAX_RETRIES {
                bail!(
                    "{} session retries {} exceed the limit of {}",
                    name,
                    timing.retries,
                    MAX_RETRIES
                );
            }
        }
        if s.interfaces.max_in_flight == 0 {
            bail!("interfaces.max_in_flight must be positive");
        }
        if s.default_port.0 == 0 {
            bail!("default_port must be positive");
        }
        Ok(())
    }

    pub fn get_listen(&self) -> &str {
        &self.settings.server.listen
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a positive integer, got '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}
