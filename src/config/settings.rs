use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gateway settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Transport listener
    pub server: ServerSettings,
    /// Worker pool per job class
    pub pools: PoolSettings,
    /// Session timing per job class
    pub sessions: SessionSettings,
    /// Interface collection
    pub interfaces: InterfaceSettings,
    /// Device port used when a job does not name one
    pub default_port: DefaultPort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSizing {
    /// Concurrent workers
    pub workers: usize,
    /// Bounded queue depth; a full queue blocks the submitter
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub discovery: PoolSizing,
    pub polling: PoolSizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionTiming {
    /// Per-call timeout (milliseconds)
    pub timeout_ms: u64,
    /// Retries after the first attempt
    pub retries: u32,
}

impl SessionTiming {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub discovery: SessionTiming,
    pub polling: SessionTiming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceSettings {
    /// Upper bound of simultaneous per-interface fetches in one job
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultPort(pub u16);

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5555".to_string(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            discovery: PoolSizing {
                workers: 5,
                queue_capacity: 64,
            },
            polling: PoolSizing {
                workers: 10,
                queue_capacity: 256,
            },
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            discovery: SessionTiming {
                timeout_ms: 500,
                retries: 0,
            },
            polling: SessionTiming {
                timeout_ms: 2000,
                retries: 2,
            },
        }
    }
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self { max_in_flight: 8 }
    }
}

impl Default for DefaultPort {
    fn default() -> Self {
        Self(161)
    }
}
