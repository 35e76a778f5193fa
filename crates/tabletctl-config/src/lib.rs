//! Configuration for the tabletctl name server.
//!
//! Hierarchical loading from multiple sources, lowest to highest
//! precedence:
//! 1. Built-in defaults
//! 2. `~/.config/tabletctl/config.toml` (user defaults)
//! 3. `tabletctl.toml` (git-tracked, project config)
//! 4. `tabletctl.local.toml` (gitignored, local overrides)
//! 5. `TABLETCTL_*` environment variables (highest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level name server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameServerConfig {
    pub coordination: CoordinationConfig,
    pub scheduler: SchedulerConfig,
    pub reconciler: ReconcilerConfig,
    pub rpc: RpcConfig,
}

/// C1 coordination-service client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// Comma-separated ensemble member addresses.
    pub endpoints: String,
    /// Root znode/prefix this name server's cluster is rooted under.
    pub root_path: String,
    /// Interval between session keep-alive checks.
    pub keep_alive_check_interval_secs: u64,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            endpoints: "127.0.0.1:2181".to_string(),
            root_path: "/tabletctl".to_string(),
            keep_alive_check_interval_secs: 1,
        }
    }
}

/// C6 OP scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of shard workers (and shard mutexes) for locally owned OPs.
    pub task_concurrency: u32,
    /// Number of shard workers dedicated to OPs driven by a replica
    /// cluster handshake, kept separate so a slow peer cluster cannot
    /// starve local scheduling.
    pub task_concurrency_for_replica_cluster: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_concurrency: 8,
            task_concurrency_for_replica_cluster: 4,
        }
    }
}

/// C7 reconciler periodic-job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// How long a `Done`/`Failed`/`Canceled` OP is kept under `/op_data`
    /// before `DeleteDoneOP` reclaims it.
    pub done_op_retention_secs: u64,
    /// Interval between `SchedMakeSnapshot` sweeps.
    pub snapshot_interval_secs: u64,
    /// Interval between `CheckClusterInfo` peer-health refreshes.
    pub cluster_check_interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            done_op_retention_secs: 86_400,
            snapshot_interval_secs: 21_600,
            cluster_check_interval_secs: 5,
        }
    }
}

/// Admin RPC surface settings (C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub bind_address: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9527".to_string(),
        }
    }
}

impl NameServerConfig {
    /// Load configuration from default locations relative to the
    /// current directory.
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration rooted at a specific project directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = NameServerConfig::default();
        assert_eq!(config.coordination.root_path, "/tabletctl");
        assert!(config.scheduler.task_concurrency > 0);
        assert!(config.scheduler.task_concurrency_for_replica_cluster > 0);
        assert_eq!(config.rpc.bind_address, "127.0.0.1:9527");
    }
}
