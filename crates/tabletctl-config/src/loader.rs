//! Configuration loader with multi-source merging.

use crate::{NameServerConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Layered loader: built-in defaults → user config → project config →
/// local override → environment variables, each source taking
/// precedence over the last.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "TABLETCTL".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(self) -> Result<NameServerConfig> {
        let mut builder = config::Config::builder();

        let defaults = NameServerConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build().context("failed to build configuration")?;

        let config: NameServerConfig = built
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        Ok(config)
    }

    pub fn load_or_default(self) -> NameServerConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_built_in_defaults_with_no_files_present() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("failed to load config");

        assert_eq!(config.scheduler.task_concurrency, 8);
        assert_eq!(config.rpc.bind_address, "127.0.0.1:9527");
    }

    #[test]
    fn project_config_overrides_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("tabletctl.toml"),
            r#"
[coordination]
endpoints = "zk1:2181,zk2:2181"

[scheduler]
task_concurrency = 16
"#,
        )
        .expect("failed to write project config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert_eq!(config.coordination.endpoints, "zk1:2181,zk2:2181");
        assert_eq!(config.scheduler.task_concurrency, 16);
    }

    #[test]
    fn local_config_overrides_project_config() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("tabletctl.toml"),
            "[rpc]\nbind_address = \"0.0.0.0:9527\"\n",
        )
        .expect("failed to write project config");
        fs::write(
            project_dir.join("tabletctl.local.toml"),
            "[rpc]\nbind_address = \"127.0.0.1:19527\"\n",
        )
        .expect("failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert_eq!(config.rpc.bind_address, "127.0.0.1:19527");
    }

    // Environment variable precedence (TABLETCTL_SCHEDULER_TASK_CONCURRENCY=N)
    // is exercised by integration tests in tabletctl-server, since the
    // `config` crate's environment source reads process-global state that
    // unit tests within one binary cannot safely isolate from each other.
}
