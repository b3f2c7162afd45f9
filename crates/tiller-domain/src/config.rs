//! Domain controller configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`DomainController`](crate::DomainController).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Name this controller registers itself under.
    pub host_name: String,
    /// Directory holding the management content store; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Pause between teardown and coming back up during a reload, in
    /// milliseconds.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    /// Start in admin-only mode (slave registrations refused).
    #[serde(default)]
    pub admin_only: bool,
}

fn default_restart_delay_ms() -> u64 {
    500
}

impl DomainConfig {
    pub fn new(host_name: &str) -> Self {
        Self {
            host_name: host_name.to_string(),
            data_dir: None,
            restart_delay_ms: default_restart_delay_ms(),
            admin_only: false,
        }
    }

    /// Persist the plan store under the given directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the restart delay.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Start in admin-only mode.
    pub fn with_admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DomainConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DomainConfig::new("master");
        assert_eq!(config.host_name, "master");
        assert!(config.data_dir.is_none());
        assert_eq!(config.restart_delay(), Duration::from_millis(500));
        assert!(!config.admin_only);
    }

    #[test]
    fn builders() {
        let config = DomainConfig::new("master")
            .with_data_dir("/tmp/tiller")
            .with_restart_delay(Duration::from_millis(50))
            .with_admin_only(true);
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/tiller")));
        assert_eq!(config.restart_delay_ms, 50);
        assert!(config.admin_only);
    }

    #[test]
    fn parses_toml() {
        let config: DomainConfig = toml::from_str(
            r#"
            host_name = "master"
            restart_delay_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.host_name, "master");
        assert_eq!(config.restart_delay_ms, 250);
        assert!(!config.admin_only);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn from_file_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain.toml");
        std::fs::write(&path, "host_name = \"primary\"\nadmin_only = true\n").unwrap();

        let config = DomainConfig::from_file(&path).unwrap();
        assert_eq!(config.host_name, "primary");
        assert!(config.admin_only);
    }
}
