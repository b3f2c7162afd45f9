//! The slave agent run loop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use tiller_client::{ClientConfig, ClientError, Connector, ManagementClient};
use tiller_model::ManagementOperation;

/// Configuration for a slave agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name this host controller registers under.
    pub host_name: String,
    /// Delay between reconnect attempts after a channel loss.
    pub reconnect_delay: Duration,
    /// How long after a channel loss the agent keeps trying before giving up.
    pub reconnect_window: Duration,
}

impl AgentConfig {
    pub fn new(host_name: &str) -> Self {
        Self {
            host_name: host_name.to_string(),
            reconnect_delay: Duration::from_secs(1),
            reconnect_window: Duration::from_secs(30),
        }
    }

    /// Set the pause between reconnect attempts.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the reconnect window.
    pub fn with_reconnect_window(mut self, window: Duration) -> Self {
        self.reconnect_window = window;
        self
    }
}

/// The slave host-controller agent task.
pub struct SlaveAgent {
    config: AgentConfig,
    connector: Box<dyn Connector>,
}

impl SlaveAgent {
    pub fn new(connector: Box<dyn Connector>, config: AgentConfig) -> Self {
        Self { config, connector }
    }

    /// Run the agent until shutdown.
    ///
    /// Connects, registers, then holds the channel; every loss starts a
    /// fresh bounded reconnect window.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let SlaveAgent { config, connector } = self;

        // Each reconnect attempt is a single dial; the window loop below
        // owns the cadence.
        let client_config = ClientConfig::default().with_reconnect_attempts(1);
        let mut client = ManagementClient::connect_with(connector, client_config).await?;
        info!(host = %config.host_name, "agent connected to master");

        loop {
            register(&mut client, &config.host_name).await?;

            tokio::select! {
                res = client.await_channel_closed() => {
                    res?;
                    warn!(host = %config.host_name, "management channel to master lost");
                }
                _ = shutdown.changed() => {
                    info!(host = %config.host_name, "agent shutting down");
                    return Ok(());
                }
            }

            reconnect_within_window(&mut client, &config, &mut shutdown).await?;
        }
    }
}

async fn register(client: &mut ManagementClient, host_name: &str) -> anyhow::Result<()> {
    let op = ManagementOperation::register_host_controller(host_name);
    client
        .execute_for_result(&op)
        .await
        .map_err(|e| anyhow::anyhow!("registration of host '{host_name}' rejected: {e}"))?;
    info!(host = %host_name, "registered with master");
    Ok(())
}

/// Redial at a fixed cadence until the window measured from the loss runs
/// out.
async fn reconnect_within_window(
    client: &mut ManagementClient,
    config: &AgentConfig,
    shutdown: &mut watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + config.reconnect_window;

    loop {
        match client.reconnect().await {
            Ok(()) => {
                info!(host = %config.host_name, "reconnected to master");
                return Ok(());
            }
            Err(ClientError::ConnectFailed { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        if tokio::time::Instant::now() + config.reconnect_delay >= deadline {
            anyhow::bail!(
                "host '{}' could not reconnect to master within {:?}",
                config.host_name,
                config.reconnect_window
            );
        }
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            _ = shutdown.changed() => anyhow::bail!("interrupted while reconnecting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AgentConfig::new("slave");
        assert_eq!(config.host_name, "slave");
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect_window, Duration::from_secs(30));
    }

    #[test]
    fn config_builders() {
        let config = AgentConfig::new("slave")
            .with_reconnect_delay(Duration::from_millis(100))
            .with_reconnect_window(Duration::from_secs(5));
        assert_eq!(config.reconnect_delay, Duration::from_millis(100));
        assert_eq!(config.reconnect_window, Duration::from_secs(5));
    }
}
