//! ReloadCoordinator — drives a controlled master restart.
//!
//! The restart has two independent failure points: the master never closing
//! the channel (`Timeout`) and the network never coming back
//! (`ConnectFailed`). Keeping [`ReloadCoordinator::await_restart`] and the
//! client's `reconnect` separately callable lets a caller insert
//! verification steps between them; [`ReloadCoordinator::reload`] composes
//! both for the common path.

use tracing::info;

use tiller_model::ManagementOperation;

use crate::error::ClientResult;
use crate::gateway::ManagementClient;

/// Coordinates the reload of a target host controller.
#[derive(Debug, Clone)]
pub struct ReloadCoordinator {
    target_host: String,
    admin_only: bool,
}

impl ReloadCoordinator {
    pub fn new(target_host: &str) -> Self {
        Self {
            target_host: target_host.to_string(),
            admin_only: false,
        }
    }

    /// Ask the target to come back up in admin-only mode.
    pub fn with_admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    /// Issue the reload operation and wait for the channel to tear down.
    ///
    /// Success is the transport close event, not a structured response.
    pub async fn await_restart(&self, client: &mut ManagementClient) -> ClientResult<()> {
        let op = ManagementOperation::reload(&self.target_host, self.admin_only);
        info!(
            host = %self.target_host,
            admin_only = self.admin_only,
            "reloading host controller"
        );
        client.execute_await_channel_closed(&op).await
    }

    /// Full restart sequence: reload, await the close, re-open the channel.
    pub async fn reload(&self, client: &mut ManagementClient) -> ClientResult<()> {
        self.await_restart(client).await?;
        client.reconnect().await?;
        info!(host = %self.target_host, "host controller reloaded");
        Ok(())
    }
}
