//! Domain test fixture — master, slave agent, and client wired together.

use std::sync::Once;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use tiller_agent::{AgentConfig, SlaveAgent};
use tiller_client::{HostWatcher, ManagementClient};
use tiller_domain::DomainConfig;

use crate::harness::DomainHarness;

/// Default master host name.
pub const MASTER: &str = "master";
/// Default slave host name.
pub const SLAVE: &str = "slave";

/// An in-process domain: one master, one slave agent, one client session.
///
/// The master's plan store lives in a temp directory so reload semantics
/// match production: the store is dropped and reopened from disk on every
/// restart.
pub struct DomainFixture {
    pub master: DomainHarness,
    pub client: ManagementClient,
    agent_handle: JoinHandle<anyhow::Result<()>>,
    agent_shutdown: watch::Sender<bool>,
    _data_dir: TempDir,
}

impl DomainFixture {
    /// Start a full domain with default names and fast test timings.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_named(MASTER, SLAVE).await
    }

    pub async fn start_named(master: &str, slave: &str) -> anyhow::Result<Self> {
        init_tracing();

        let data_dir = tempfile::tempdir()?;
        let config = DomainConfig::new(master)
            .with_data_dir(data_dir.path())
            .with_restart_delay(Duration::from_millis(100));
        let harness = DomainHarness::start(config)?;

        let (agent_shutdown, agent_shutdown_rx) = watch::channel(false);
        let agent_config = AgentConfig::new(slave)
            .with_reconnect_delay(Duration::from_millis(100))
            .with_reconnect_window(Duration::from_secs(30));
        let agent = SlaveAgent::new(harness.connector(), agent_config);
        let agent_handle = tokio::spawn(agent.run(agent_shutdown_rx));

        let mut client = ManagementClient::connect(harness.connector()).await?;

        // Hand the fixture out only once the slave's initial registration
        // is visible.
        HostWatcher::new()
            .with_poll_interval(Duration::from_millis(50))
            .await_host(&mut client, slave, Duration::from_secs(10))
            .await?;

        info!(%master, %slave, "domain fixture up");
        Ok(Self {
            master: harness,
            client,
            agent_handle,
            agent_shutdown,
            _data_dir: data_dir,
        })
    }

    /// Stop the agent, then the master.
    pub async fn teardown(self) {
        let _ = self.agent_shutdown.send(true);
        let _ = self.agent_handle.await;
        self.master.shutdown().await;
    }

    /// Await the agent task's exit, for tests that expect it to stop on
    /// its own. Returns the agent's result and the still-running master.
    pub async fn join_agent(self) -> (anyhow::Result<()>, DomainHarness) {
        let result = match self.agent_handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("agent task panicked: {e}")),
        };
        (result, self.master)
    }
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
