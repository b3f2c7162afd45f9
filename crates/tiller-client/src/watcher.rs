//! HostWatcher — polls the host registry until a named host appears.
//!
//! Host registration is eventually consistent through the control plane:
//! after a master restart a slave reappears whenever its own reconnect loop
//! gets around to it. The watcher polls `read-children-names(child-type=host)`
//! at a fixed cadence against an absolute deadline computed once up front,
//! so slow polls never stretch the window.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use tiller_model::{Address, ManagementOperation, segment};

use crate::error::{ClientError, ClientResult};
use crate::gateway::ManagementClient;

/// Polls the domain root for a host registration.
#[derive(Debug, Clone)]
pub struct HostWatcher {
    poll_interval: Duration,
}

impl Default for HostWatcher {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl HostWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Wait until `host_name` is registered, up to `timeout`.
    ///
    /// A failed poll — non-success outcome or transport fault — counts as
    /// "not yet" and polling continues. Past the deadline the wait fails
    /// with `DeadlineExceeded`; a cancellation signal on the client fails
    /// it with `Interrupted`.
    pub async fn await_host(
        &self,
        client: &mut ManagementClient,
        host_name: &str,
        timeout: Duration,
    ) -> ClientResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let op = ManagementOperation::read_children_names(Address::root(), segment::HOST);

        loop {
            match client.execute(&op).await {
                Ok(resp) if resp.is_success() => {
                    if contains_host(resp.result.as_ref(), host_name) {
                        debug!(host = %host_name, "host registered");
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    debug!(
                        host = %host_name,
                        failure = resp.failure_description.as_deref().unwrap_or("unknown"),
                        "host query failed, still waiting"
                    );
                }
                Err(e) => {
                    debug!(host = %host_name, error = %e, "host query failed, still waiting");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ClientError::DeadlineExceeded {
                    host: host_name.to_string(),
                    timeout,
                });
            }
            client
                .sleep_or_interrupt(self.poll_interval, "waiting for host registration")
                .await?;
        }
    }
}

/// Membership is an unordered containment check over the returned names.
fn contains_host(result: Option<&Value>, host_name: &str) -> bool {
    result
        .and_then(Value::as_array)
        .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(host_name)))
}
