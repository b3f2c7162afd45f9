//! ManagementClient — one client management session.
//!
//! Holds at most one open channel; `&mut self` keeps at most one call in
//! flight. The channel's [`ChannelState`] belongs to this session alone and
//! is transitioned only here.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use tiller_model::{ManagementOperation, OperationResponse};

use crate::error::{ClientError, ClientResult};
use crate::transport::{Connector, Transport};

/// State of the session's management channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Closing,
    Closed,
}

/// Tunables for a client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long `execute_await_channel_closed` waits for the close event.
    pub close_timeout: Duration,
    /// Reconnect attempts before giving up.
    pub reconnect_attempts: u32,
    /// Initial delay between reconnect attempts.
    pub reconnect_backoff: Duration,
    /// Backoff cap.
    pub max_reconnect_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            close_timeout: Duration::from_secs(30),
            reconnect_attempts: 10,
            reconnect_backoff: Duration::from_millis(500),
            max_reconnect_backoff: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Set the close-event timeout.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set the reconnect attempt budget.
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set the initial reconnect backoff.
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Set the reconnect backoff cap.
    pub fn with_max_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.max_reconnect_backoff = backoff;
        self
    }
}

/// A single client management session.
pub struct ManagementClient {
    connector: Box<dyn Connector>,
    config: ClientConfig,
    channel: Option<Box<dyn Transport>>,
    state: ChannelState,
    shutdown: Option<watch::Receiver<bool>>,
}

impl ManagementClient {
    /// Open the initial channel through the connector, with defaults.
    pub async fn connect(connector: Box<dyn Connector>) -> ClientResult<Self> {
        Self::connect_with(connector, ClientConfig::default()).await
    }

    /// Open the initial channel through the connector.
    pub async fn connect_with(
        connector: Box<dyn Connector>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let channel = connector.connect().await?;
        info!(endpoint = %connector.endpoint(), "management channel open");
        Ok(Self {
            connector,
            config,
            channel: Some(channel),
            state: ChannelState::Open,
            shutdown: None,
        })
    }

    /// Attach a cancellation signal honored by the retry and poll loops.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Execute an operation and return its structured response.
    ///
    /// A transport fault kills the session's channel: the state drops to
    /// `Closed` and the error is surfaced.
    pub async fn execute(
        &mut self,
        op: &ManagementOperation,
    ) -> ClientResult<OperationResponse> {
        if self.state != ChannelState::Open {
            return Err(ClientError::ChannelUnavailable(self.state));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or(ClientError::ChannelUnavailable(ChannelState::Closed))?;

        match channel.execute(op).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!(operation = %op.operation, error = %e, "management channel failed mid-operation");
                self.drop_channel();
                Err(ClientError::Transport(e))
            }
        }
    }

    /// Execute and validate: success yields the result payload, a failed
    /// outcome becomes an error carrying the failure description.
    pub async fn execute_for_result(
        &mut self,
        op: &ManagementOperation,
    ) -> ClientResult<serde_json::Value> {
        Ok(self.execute(op).await?.into_result()?)
    }

    /// Send an operation that triggers server-side shutdown of this channel
    /// and wait for the transport close event instead of a response.
    ///
    /// Once this returns, the old channel is gone — no operation sent on it
    /// can still be pending. A master that ignores the operation surfaces
    /// as `Timeout` after the configured close timeout.
    pub async fn execute_await_channel_closed(
        &mut self,
        op: &ManagementOperation,
    ) -> ClientResult<()> {
        if self.state != ChannelState::Open {
            return Err(ClientError::ChannelUnavailable(self.state));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or(ClientError::ChannelUnavailable(ChannelState::Closed))?;

        if let Err(e) = channel.send(op).await {
            self.drop_channel();
            return Err(ClientError::Transport(e));
        }
        self.state = ChannelState::Closing;
        debug!(operation = %op.operation, "awaiting channel close");

        match tokio::time::timeout(self.config.close_timeout, channel.await_closed()).await {
            // A close-by-error is still a close.
            Ok(_) => {
                self.drop_channel();
                info!("management channel closed");
                Ok(())
            }
            Err(_) => Err(ClientError::Timeout {
                timeout: self.config.close_timeout,
            }),
        }
    }

    /// Wait for the peer to close the channel without sending anything.
    ///
    /// Used by host-controller agents to detect loss of their master
    /// connection.
    pub async fn await_channel_closed(&mut self) -> ClientResult<()> {
        if self.state != ChannelState::Open {
            return Err(ClientError::ChannelUnavailable(self.state));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or(ClientError::ChannelUnavailable(ChannelState::Closed))?;

        let _ = channel.await_closed().await;
        self.drop_channel();
        Ok(())
    }

    /// Re-open a channel to the same endpoint with bounded backoff.
    ///
    /// Callable only when the channel is `Closed`. Backoff doubles per
    /// failed attempt up to the configured cap; the budget exhausting
    /// surfaces as `ConnectFailed`.
    pub async fn reconnect(&mut self) -> ClientResult<()> {
        if self.state != ChannelState::Closed {
            return Err(ClientError::ChannelUnavailable(self.state));
        }

        let mut backoff = self.config.reconnect_backoff;
        for attempt in 1..=self.config.reconnect_attempts {
            match self.connector.connect().await {
                Ok(channel) => {
                    self.channel = Some(channel);
                    self.state = ChannelState::Open;
                    info!(
                        endpoint = %self.connector.endpoint(),
                        attempt,
                        "management channel reconnected"
                    );
                    return Ok(());
                }
                Err(e) => {
                    debug!(attempt, error = %e, "reconnect attempt failed");
                }
            }
            if attempt < self.config.reconnect_attempts {
                self.sleep_or_interrupt(backoff, "reconnecting").await?;
                backoff = (backoff * 2).min(self.config.max_reconnect_backoff);
            }
        }

        Err(ClientError::ConnectFailed {
            endpoint: self.connector.endpoint(),
            attempts: self.config.reconnect_attempts,
        })
    }

    fn drop_channel(&mut self) {
        self.channel = None;
        self.state = ChannelState::Closed;
    }

    /// Sleep, aborting with `Interrupted` if the shutdown signal fires.
    pub(crate) async fn sleep_or_interrupt(
        &mut self,
        duration: Duration,
        during: &'static str,
    ) -> ClientResult<()> {
        match &mut self.shutdown {
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => Ok(()),
                    _ = rx.changed() => Err(ClientError::Interrupted { during }),
                }
            }
            None => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::FakeEndpoint;
    use tiller_model::{Address, OperationResponse};

    fn read_op() -> ManagementOperation {
        ManagementOperation::read_children_names(Address::root(), "host")
    }

    #[tokio::test]
    async fn execute_returns_response() {
        let endpoint = FakeEndpoint::responding(|_| {
            OperationResponse::success(serde_json::json!(["master"]))
        });
        let mut client = ManagementClient::connect(endpoint.connector()).await.unwrap();

        let resp = client.execute(&read_op()).await.unwrap();
        assert!(resp.is_success());
        assert_eq!(client.state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn execute_for_result_propagates_failure_description() {
        let endpoint =
            FakeEndpoint::responding(|_| OperationResponse::failed("no handler"));
        let mut client = ManagementClient::connect(endpoint.connector()).await.unwrap();

        let err = client.execute_for_result(&read_op()).await.unwrap_err();
        assert!(matches!(err, ClientError::Failed(_)));
        assert!(err.to_string().contains("no handler"));
    }

    #[tokio::test]
    async fn execute_requires_open_channel() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let mut client = ManagementClient::connect(endpoint.connector()).await.unwrap();

        endpoint.close_channels();
        client.await_channel_closed().await.unwrap();

        let err = client.execute(&read_op()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ChannelUnavailable(ChannelState::Closed)
        ));
    }

    #[tokio::test]
    async fn await_close_after_closing_op() {
        let endpoint = FakeEndpoint::closing_on("reload");
        let mut client = ManagementClient::connect(endpoint.connector()).await.unwrap();

        let op = ManagementOperation::reload("master", false);
        client.execute_await_channel_closed(&op).await.unwrap();
        assert_eq!(client.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn close_times_out_when_master_ignores_reload() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let config = ClientConfig::default().with_close_timeout(Duration::from_millis(50));
        let mut client = ManagementClient::connect_with(endpoint.connector(), config)
            .await
            .unwrap();

        let op = ManagementOperation::reload("master", false);
        let err = client.execute_await_channel_closed(&op).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(client.state(), ChannelState::Closing);
    }

    #[tokio::test]
    async fn reconnect_requires_closed_channel() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let mut client = ManagementClient::connect(endpoint.connector()).await.unwrap();

        let err = client.reconnect().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ChannelUnavailable(ChannelState::Open)
        ));
    }

    #[tokio::test]
    async fn reconnect_retries_until_endpoint_returns() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let config = ClientConfig::default()
            .with_reconnect_attempts(5)
            .with_reconnect_backoff(Duration::from_millis(10));
        let mut client = ManagementClient::connect_with(endpoint.connector(), config)
            .await
            .unwrap();

        endpoint.close_channels();
        client.await_channel_closed().await.unwrap();

        // First two dials are refused, the third succeeds.
        endpoint.refuse_connects(2);
        client.reconnect().await.unwrap();
        assert_eq!(client.state(), ChannelState::Open);
        assert!(client.execute(&read_op()).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn reconnect_exhausts_bounded_budget() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let config = ClientConfig::default()
            .with_reconnect_attempts(3)
            .with_reconnect_backoff(Duration::from_millis(5));
        let mut client = ManagementClient::connect_with(endpoint.connector(), config)
            .await
            .unwrap();

        endpoint.close_channels();
        client.await_channel_closed().await.unwrap();

        endpoint.refuse_connects(u32::MAX);
        let err = client.reconnect().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectFailed { attempts: 3, .. }));
        assert_eq!(client.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn reconnect_interrupted_by_shutdown_signal() {
        let endpoint = FakeEndpoint::responding(|_| OperationResponse::success_empty());
        let config = ClientConfig::default()
            .with_reconnect_attempts(100)
            .with_reconnect_backoff(Duration::from_millis(50));
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let mut client = ManagementClient::connect_with(endpoint.connector(), config)
            .await
            .unwrap()
            .with_shutdown(shutdown_rx);

        endpoint.close_channels();
        client.await_channel_closed().await.unwrap();
        endpoint.refuse_connects(u32::MAX);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = shutdown_tx.send(true);
        });

        let err = client.reconnect().await.unwrap_err();
        assert!(matches!(err, ClientError::Interrupted { .. }));
    }
}
