//! Scripted transport doubles shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;

use tiller_model::{ManagementOperation, OperationResponse};

use crate::transport::{Connector, Transport};

type Handler = dyn Fn(&ManagementOperation) -> OperationResponse + Send + Sync;

/// A scripted management endpoint backing any number of fake channels.
pub(crate) struct FakeEndpoint {
    inner: Arc<Inner>,
}

struct Inner {
    handler: Box<Handler>,
    /// Operation name that makes the endpoint close every channel.
    close_on: Option<String>,
    close_tx: watch::Sender<bool>,
    /// Remaining connection attempts to refuse (`u32::MAX` = forever).
    refuse: AtomicU32,
}

impl FakeEndpoint {
    /// Endpoint answering every operation through `handler`.
    pub fn responding<F>(handler: F) -> Self
    where
        F: Fn(&ManagementOperation) -> OperationResponse + Send + Sync + 'static,
    {
        Self::build(handler, None)
    }

    /// Endpoint that closes every channel when the named operation arrives.
    pub fn closing_on(operation: &str) -> Self {
        Self::build(
            |_| OperationResponse::success_empty(),
            Some(operation.to_string()),
        )
    }

    fn build<F>(handler: F, close_on: Option<String>) -> Self
    where
        F: Fn(&ManagementOperation) -> OperationResponse + Send + Sync + 'static,
    {
        let (close_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                close_on,
                close_tx,
                refuse: AtomicU32::new(0),
            }),
        }
    }

    /// Close every currently-open channel.
    pub fn close_channels(&self) {
        let _ = self.inner.close_tx.send(true);
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_connects(&self, n: u32) {
        self.inner.refuse.store(n, Ordering::SeqCst);
    }

    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(FakeConnector {
            inner: self.inner.clone(),
        })
    }
}

struct FakeConnector {
    inner: Arc<Inner>,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> std::io::Result<Box<dyn Transport>> {
        let refuse = self.inner.refuse.load(Ordering::SeqCst);
        if refuse > 0 {
            if refuse != u32::MAX {
                self.inner.refuse.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "endpoint refusing connections",
            ));
        }
        Ok(Box::new(FakeChannel {
            inner: self.inner.clone(),
            close_rx: self.inner.close_tx.subscribe(),
        }))
    }

    fn endpoint(&self) -> String {
        "fake://master".to_string()
    }
}

struct FakeChannel {
    inner: Arc<Inner>,
    close_rx: watch::Receiver<bool>,
}

impl FakeChannel {
    fn maybe_close(&self, op: &ManagementOperation) {
        if self.inner.close_on.as_deref() == Some(op.operation.as_str()) {
            let _ = self.inner.close_tx.send(true);
        }
    }
}

#[async_trait]
impl Transport for FakeChannel {
    async fn execute(
        &mut self,
        op: &ManagementOperation,
    ) -> std::io::Result<OperationResponse> {
        self.maybe_close(op);
        Ok((self.inner.handler)(op))
    }

    async fn send(&mut self, op: &ManagementOperation) -> std::io::Result<()> {
        self.maybe_close(op);
        Ok(())
    }

    async fn await_closed(&mut self) -> std::io::Result<()> {
        let _ = self.close_rx.changed().await;
        Ok(())
    }
}
