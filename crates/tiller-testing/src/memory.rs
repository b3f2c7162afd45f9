//! In-process management transport.
//!
//! A channel is an mpsc pair: the client side sends request frames, the
//! server side answers through a per-request reply slot. The transport
//! close event is the server dropping its receiver — exactly what a peer
//! observes when a real connection tears down.

use async_trait::async_trait;

use tokio::sync::{mpsc, oneshot};

use tiller_client::{Connector, Transport};
use tiller_model::{ManagementOperation, OperationResponse};

/// One request frame: the operation plus its reply slot.
pub type Frame = (ManagementOperation, oneshot::Sender<OperationResponse>);

/// Dials a [`DomainHarness`](crate::DomainHarness) accept loop.
pub struct MemoryConnector {
    accept_tx: mpsc::Sender<mpsc::Receiver<Frame>>,
    endpoint: String,
}

impl MemoryConnector {
    pub(crate) fn new(accept_tx: mpsc::Sender<mpsc::Receiver<Frame>>, endpoint: &str) -> Self {
        Self {
            accept_tx,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> std::io::Result<Box<dyn Transport>> {
        let (tx, rx) = mpsc::channel(8);
        self.accept_tx.send(rx).await.map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "master is not accepting connections",
            )
        })?;
        Ok(Box::new(MemoryChannel { tx }))
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

struct MemoryChannel {
    tx: mpsc::Sender<Frame>,
}

#[async_trait]
impl Transport for MemoryChannel {
    async fn execute(
        &mut self,
        op: &ManagementOperation,
    ) -> std::io::Result<OperationResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((op.clone(), reply_tx))
            .await
            .map_err(|_| closed())?;
        reply_rx.await.map_err(|_| closed())
    }

    async fn send(&mut self, op: &ManagementOperation) -> std::io::Result<()> {
        // The reply slot is dropped up front; any response is discarded.
        let (reply_tx, _reply_rx) = oneshot::channel();
        self.tx
            .send((op.clone(), reply_tx))
            .await
            .map_err(|_| closed())
    }

    async fn await_closed(&mut self) -> std::io::Result<()> {
        self.tx.closed().await;
        Ok(())
    }
}

fn closed() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "management channel closed",
    )
}
