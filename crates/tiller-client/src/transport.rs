//! Transport seam for management channels.
//!
//! The wire protocol and its encoding live outside this workspace; the
//! client reaches the master through these traits. A [`Transport`] is one
//! management channel: a single-session request/response connection whose
//! close event is observable at the transport level. A [`Connector`] opens
//! fresh channels to a fixed management endpoint.

use async_trait::async_trait;
use tiller_model::{ManagementOperation, OperationResponse};

/// One open management channel.
#[async_trait]
pub trait Transport: Send {
    /// Send an operation and wait for its structured response.
    async fn execute(&mut self, op: &ManagementOperation) -> std::io::Result<OperationResponse>;

    /// Send an operation without waiting for a response.
    async fn send(&mut self, op: &ManagementOperation) -> std::io::Result<()>;

    /// Wait until the peer closes the channel.
    ///
    /// Resolves on the transport-level close event; responses still
    /// arriving before the close are discarded.
    async fn await_closed(&mut self) -> std::io::Result<()>;
}

/// Opens fresh channels to a fixed management endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new channel to the endpoint.
    async fn connect(&self) -> std::io::Result<Box<dyn Transport>>;

    /// Endpoint description for diagnostics.
    fn endpoint(&self) -> String;
}
