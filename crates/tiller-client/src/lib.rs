//! tiller-client — the client side of one management session.
//!
//! A session owns one management channel to the master host controller and
//! drives it through the reload/reconnect contract:
//!
//! - **`transport`** — the seam to the external wire layer ([`Transport`],
//!   [`Connector`])
//! - **`gateway`** — [`ManagementClient`]: execute, await-channel-closed,
//!   reconnect
//! - **`reload`** — [`ReloadCoordinator`]: controlled master restart
//! - **`watcher`** — [`HostWatcher`]: poll until a host registration appears
//!
//! # Architecture
//!
//! ```text
//! Caller
//!   ├── ManagementClient (one channel, ChannelState Open/Closing/Closed)
//!   │   ├── execute() → structured response
//!   │   ├── execute_await_channel_closed() → transport close event
//!   │   └── reconnect() → bounded backoff through the Connector
//!   ├── ReloadCoordinator
//!   │   └── reload op → await close → reconnect
//!   └── HostWatcher
//!       └── read-children-names(host) poll loop with absolute deadline
//! ```

pub mod error;
pub mod gateway;
pub mod reload;
pub mod transport;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testsupport;

pub use error::{ClientError, ClientResult};
pub use gateway::{ChannelState, ClientConfig, ManagementClient};
pub use reload::ReloadCoordinator;
pub use transport::{Connector, Transport};
pub use watcher::HostWatcher;
