//! tiller-agent — the slave host controller's connection to its master.
//!
//! The agent owns one management session. It registers its host name over
//! the channel, then holds the channel until it drops. A channel loss — a
//! master reload, typically — starts a bounded reconnect window: the agent
//! redials at a fixed cadence, re-registers on success, and gives up only
//! once the window is exhausted. Registration is never duplicated: the
//! master reaps a dead session's registration before the replacement
//! arrives on a fresh session.

pub mod agent;

pub use agent::{AgentConfig, SlaveAgent};
