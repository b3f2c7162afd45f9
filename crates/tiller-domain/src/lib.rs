//! tiller-domain — the master host controller's management core.
//!
//! Owns the authoritative configuration (the rollout-plan store) and the
//! registry of connected host controllers, and drives the controlled
//! restart that the reload contract is built around.
//!
//! # Architecture
//!
//! ```text
//! DomainController
//!   ├── PlanStore (redb, survives restarts)
//!   ├── HostRegistry
//!   │   ├── self-registration at startup
//!   │   ├── slave registrations tied to their sessions
//!   │   └── session death removes its registrations
//!   ├── OperationRouter
//!   │   ├── rollout-plan subtree → PlanStore
//!   │   ├── read-children-names → registry / store
//!   │   └── reload → restart action
//!   └── restart lifecycle (Running → Restarting → Running)
//! ```
//!
//! The transport that carries sessions is external; the controller sees
//! only operations tagged with a session id and reports back when a
//! dispatched operation demands a restart.

pub mod config;
pub mod controller;
pub mod error;
pub mod registry;
pub mod router;

pub use config::DomainConfig;
pub use controller::{ControllerState, DomainController};
pub use error::{DomainError, DomainResult};
pub use registry::{HostRegistration, HostRegistry, SessionId};
pub use router::{Dispatch, OperationRouter};
