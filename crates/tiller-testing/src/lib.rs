//! tiller-testing — an in-process domain for exercising the reload and
//! reconnection contract end to end.
//!
//! The wire transport is external to the core crates; this crate supplies
//! the stand-in: management channels are in-process message channels whose
//! close event is the server side dropping its receiver. On top of that
//! sit a master harness (the accept loop owning a `DomainController`) and
//! a [`DomainFixture`] wiring master, slave agent, and client together
//! with test-friendly timings.

pub mod fixture;
pub mod harness;
pub mod memory;

pub use fixture::{DomainFixture, MASTER, SLAVE};
pub use harness::DomainHarness;
pub use memory::MemoryConnector;
