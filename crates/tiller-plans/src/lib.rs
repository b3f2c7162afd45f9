//! tiller-plans — keyed storage of named rollout plans.
//!
//! Backed by [redb](https://docs.rs/redb): plan content is JSON-serialized
//! into a `&str → &[u8]` table keyed by plan name. The store supports both
//! on-disk and in-memory backends (the latter for testing); the on-disk
//! backend is what lets plans survive a host-controller restart.
//!
//! Content is validated structurally before it is stored: a plan must hold
//! a `rollout-plan` object with an `in-series` sequence of steps, each step
//! naming exactly one of `server-group` or `concurrent-groups`.
//!
//! The `PlanStore` is `Clone + Send + Sync` (backed by `Arc<Database>`) and
//! can be shared across async tasks.

pub mod error;
pub mod store;
pub mod validate;

pub use error::{PlanError, PlanResult};
pub use store::PlanStore;
pub use validate::validate_plan_content;
