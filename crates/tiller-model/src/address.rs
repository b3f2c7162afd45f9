//! Management resource addresses.
//!
//! An [`Address`] is an ordered sequence of `(type, name)` segments locating
//! a resource in the management tree, e.g. `/host=master` or
//! `/management-client-content=rollout-plans/rollout-plan=testPlan`.
//! Addresses are immutable once constructed; equality is structural and
//! ordered.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known address segment types.
pub mod segment {
    pub const HOST: &str = "host";
    pub const MANAGEMENT_CLIENT_CONTENT: &str = "management-client-content";
    pub const ROLLOUT_PLANS: &str = "rollout-plans";
    pub const ROLLOUT_PLAN: &str = "rollout-plan";
    pub const SERVER_GROUP: &str = "server-group";
}

/// One `(type, name)` pair in an address path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressSegment {
    #[serde(rename = "type")]
    pub segment_type: String,
    pub name: String,
}

/// Ordered path identifying a management resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Vec<AddressSegment>);

impl Address {
    /// The domain root (empty path).
    pub fn root() -> Self {
        Self::default()
    }

    /// Return the address extended by one segment.
    pub fn child(mut self, segment_type: &str, name: &str) -> Self {
        self.0.push(AddressSegment {
            segment_type: segment_type.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Address of the rollout-plans container.
    pub fn rollout_plans() -> Self {
        Self::root().child(segment::MANAGEMENT_CLIENT_CONTENT, segment::ROLLOUT_PLANS)
    }

    /// Address of a named rollout plan.
    pub fn rollout_plan(name: &str) -> Self {
        Self::rollout_plans().child(segment::ROLLOUT_PLAN, name)
    }

    /// Address of a host controller.
    pub fn host(name: &str) -> Self {
        Self::root().child(segment::HOST, name)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[AddressSegment] {
        &self.0
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&AddressSegment> {
        self.0.last()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for seg in &self.0 {
            write!(f, "/{}={}", seg.segment_type, seg.name)?;
        }
        Ok(())
    }
}
