//! Management operation requests.
//!
//! A [`ManagementOperation`] is an immutable request value: an operation
//! name, a target [`Address`], and named parameters. Builder constructors
//! cover the operations the reload/reconnect contract uses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::Address;

/// Well-known operation names.
pub mod ops {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const READ_ATTRIBUTE: &str = "read-attribute";
    pub const READ_CHILDREN_NAMES: &str = "read-children-names";
    pub const RELOAD: &str = "reload";
    pub const REGISTER_HOST_CONTROLLER: &str = "register-host-controller";
}

/// Well-known parameter names.
pub mod params {
    pub const NAME: &str = "name";
    pub const CONTENT: &str = "content";
    pub const CHILD_TYPE: &str = "child-type";
    pub const ADMIN_ONLY: &str = "admin-only";
}

/// Well-known attribute names for `read-attribute`.
pub mod attrs {
    pub const CONTENT: &str = "content";
    pub const HASH: &str = "hash";
    pub const HOST_STATE: &str = "host-state";
}

/// An immutable management operation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementOperation {
    pub address: Address,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl ManagementOperation {
    /// Bare operation with no parameters.
    pub fn new(operation: &str, address: Address) -> Self {
        Self {
            address,
            operation: operation.to_string(),
            params: Map::new(),
        }
    }

    /// Return the operation with a named parameter added.
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.param(name).and_then(Value::as_bool)
    }

    // ── Builders for the referenced operations ─────────────────────

    /// `add` with a `content` payload.
    pub fn add(address: Address, content: Value) -> Self {
        Self::new(ops::ADD, address).with_param(params::CONTENT, content)
    }

    /// `remove`.
    pub fn remove(address: Address) -> Self {
        Self::new(ops::REMOVE, address)
    }

    /// `read-attribute` for a named attribute.
    pub fn read_attribute(address: Address, attribute: &str) -> Self {
        Self::new(ops::READ_ATTRIBUTE, address).with_param(params::NAME, attribute)
    }

    /// `read-children-names` for a child type.
    pub fn read_children_names(address: Address, child_type: &str) -> Self {
        Self::new(ops::READ_CHILDREN_NAMES, address).with_param(params::CHILD_TYPE, child_type)
    }

    /// `reload` addressed at a host controller.
    pub fn reload(host: &str, admin_only: bool) -> Self {
        Self::new(ops::RELOAD, Address::host(host)).with_param(params::ADMIN_ONLY, admin_only)
    }

    /// The slave handshake: register a host controller by name.
    pub fn register_host_controller(host: &str) -> Self {
        Self::new(ops::REGISTER_HOST_CONTROLLER, Address::host(host))
    }
}
