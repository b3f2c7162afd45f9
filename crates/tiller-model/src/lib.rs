//! tiller-model — the management-operation value model.
//!
//! Everything a management client and a host controller exchange is built
//! from three value types: an [`Address`] locating a resource in the
//! management tree, a [`ManagementOperation`] request against that address,
//! and an [`OperationResponse`] carrying the outcome. All three are immutable
//! values with structural equality — freely cloned, no shared mutable state.
//!
//! Operation parameters and result payloads are `serde_json::Value` trees;
//! the serde shapes match the wire contract:
//!
//! ```text
//! Request:  { address: [ {type, name}, ... ], operation: <name>, params: { ... } }
//! Response: { outcome: "success"|"failed",
//!             result?: <payload>,
//!             failure-description?: <text> }
//! ```

pub mod address;
pub mod operation;
pub mod response;

pub use address::{Address, AddressSegment, segment};
pub use operation::{ManagementOperation, attrs, ops, params};
pub use response::{OperationFailed, OperationResponse, Outcome};
