//! Operation router — dispatches management operations on the master.
//!
//! Routes by address shape and operation name over the subtree the
//! controller serves: the domain root, host resources, and the
//! rollout-plans content branch. Anything else answers with a failed
//! response rather than an error — unknown requests are a client mistake,
//! not a controller fault.

use serde_json::{Value, json};
use tracing::{debug, info};

use tiller_model::{
    AddressSegment, ManagementOperation, OperationResponse, attrs, ops, params, segment,
};
use tiller_plans::PlanStore;

use crate::registry::{HostRegistry, SessionId};

/// Outcome of dispatching one operation.
#[derive(Debug)]
pub enum Dispatch {
    /// Write this response back to the session.
    Respond(OperationResponse),
    /// Close every session and restart the controller; the issuing session
    /// gets no response, its channel closes instead.
    Reload { admin_only: bool },
}

/// Routes operations against the management subtree the controller serves.
pub struct OperationRouter {
    local_host: String,
    registry: HostRegistry,
    plans: PlanStore,
    admin_only: bool,
}

impl OperationRouter {
    pub fn new(local_host: &str, registry: HostRegistry, plans: PlanStore) -> Self {
        Self {
            local_host: local_host.to_string(),
            registry,
            plans,
            admin_only: false,
        }
    }

    /// Mark the controller as running in admin-only mode.
    pub fn with_admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    /// Dispatch one operation arriving on `session`.
    pub fn dispatch(&self, op: &ManagementOperation, session: SessionId) -> Dispatch {
        debug!(
            operation = %op.operation,
            address = %op.address,
            session,
            "dispatching operation"
        );
        match op.address.segments() {
            [] => self.domain_root(op),
            [seg] if seg.segment_type == segment::HOST => self.host(op, &seg.name, session),
            [seg] if is_rollout_plans(seg) => self.rollout_plans(op),
            [container, plan]
                if is_rollout_plans(container) && plan.segment_type == segment::ROLLOUT_PLAN =>
            {
                self.rollout_plan(op, &plan.name)
            }
            _ => Dispatch::Respond(no_handler(op)),
        }
    }

    fn domain_root(&self, op: &ManagementOperation) -> Dispatch {
        match op.operation.as_str() {
            ops::READ_CHILDREN_NAMES
                if op.str_param(params::CHILD_TYPE) == Some(segment::HOST) =>
            {
                let names: Vec<Value> = self
                    .registry
                    .host_names()
                    .into_iter()
                    .map(Value::String)
                    .collect();
                Dispatch::Respond(OperationResponse::success(Value::Array(names)))
            }
            _ => Dispatch::Respond(no_handler(op)),
        }
    }

    fn host(&self, op: &ManagementOperation, name: &str, session: SessionId) -> Dispatch {
        match op.operation.as_str() {
            ops::RELOAD => {
                if name != self.local_host {
                    return Dispatch::Respond(OperationResponse::failed(format!(
                        "reload must be addressed at this host controller: {}",
                        self.local_host
                    )));
                }
                let admin_only = op.bool_param(params::ADMIN_ONLY).unwrap_or(false);
                info!(admin_only, "reload requested");
                Dispatch::Reload { admin_only }
            }
            ops::READ_ATTRIBUTE if op.str_param(params::NAME) == Some(attrs::HOST_STATE) => {
                if !self.registry.contains(name) {
                    return Dispatch::Respond(OperationResponse::failed(format!(
                        "no host registered as: {name}"
                    )));
                }
                let state = if self.admin_only { "admin-only" } else { "running" };
                Dispatch::Respond(OperationResponse::success(json!(state)))
            }
            ops::REGISTER_HOST_CONTROLLER => {
                if self.admin_only {
                    return Dispatch::Respond(OperationResponse::failed(
                        "host controller is running in admin-only mode",
                    ));
                }
                match self.registry.register(name, session) {
                    Ok(()) => Dispatch::Respond(OperationResponse::success_empty()),
                    Err(e) => Dispatch::Respond(OperationResponse::failed(e.to_string())),
                }
            }
            _ => Dispatch::Respond(no_handler(op)),
        }
    }

    fn rollout_plans(&self, op: &ManagementOperation) -> Dispatch {
        match op.operation.as_str() {
            ops::READ_CHILDREN_NAMES
                if op.str_param(params::CHILD_TYPE) == Some(segment::ROLLOUT_PLAN) =>
            {
                Dispatch::Respond(match self.plans.list() {
                    Ok(names) => OperationResponse::success(json!(names)),
                    Err(e) => OperationResponse::failed(e.to_string()),
                })
            }
            _ => Dispatch::Respond(no_handler(op)),
        }
    }

    fn rollout_plan(&self, op: &ManagementOperation, name: &str) -> Dispatch {
        let response = match op.operation.as_str() {
            ops::ADD => match op.param(params::CONTENT) {
                Some(content) => match self.plans.add(name, content) {
                    Ok(()) => OperationResponse::success_empty(),
                    Err(e) => OperationResponse::failed(e.to_string()),
                },
                None => OperationResponse::failed("add requires a content parameter"),
            },
            ops::REMOVE => match self.plans.remove(name) {
                Ok(()) => OperationResponse::success_empty(),
                Err(e) => OperationResponse::failed(e.to_string()),
            },
            ops::READ_ATTRIBUTE => match op.str_param(params::NAME) {
                Some(attrs::CONTENT) => match self.plans.read(name) {
                    Ok(content) => OperationResponse::success(content),
                    Err(e) => OperationResponse::failed(e.to_string()),
                },
                Some(attrs::HASH) => match self.plans.content_hash(name) {
                    Ok(hash) => OperationResponse::success(json!(hash)),
                    Err(e) => OperationResponse::failed(e.to_string()),
                },
                Some(other) => {
                    OperationResponse::failed(format!("unknown rollout-plan attribute: {other}"))
                }
                None => OperationResponse::failed("read-attribute requires a name parameter"),
            },
            _ => no_handler(op),
        };
        Dispatch::Respond(response)
    }
}

fn is_rollout_plans(seg: &AddressSegment) -> bool {
    seg.segment_type == segment::MANAGEMENT_CLIENT_CONTENT && seg.name == segment::ROLLOUT_PLANS
}

fn no_handler(op: &ManagementOperation) -> OperationResponse {
    OperationResponse::failed(format!(
        "no handler for operation '{}' at address {}",
        op.operation, op.address
    ))
}
