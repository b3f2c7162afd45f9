//! DomainController — the master host controller's lifecycle.
//!
//! The controller owns the plan store and host registry and answers
//! operations handed to it by the transport layer, each tagged with the
//! session it arrived on. A dispatched `reload` comes back as a
//! [`Dispatch::Reload`] action; the transport layer severs every session
//! and then drives [`DomainController::restart`], which drops the store's
//! file lock, waits out the restart delay, and reopens everything from
//! disk. Plan content must come back intact — that is the property the
//! whole reload contract hangs on.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use tiller_model::{ManagementOperation, OperationResponse};
use tiller_plans::PlanStore;

use crate::config::DomainConfig;
use crate::error::{DomainError, DomainResult};
use crate::registry::{HostRegistry, SessionId};
use crate::router::{Dispatch, OperationRouter};

const STORE_FILE: &str = "mgmt-content.redb";

/// Process state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    Restarting,
}

/// The master host controller's management core.
pub struct DomainController {
    config: DomainConfig,
    registry: HostRegistry,
    /// `None` only while restarting with the on-disk store released.
    plans: Option<PlanStore>,
    state: ControllerState,
    admin_only: bool,
    sessions: SessionId,
}

impl DomainController {
    /// Start the controller: open the store and seed the registry with the
    /// controller's own registration.
    pub fn start(config: DomainConfig) -> DomainResult<Self> {
        let plans = Some(Self::open_store(&config)?);
        let registry = HostRegistry::new(&config.host_name);
        let admin_only = config.admin_only;
        info!(host = %config.host_name, admin_only, "domain controller started");
        Ok(Self {
            config,
            registry,
            plans,
            state: ControllerState::Running,
            admin_only,
            sessions: 0,
        })
    }

    fn open_store(config: &DomainConfig) -> DomainResult<PlanStore> {
        match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .map_err(|e| DomainError::Config(format!("data dir {dir:?}: {e}")))?;
                Ok(PlanStore::open(&Self::store_path(dir))?)
            }
            None => Ok(PlanStore::open_in_memory()?),
        }
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn host_name(&self) -> &str {
        &self.config.host_name
    }

    pub fn admin_only(&self) -> bool {
        self.admin_only
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Allocate a session id for a newly-accepted channel.
    pub fn open_session(&mut self) -> SessionId {
        self.sessions += 1;
        self.sessions
    }

    /// A session's channel is confirmed dead.
    pub fn session_closed(&mut self, session: SessionId) {
        self.registry.session_closed(session);
    }

    /// Dispatch one operation arriving on a session.
    pub fn handle(&self, op: &ManagementOperation, session: SessionId) -> Dispatch {
        match &self.plans {
            Some(plans) if self.state == ControllerState::Running => {
                OperationRouter::new(&self.config.host_name, self.registry.clone(), plans.clone())
                    .with_admin_only(self.admin_only)
                    .dispatch(op, session)
            }
            _ => Dispatch::Respond(OperationResponse::failed("host controller is restarting")),
        }
    }

    /// Restart in place.
    ///
    /// The caller must have severed every open session first — the restart
    /// drops the store to release its file lock, and a session still
    /// dispatching would hold it open. Slave registrations are cleared;
    /// they come back as the slaves reconnect. On-disk plan content
    /// survives.
    pub async fn restart(&mut self, admin_only: bool) -> DomainResult<()> {
        self.state = ControllerState::Restarting;
        info!(
            host = %self.config.host_name,
            admin_only,
            delay = ?self.config.restart_delay(),
            "domain controller restarting"
        );

        if self.config.data_dir.is_some() {
            // Release the file lock before reopening from the same path.
            self.plans = None;
        } else {
            warn!("restarting with an in-memory store; contents are retained in place");
        }
        self.registry.clear_slaves();

        tokio::time::sleep(self.config.restart_delay()).await;

        if self.plans.is_none() {
            self.plans = Some(Self::open_store(&self.config)?);
        }
        self.admin_only = admin_only;
        self.state = ControllerState::Running;
        info!(host = %self.config.host_name, "domain controller running");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tiller_model::{Address, attrs};

    fn test_config() -> DomainConfig {
        DomainConfig::new("master").with_restart_delay(Duration::from_millis(10))
    }

    fn test_plan() -> serde_json::Value {
        json!({
            "rollout-plan": {
                "in-series": [
                    {"server-group": {"main-server-group": {}}}
                ]
            }
        })
    }

    fn respond(dispatch: Dispatch) -> OperationResponse {
        match dispatch {
            Dispatch::Respond(resp) => resp,
            Dispatch::Reload { .. } => panic!("expected a response, got a reload"),
        }
    }

    #[test]
    fn starts_running_with_self_registered() {
        let controller = DomainController::start(test_config()).unwrap();
        assert_eq!(controller.state(), ControllerState::Running);
        assert!(controller.registry().contains("master"));
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let mut controller = DomainController::start(test_config()).unwrap();
        let a = controller.open_session();
        let b = controller.open_session();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn plans_survive_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config().with_data_dir(dir.path());
        let mut controller = DomainController::start(config).unwrap();

        let add = ManagementOperation::add(Address::rollout_plan("testPlan"), test_plan());
        assert!(respond(controller.handle(&add, 1)).is_success());

        controller.restart(false).await.unwrap();
        assert_eq!(controller.state(), ControllerState::Running);

        let read = ManagementOperation::read_attribute(
            Address::rollout_plan("testPlan"),
            attrs::CONTENT,
        );
        let content = respond(controller.handle(&read, 2)).into_result().unwrap();
        assert_eq!(content, test_plan());
    }

    #[tokio::test]
    async fn restart_clears_slave_registrations() {
        let mut controller = DomainController::start(test_config()).unwrap();
        let session = controller.open_session();
        let register = ManagementOperation::register_host_controller("slave");
        assert!(respond(controller.handle(&register, session)).is_success());

        controller.restart(false).await.unwrap();
        assert!(!controller.registry().contains("slave"));
        assert!(controller.registry().contains("master"));

        // The slave can re-register on a fresh session without conflict.
        let session = controller.open_session();
        assert!(respond(controller.handle(&register, session)).is_success());
    }

    #[tokio::test]
    async fn restart_applies_admin_only_mode() {
        let mut controller = DomainController::start(test_config()).unwrap();
        assert!(!controller.admin_only());

        controller.restart(true).await.unwrap();
        assert!(controller.admin_only());

        let register = ManagementOperation::register_host_controller("slave");
        let resp = respond(controller.handle(&register, 1));
        assert!(resp.failure_description.unwrap().contains("admin-only"));
    }

    #[tokio::test]
    async fn reload_dispatch_requests_restart() {
        let controller = DomainController::start(test_config()).unwrap();
        let op = ManagementOperation::reload("master", false);
        assert!(matches!(
            controller.handle(&op, 1),
            Dispatch::Reload { admin_only: false }
        ));
    }

    #[test]
    fn session_death_reaps_registration() {
        let mut controller = DomainController::start(test_config()).unwrap();
        let session = controller.open_session();
        let register = ManagementOperation::register_host_controller("slave");
        assert!(respond(controller.handle(&register, session)).is_success());

        controller.session_closed(session);
        assert!(!controller.registry().contains("slave"));
    }
}
