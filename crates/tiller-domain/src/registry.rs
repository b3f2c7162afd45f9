//! Host registry — live host-controller registrations.
//!
//! A registration exists exactly while its management session does: it is
//! created when a host controller completes its handshake and removed when
//! the session is confirmed dead. Presence in the registry therefore *is*
//! the liveness flag.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::error::{DomainError, DomainResult};

/// Identifier of the management session a registration arrived on.
pub type SessionId = u64;

/// One registered host controller.
#[derive(Debug, Clone)]
pub struct HostRegistration {
    pub name: String,
    /// Session the registration is tied to; the controller's own entry has
    /// none.
    pub session: Option<SessionId>,
    /// Unix timestamp (seconds) of registration.
    pub registered_at: u64,
}

/// Tracks which host controllers are currently registered.
///
/// Clone-able and shared across sessions.
#[derive(Clone)]
pub struct HostRegistry {
    inner: Arc<Mutex<HashMap<String, HostRegistration>>>,
}

impl HostRegistry {
    /// Create a registry seeded with the controller's own entry.
    pub fn new(local_name: &str) -> Self {
        let mut hosts = HashMap::new();
        hosts.insert(
            local_name.to_string(),
            HostRegistration {
                name: local_name.to_string(),
                session: None,
                registered_at: epoch_secs(),
            },
        );
        Self {
            inner: Arc::new(Mutex::new(hosts)),
        }
    }

    /// Register a slave host controller on a session.
    ///
    /// A name that is already registered is rejected; a slave re-registering
    /// after a reconnect arrives on a fresh session only once its dead one
    /// was reaped.
    pub fn register(&self, name: &str, session: SessionId) -> DomainResult<()> {
        let mut hosts = self.lock();
        if hosts.contains_key(name) {
            warn!(%name, session, "rejected duplicate host registration");
            return Err(DomainError::DuplicateHost(name.to_string()));
        }
        hosts.insert(
            name.to_string(),
            HostRegistration {
                name: name.to_string(),
                session: Some(session),
                registered_at: epoch_secs(),
            },
        );
        info!(%name, session, "host controller registered");
        Ok(())
    }

    /// Drop every registration tied to a dead session.
    pub fn session_closed(&self, session: SessionId) {
        let mut hosts = self.lock();
        hosts.retain(|name, reg| {
            let keep = reg.session != Some(session);
            if !keep {
                info!(%name, session, "host controller unregistered");
            }
            keep
        });
    }

    /// Remove all slave registrations (controller restart).
    pub fn clear_slaves(&self) {
        let mut hosts = self.lock();
        hosts.retain(|_, reg| reg.session.is_none());
    }

    /// All registered host names.
    pub fn host_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<HostRegistration> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, HostRegistration>> {
        self.inner.lock().expect("host registry lock poisoned")
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
