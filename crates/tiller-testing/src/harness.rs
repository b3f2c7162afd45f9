//! Master harness — the accept loop owning a `DomainController`.
//!
//! Accepted channels become sessions; a per-session pump forwards frames
//! into one multiplexed queue so a single task owns the controller. A
//! `reload` dispatch severs every session (dropping their receivers, which
//! is the close event the clients see) and drives the controller restart
//! before the loop resumes accepting.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use tiller_domain::{Dispatch, DomainConfig, DomainController, DomainResult, SessionId};
use tiller_model::{ManagementOperation, OperationResponse};

use crate::memory::{Frame, MemoryConnector};

/// A master host controller served over in-process channels.
pub struct DomainHarness {
    accept_tx: mpsc::Sender<mpsc::Receiver<Frame>>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    endpoint: String,
}

impl DomainHarness {
    /// Start the controller and its accept loop.
    pub fn start(config: DomainConfig) -> DomainResult<Self> {
        let endpoint = format!("memory://{}", config.host_name);
        let controller = DomainController::start(config)?;
        let (accept_tx, accept_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_master(controller, accept_rx, shutdown_rx));
        Ok(Self {
            accept_tx,
            shutdown_tx,
            handle,
            endpoint,
        })
    }

    /// A connector any client or agent can dial the master through.
    pub fn connector(&self) -> Box<dyn tiller_client::Connector> {
        Box::new(MemoryConnector::new(self.accept_tx.clone(), &self.endpoint))
    }

    /// Stop the master for good, severing every session.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

enum SessionEvent {
    Op {
        session: SessionId,
        op: ManagementOperation,
        reply: oneshot::Sender<OperationResponse>,
    },
    Gone {
        session: SessionId,
    },
}

async fn run_master(
    mut controller: DomainController,
    mut accept_rx: mpsc::Receiver<mpsc::Receiver<Frame>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let (mux_tx, mut mux_rx) = mpsc::channel(64);
    let mut sessions: HashMap<SessionId, watch::Sender<bool>> = HashMap::new();

    loop {
        tokio::select! {
            Some(rx) = accept_rx.recv() => {
                let session = controller.open_session();
                let (kill_tx, kill_rx) = watch::channel(false);
                sessions.insert(session, kill_tx);
                tokio::spawn(pump_session(session, rx, mux_tx.clone(), kill_rx));
                debug!(session, "management session accepted");
            }
            Some(event) = mux_rx.recv() => match event {
                SessionEvent::Op { session, op, reply } => {
                    match controller.handle(&op, session) {
                        Dispatch::Respond(resp) => {
                            let _ = reply.send(resp);
                        }
                        Dispatch::Reload { admin_only } => {
                            // Sever every session, the issuing one included,
                            // before restarting. The dropped reply slot is
                            // fine: reload success is the close event.
                            drop(reply);
                            for (_, kill) in sessions.drain() {
                                let _ = kill.send(true);
                            }
                            if let Err(e) = controller.restart(admin_only).await {
                                error!(error = %e, "controller restart failed");
                                return;
                            }
                        }
                    }
                }
                SessionEvent::Gone { session } => {
                    sessions.remove(&session);
                    controller.session_closed(session);
                }
            },
            _ = shutdown.changed() => {
                for (_, kill) in sessions.drain() {
                    let _ = kill.send(true);
                }
                info!("master harness stopped");
                return;
            }
        }
    }
}

/// Forward one session's frames into the controller's queue until the
/// client goes away or the session is killed. Dropping `rx` on the way out
/// is what the client observes as the close event.
async fn pump_session(
    session: SessionId,
    mut rx: mpsc::Receiver<Frame>,
    mux_tx: mpsc::Sender<SessionEvent>,
    mut kill: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some((op, reply)) => {
                    if mux_tx
                        .send(SessionEvent::Op { session, op, reply })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                None => break,
            },
            _ = kill.changed() => break,
        }
    }
    let _ = mux_tx.send(SessionEvent::Gone { session }).await;
}
