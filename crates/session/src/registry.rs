//! Session registry and TTL bookkeeping
//!
//! Read-mostly map of session id to handle. Each registered session
//! gets a TTL timer measured from registration (not refreshed by
//! activity) that stops the pipeline with the `Expired` reason; the
//! timer is invalidated when the session is torn down for any other
//! reason first, and the first stop reason recorded always wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::control::{SessionControl, SessionEnd};
use crate::pipeline::{SessionError, SessionOutcome};

struct SessionHandle {
    control: Arc<SessionControl>,
    worker: JoinHandle<Result<SessionOutcome, SessionError>>,
    ttl_timer: JoinHandle<()>,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Register a running session's worker. A session re-registered
    /// under the same id replaces the old one, which is stopped.
    pub async fn register(
        &self,
        session_id: Uuid,
        control: Arc<SessionControl>,
        worker: JoinHandle<Result<SessionOutcome, SessionError>>,
    ) {
        let ttl_timer = {
            let control = Arc::clone(&control);
            let ttl = self.ttl;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                info!(%session_id, "session ttl elapsed");
                control.stop(SessionEnd::Expired);
            })
        };

        let handle = SessionHandle {
            control,
            worker,
            ttl_timer,
        };
        let replaced = self.sessions.write().await.insert(session_id, handle);
        if let Some(old) = replaced {
            warn!(%session_id, "session replaced, stopping previous pipeline");
            old.ttl_timer.abort();
            old.control.stop(SessionEnd::Stopped);
            // Every worker handle is awaited on teardown, replacement
            // included; the write lock is already released here.
            if let Err(err) = old.worker.await {
                warn!(%session_id, %err, "replaced session worker join failed");
            }
        }
        info!(%session_id, "session registered");
    }

    /// Control surface for a live session, for pause/reset/recalibrate.
    pub async fn control(&self, session_id: &Uuid) -> Option<Arc<SessionControl>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|handle| Arc::clone(&handle.control))
    }

    /// Stop a session and wait for its pipeline to finish. The TTL
    /// timer is invalidated first so expiry cannot race a deliberate
    /// close into a double stop.
    pub async fn disconnect(&self, session_id: &Uuid) -> Option<SessionOutcome> {
        let handle = self.sessions.write().await.remove(session_id)?;
        handle.ttl_timer.abort();
        handle.control.stop(SessionEnd::Stopped);
        match handle.worker.await {
            Ok(Ok(outcome)) => {
                info!(%session_id, end = ?outcome.end, "session disconnected");
                Some(outcome)
            }
            Ok(Err(err)) => {
                warn!(%session_id, %err, "session pipeline failed");
                None
            }
            Err(err) => {
                warn!(%session_id, %err, "session worker join failed");
                None
            }
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Registered sessions whose pipeline task is still running.
    pub async fn running_workers(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|handle| !handle.worker.is_finished())
            .count()
    }
}
