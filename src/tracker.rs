//! Process-local agent tracking
//!
//! Keeps the set of agent ids seen since process start and hands first
//! sightings to a small pool of background notifier workers. The webhook
//! path never waits on a notification; a full queue drops the signal with
//! a warning rather than blocking.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clients::matrix::MatrixClient;

/// Queue depth for pending new-agent notifications
const NOTIFY_QUEUE_DEPTH: usize = 64;

/// Snapshot of the tracker state
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    pub count: usize,
    pub ids: Vec<String>,
}

/// Mutex-guarded set of agent ids observed since process start
#[derive(Default)]
pub struct AgentTracker {
    known: Mutex<HashSet<String>>,
}

impl AgentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting. Returns `true` exactly once per process per
    /// agent id; concurrent first sightings resolve under the lock.
    pub fn observe(&self, agent_id: &str) -> bool {
        let mut known = self.known.lock();
        if known.contains(agent_id) {
            debug!("Known agent: {agent_id}");
            false
        } else {
            info!("New agent detected: {agent_id}");
            known.insert(agent_id.to_string());
            true
        }
    }

    /// Clear the set, returning how many ids were dropped
    pub fn reset(&self) -> usize {
        let mut known = self.known.lock();
        let removed = known.len();
        known.clear();
        removed
    }

    /// Snapshot the current state (ids sorted for stable output)
    pub fn status(&self) -> TrackerStatus {
        let known = self.known.lock();
        let mut ids: Vec<String> = known.iter().cloned().collect();
        ids.sort();
        TrackerStatus {
            count: ids.len(),
            ids,
        }
    }
}

/// Handle for submitting fire-and-forget new-agent notifications
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<String>,
}

impl Notifier {
    /// Spawn `workers` background tasks draining the notification queue.
    /// Each notification enforces the chat-bridge client's own timeout.
    pub fn spawn(client: MatrixClient, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<String>(NOTIFY_QUEUE_DEPTH);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for _ in 0..workers.clamp(1, 4) {
            let rx = Arc::clone(&rx);
            let client = client.clone();
            tokio::spawn(async move {
                loop {
                    let agent_id = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(agent_id) = agent_id else {
                        break;
                    };
                    match client.notify_new_agent(&agent_id).await {
                        Ok(()) => info!("Notified chat bridge about new agent {agent_id}"),
                        Err(e) => warn!("Failed to notify chat bridge about {agent_id}: {e}"),
                    }
                }
            });
        }

        Self { tx }
    }

    /// Enqueue a notification without blocking the request path
    pub fn submit(&self, agent_id: String) {
        if let Err(e) = self.tx.try_send(agent_id) {
            warn!("Dropping new-agent notification: {e}");
        }
    }
}
