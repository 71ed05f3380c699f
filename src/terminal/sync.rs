use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::connectivity::Connectivity;
use super::queue::OfflinePunchQueue;
use crate::store::remote::RemoteStore;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub pending: usize,
}

/// Drains the offline queue against the remote store: at-least-once delivery,
/// made safe by the upsert's idempotence on (employee_id, date). Runs on
/// startup while online and on every offline→online transition.
pub struct SyncReconciler {
    queue: Arc<OfflinePunchQueue>,
    remote: Arc<dyn RemoteStore>,
    // Overlapping triggers are harmless but wasteful; serialize passes.
    drain_lock: Mutex<()>,
}

impl SyncReconciler {
    pub fn new(queue: Arc<OfflinePunchQueue>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            queue,
            remote,
            drain_lock: Mutex::new(()),
        }
    }

    /// One replay pass. Entries are upserted in insertion order; an entry
    /// that fails stays queued for the next trigger, and later entries for
    /// the same (employee, date) are skipped in this pass so a clock-out can
    /// never land before its clock-in.
    pub async fn drain(&self) -> Result<SyncReport> {
        let _guard = self.drain_lock.lock().await;

        let entries = self.queue.list()?;
        if entries.is_empty() {
            return Ok(SyncReport::default());
        }

        let mut acked = Vec::new();
        let mut failed_keys: HashSet<(String, NaiveDate)> = HashSet::new();

        for entry in &entries {
            let key = entry.record.key();
            if failed_keys.contains(&key) {
                continue;
            }
            match self.remote.upsert_attendance(&entry.record).await {
                Ok(()) => acked.push(entry.id),
                Err(e) => {
                    warn!(
                        id = %entry.id,
                        employee_id = %entry.record.employee_id,
                        error = %e,
                        "Queued punch replay failed, keeping for next pass"
                    );
                    failed_keys.insert(key);
                }
            }
        }

        self.queue.remove(&acked)?;
        let report = SyncReport {
            synced: acked.len(),
            pending: self.queue.len()?,
        };
        if report.synced > 0 {
            info!(synced = report.synced, pending = report.pending, "Cloud sync pass complete");
        }
        Ok(report)
    }
}

/// Watches connectivity and drains the queue on each offline→online edge.
/// Spawned once at startup; ends when the connectivity source is dropped.
pub async fn run_connectivity_sync(reconciler: Arc<SyncReconciler>, connectivity: Arc<Connectivity>) {
    let mut rx = connectivity.watch();
    let mut was_online = *rx.borrow_and_update();
    while rx.changed().await.is_ok() {
        let online = *rx.borrow_and_update();
        if online && !was_online {
            if let Err(e) = reconciler.drain().await {
                warn!(error = %e, "Sync pass after reconnect failed");
            }
        }
        was_online = online;
    }
}
