use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::model::attendance::{AttendancePunch, PunchType, QueuedPunch};
use crate::store::local::LocalStore;

/// Durable at-least-once buffer for punches the remote store has not
/// acknowledged. Insertion-ordered; entries are deleted by id once their
/// upsert succeeds, never rewritten from a stale snapshot, so an enqueue
/// racing a sync pass cannot be lost. Duplicates are not collapsed here;
/// the remote upsert's idempotence converges them.
pub struct OfflinePunchQueue {
    store: Arc<LocalStore>,
    guard: Mutex<()>,
}

impl OfflinePunchQueue {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    /// Appends to the tail, persisted before returning.
    pub fn enqueue(&self, punch_type: PunchType, record: AttendancePunch) -> Result<QueuedPunch> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let entry = QueuedPunch::new(punch_type, record);
        let mut queue = self.store.read_queue()?;
        queue.push(entry.clone());
        self.store.write_queue(&queue)?;
        info!(
            id = %entry.id,
            employee_id = %entry.record.employee_id,
            punch_type = %entry.punch_type,
            "Punch saved locally, pending sync"
        );
        Ok(entry)
    }

    /// All queued punches, insertion order.
    pub fn list(&self) -> Result<Vec<QueuedPunch>> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        self.store.read_queue()
    }

    /// Deletes acknowledged entries by id.
    pub fn remove(&self, ids: &[Uuid]) -> Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut queue = self.store.read_queue()?;
        queue.retain(|entry| !ids.contains(&entry.id));
        self.store.write_queue(&queue)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    /// The day's record as reconstructable from queued punches alone, used
    /// for punch validation while the remote store is unreachable.
    pub fn day_view(&self, employee_id: &str, date: NaiveDate) -> Result<Option<AttendancePunch>> {
        let key = (employee_id.to_lowercase(), date);
        let mut view: Option<AttendancePunch> = None;
        for entry in self.list()? {
            if entry.record.key() != key {
                continue;
            }
            match view {
                Some(ref mut row) => row.merge_from(&entry.record),
                None => view = Some(entry.record),
            }
        }
        Ok(view)
    }
}
