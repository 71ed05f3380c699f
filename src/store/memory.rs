use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::remote::{RemoteError, RemoteStore};
use crate::model::attendance::AttendancePunch;
use crate::model::staff::StaffCredential;

/// In-memory `RemoteStore` test double with the same merge-on-conflict
/// semantics as the hosted store; `set_reachable(false)` makes every call
/// fail the way a dead network does.
#[derive(Default)]
pub struct MemoryRemoteStore {
    staff: Mutex<Vec<StaffCredential>>,
    attendance: Mutex<HashMap<(String, NaiveDate), AttendancePunch>>,
    unreachable: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_staff(staff: Vec<StaffCredential>) -> Self {
        Self {
            staff: Mutex::new(staff),
            ..Self::default()
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }

    pub fn attendance_row(&self, employee_id: &str, date: NaiveDate) -> Option<AttendancePunch> {
        self.attendance
            .lock()
            .unwrap()
            .get(&(employee_id.to_lowercase(), date))
            .cloned()
    }

    pub fn attendance_count(&self) -> usize {
        self.attendance.lock().unwrap().len()
    }

    fn check_reachable(&self) -> Result<(), RemoteError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(RemoteError::Status(503))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn lookup_staff(
        &self,
        employee_id: &str,
        pin: &str,
    ) -> Result<Option<StaffCredential>, RemoteError> {
        self.check_reachable()?;
        Ok(self
            .staff
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.matches(employee_id, pin))
            .cloned())
    }

    async fn list_staff(&self) -> Result<Vec<StaffCredential>, RemoteError> {
        self.check_reachable()?;
        Ok(self.staff.lock().unwrap().clone())
    }

    async fn upsert_attendance(&self, record: &AttendancePunch) -> Result<(), RemoteError> {
        self.check_reachable()?;
        let mut rows = self.attendance.lock().unwrap();
        match rows.get_mut(&record.key()) {
            Some(existing) => existing.merge_from(record),
            None => {
                rows.insert(record.key(), record.clone());
            }
        }
        Ok(())
    }

    async fn query_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendancePunch>, RemoteError> {
        self.check_reachable()?;
        Ok(self
            .attendance
            .lock()
            .unwrap()
            .get(&(employee_id.to_lowercase(), date))
            .cloned())
    }
}
