use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::attendance::AttendancePunch;
use crate::model::staff::StaffCredential;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("remote returned malformed payload: {0}")]
    Payload(String),
}

/// The hosted table-store behind the terminal, reduced to the four calls the
/// core needs. Implementations must make `upsert_attendance` idempotent on
/// (employee_id, date) and merge fields on conflict rather than replacing the
/// whole row, so a clock-in write followed by a clock-out write for the same
/// key accumulates both times.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Authenticates against the live roster. `Ok(None)` means no matching
    /// (employee_id, pin) pair; transport problems are `Err` so callers can
    /// fall back to the local snapshot.
    async fn lookup_staff(
        &self,
        employee_id: &str,
        pin: &str,
    ) -> Result<Option<StaffCredential>, RemoteError>;

    /// Full roster, used to refresh the offline snapshot.
    async fn list_staff(&self) -> Result<Vec<StaffCredential>, RemoteError>;

    /// Insert-or-merge keyed on (employee_id, date).
    async fn upsert_attendance(&self, record: &AttendancePunch) -> Result<(), RemoteError>;

    /// The day's existing row, if any.
    async fn query_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendancePunch>, RemoteError>;
}
