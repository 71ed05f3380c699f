use std::sync::Arc;

use tracing::{debug, info, warn};

use super::connectivity::Connectivity;
use crate::model::staff::StaffCredential;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;

/// Why a verification failed. Logged distinctly, but both causes surface to
/// the kiosk as the same "Invalid ID or PIN" message so the terminal leaks
/// nothing about which staff exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Invalid ID or PIN")]
    NoMatch,

    #[error("Invalid ID or PIN")]
    SnapshotUnavailable,
}

/// Remote-first credential verification with an offline fallback to the last
/// persisted roster snapshot.
pub struct CredentialCache {
    remote: Arc<dyn RemoteStore>,
    local: Arc<LocalStore>,
    connectivity: Arc<Connectivity>,
}

impl CredentialCache {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<LocalStore>,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            remote,
            local,
            connectivity,
        }
    }

    /// While online: authenticate against the live roster, refreshing the
    /// whole snapshot in the background on success (failures there are
    /// non-fatal). While offline, or when the remote errors: match against
    /// the snapshot, id case-insensitive, pin exact.
    pub async fn verify(
        &self,
        employee_id: &str,
        pin: &str,
    ) -> Result<StaffCredential, CredentialError> {
        if self.connectivity.is_online() {
            match self.remote.lookup_staff(employee_id, pin).await {
                Ok(Some(staff)) => {
                    self.spawn_snapshot_refresh();
                    return Ok(staff);
                }
                Ok(None) => {
                    debug!(employee_id, "Remote roster has no matching credentials");
                    return Err(CredentialError::NoMatch);
                }
                Err(e) => {
                    warn!(error = %e, "Remote credential lookup failed, using snapshot");
                }
            }
        }
        self.verify_offline(employee_id, pin)
    }

    fn verify_offline(&self, employee_id: &str, pin: &str) -> Result<StaffCredential, CredentialError> {
        let snapshot = match self.local.read_staff_snapshot() {
            Ok(Some(snapshot)) if !snapshot.is_empty() => snapshot,
            Ok(_) => {
                warn!(employee_id, "No roster snapshot on device, cannot verify offline");
                return Err(CredentialError::SnapshotUnavailable);
            }
            Err(e) => {
                warn!(error = %e, "Roster snapshot unreadable");
                return Err(CredentialError::SnapshotUnavailable);
            }
        };

        match snapshot.iter().find(|s| s.matches(employee_id, pin)) {
            Some(staff) => Ok(staff.clone()),
            None => {
                debug!(employee_id, "Snapshot has no matching credentials");
                Err(CredentialError::NoMatch)
            }
        }
    }

    // Fire-and-forget: a stale snapshot must never block authentication.
    fn spawn_snapshot_refresh(&self) {
        let remote = self.remote.clone();
        let local = self.local.clone();
        tokio::spawn(async move {
            match remote.list_staff().await {
                Ok(roster) => {
                    if let Err(e) = local.write_staff_snapshot(&roster) {
                        warn!(error = %e, "Failed to persist roster snapshot");
                    } else {
                        info!(staff = roster.len(), "Roster snapshot refreshed");
                    }
                }
                Err(e) => warn!(error = %e, "Roster snapshot refresh failed"),
            }
        });
    }
}
