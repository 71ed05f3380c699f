use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use tracing::{info, warn};

use super::classifier::{self, PunchError};
use super::connectivity::Connectivity;
use super::credentials::{CredentialCache, CredentialError};
use super::geofence::{GeofenceCheck, GeofencePolicy, PositionReading};
use super::presence::{PresenceChannel, PresenceEvent};
use super::queue::OfflinePunchQueue;
use crate::model::attendance::{AttendancePunch, PunchStatus, PunchType, ShiftLabel};
use crate::model::presence::PresenceEntry;
use crate::model::shop::{ShopLocation, ShopRegistry};
use crate::model::staff::StaffCredential;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Select a branch first")]
    NoShopConfigured,

    #[error("Unknown branch '{0}'")]
    UnknownBranch(String),

    #[error("Enter the terminal first")]
    NotAuthenticated,

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Out of range")]
    OutOfRange { distance_m: Option<i64> },

    #[error("Select a shift first")]
    ShiftRequired,

    #[error(transparent)]
    Punch(#[from] PunchError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// What a completed punch looked like, for the result screen.
#[derive(Debug, Clone)]
pub struct ClockOutcome {
    pub punch_type: PunchType,
    pub status: PunchStatus,
    pub hours_worked: Option<f64>,
    /// True when the write went to the offline queue instead of the remote
    /// store ("saved locally" notice, not an error).
    pub saved_offline: bool,
}

#[derive(Debug, Clone)]
pub enum TerminalState {
    /// No shop configured for this device yet.
    BranchSetup,
    /// Credential entry.
    Authenticating,
    /// Verified session: geofence gate, shift selection, punch actions.
    SessionActive { staff: StaffCredential },
    /// Transient confirmation; auto-returns to credential entry.
    Result { outcome: ClockOutcome, since: Instant },
}

impl TerminalState {
    pub fn name(&self) -> &'static str {
        match self {
            TerminalState::BranchSetup => "branch-setup",
            TerminalState::Authenticating => "authenticating",
            TerminalState::SessionActive { .. } => "session-active",
            TerminalState::Result { .. } => "result",
        }
    }
}

/// The kiosk flow as an explicit state machine, independent of the HTTP
/// layer: branch-setup → authenticating → session-active → result, with
/// "switch branch" as an interrupt from anywhere and geofence failure as a
/// blocking overlay on the active session rather than a state of its own.
pub struct Terminal {
    registry: ShopRegistry,
    geofence_policy: GeofencePolicy,
    result_reset: Duration,

    remote: Arc<dyn RemoteStore>,
    local: Arc<LocalStore>,
    queue: Arc<OfflinePunchQueue>,
    credentials: CredentialCache,
    connectivity: Arc<Connectivity>,
    presence: PresenceChannel,

    state: TerminalState,
    active_shop: Option<ShopLocation>,
    geofence: Option<GeofenceCheck>,
    last_fix: Option<(f64, f64)>,
}

impl Terminal {
    pub fn new(
        registry: ShopRegistry,
        geofence_policy: GeofencePolicy,
        result_reset: Duration,
        remote: Arc<dyn RemoteStore>,
        local: Arc<LocalStore>,
        connectivity: Arc<Connectivity>,
        presence: PresenceChannel,
    ) -> Self {
        let queue = Arc::new(OfflinePunchQueue::new(local.clone()));
        let credentials =
            CredentialCache::new(remote.clone(), local.clone(), connectivity.clone());

        // Restore the device's sticky branch from the last session.
        let active_shop = local
            .read_saved_branch()
            .ok()
            .flatten()
            .and_then(|id| registry.get(&id).cloned());
        let state = if active_shop.is_some() {
            TerminalState::Authenticating
        } else {
            TerminalState::BranchSetup
        };

        Self {
            registry,
            geofence_policy,
            result_reset,
            remote,
            local,
            queue,
            credentials,
            connectivity,
            presence,
            state,
            active_shop,
            geofence: None,
            last_fix: None,
        }
    }

    /// Shared with the sync reconciler; each device's queue only ever holds
    /// that device's punches.
    pub fn queue(&self) -> Arc<OfflinePunchQueue> {
        self.queue.clone()
    }

    /// Current state, lapsing an expired result screen first.
    pub fn state(&mut self) -> &TerminalState {
        let lapsed = matches!(
            &self.state,
            TerminalState::Result { since, .. } if since.elapsed() >= self.result_reset
        );
        if lapsed {
            self.state = TerminalState::Authenticating;
        }
        &self.state
    }

    pub fn active_shop(&self) -> Option<&ShopLocation> {
        self.active_shop.as_ref()
    }

    pub fn geofence(&self) -> Option<GeofenceCheck> {
        self.geofence
    }

    pub fn shops(&self) -> Vec<ShopLocation> {
        self.registry.all()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// QR entry: a scanned poster routes straight into the right branch, and
    /// some posters also carry the shop's surveyed coordinates, which take
    /// precedence over the registry's position for the geofence. Unknown ids
    /// are ignored; a branch that is already active is left alone so polling
    /// with the entry URL does not clear the session.
    pub fn boot(&mut self, branch_query: Option<&str>, coords: Option<(f64, f64)>) {
        let Some(id) = branch_query else {
            return;
        };
        if !self.active_shop.as_ref().is_some_and(|shop| shop.id == id) {
            if let Err(e) = self.select_branch(id) {
                warn!(branch = id, error = %e, "Ignoring unknown branch in entry URL");
                return;
            }
        }
        if let Some((lat, lng)) = coords {
            if let Some(shop) = self.active_shop.as_mut() {
                shop.lat = lat;
                shop.lng = lng;
            }
        }
    }

    /// Branch selection, persisted as the device's sticky default.
    pub fn select_branch(&mut self, id: &str) -> Result<(), TerminalError> {
        let shop = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| TerminalError::UnknownBranch(id.to_string()))?;
        self.local.write_saved_branch(&shop.id)?;
        info!(branch = %shop.id, shop = %shop.name, "Branch selected");
        self.active_shop = Some(shop);
        self.end_session();
        self.state = TerminalState::Authenticating;
        Ok(())
    }

    /// "Switch branch" interrupt: allowed from any state, clears the session
    /// and the sticky default.
    pub fn switch_branch(&mut self) -> Result<(), TerminalError> {
        self.local.clear_saved_branch()?;
        self.active_shop = None;
        self.end_session();
        self.state = TerminalState::BranchSetup;
        Ok(())
    }

    /// Credential entry. On success the session opens and the kiosk is
    /// expected to report a position immediately.
    pub async fn verify(
        &mut self,
        employee_id: &str,
        pin: &str,
    ) -> Result<StaffCredential, TerminalError> {
        if self.active_shop.is_none() {
            return Err(TerminalError::NoShopConfigured);
        }
        let staff = self.credentials.verify(employee_id, pin).await?;
        info!(employee_id = %staff.employee_id, "Session opened");
        // A session may still be open here (verify straight from the result
        // screen, or a second person stepping up); close it out first.
        self.end_session();
        self.state = TerminalState::SessionActive { staff: staff.clone() };
        Ok(staff)
    }

    /// Runs the geofence evaluator on a reported position. Also the explicit
    /// retry: re-invoking it never loses the authenticated session.
    pub fn report_position(
        &mut self,
        reading: PositionReading,
    ) -> Result<GeofenceCheck, TerminalError> {
        let shop = self.active_shop.as_ref().ok_or(TerminalError::NoShopConfigured)?;
        let check = self.geofence_policy.evaluate(reading, shop);
        self.geofence = Some(check);
        if let PositionReading::Fix { lat, lng } = reading {
            self.last_fix = Some((lat, lng));
            if let TerminalState::SessionActive { staff } = &self.state {
                self.presence.publish(PresenceEvent::Update(PresenceEntry {
                    employee_name: staff.employee_name.clone(),
                    lat,
                    lng,
                    at: Utc::now(),
                }));
            }
        }
        Ok(check)
    }

    /// Clock in or out. Validates the day's record before any write; writes
    /// remotely when possible and falls back to the offline queue otherwise.
    pub async fn clock(
        &mut self,
        punch_type: PunchType,
        shift: Option<ShiftLabel>,
        now: NaiveDateTime,
    ) -> Result<ClockOutcome, TerminalError> {
        let staff = match &self.state {
            TerminalState::SessionActive { staff } => staff.clone(),
            _ => return Err(TerminalError::NotAuthenticated),
        };
        let shop = self
            .active_shop
            .clone()
            .ok_or(TerminalError::NoShopConfigured)?;

        // Geofence gate: no check yet counts the same as a failed one.
        match self.geofence {
            Some(check) if check.in_range => {}
            check => {
                return Err(TerminalError::OutOfRange {
                    distance_m: check.and_then(|c| c.distance_m),
                });
            }
        }

        let date = now.date();
        let existing = self.day_record(&staff.employee_id, date).await?;
        classifier::validate(punch_type, existing.as_ref())?;

        let record = match punch_type {
            PunchType::In => {
                let shift = shift.ok_or(TerminalError::ShiftRequired)?;
                AttendancePunch {
                    employee_id: staff.employee_id.clone(),
                    employee_name: staff.employee_name.clone(),
                    shop: shop.name.clone(),
                    date,
                    status: classifier::classify_clock_in(shift, now),
                    time_in: Some(now.time()),
                    time_out: None,
                    lat: self.last_fix.map(|(lat, _)| lat),
                    lng: self.last_fix.map(|(_, lng)| lng),
                    shift: Some(shift),
                    hours_worked: None,
                    is_paid: false,
                }
            }
            PunchType::Out => {
                let Some(time_in) = existing.as_ref().and_then(|r| r.time_in) else {
                    return Err(PunchError::NoClockIn.into());
                };
                let shift = shift.or_else(|| existing.as_ref().and_then(|r| r.shift));
                AttendancePunch {
                    employee_id: staff.employee_id.clone(),
                    employee_name: staff.employee_name.clone(),
                    shop: shop.name.clone(),
                    date,
                    status: PunchStatus::ShiftEnded,
                    time_in: None,
                    time_out: Some(now.time()),
                    lat: self.last_fix.map(|(lat, _)| lat),
                    lng: self.last_fix.map(|(_, lng)| lng),
                    shift,
                    hours_worked: Some(classifier::hours_worked(time_in, now.time())),
                    is_paid: false,
                }
            }
        };

        let saved_offline = self.write_punch(punch_type, record.clone()).await?;
        let outcome = ClockOutcome {
            punch_type,
            status: record.status,
            hours_worked: record.hours_worked,
            saved_offline,
        };
        info!(
            employee_id = %staff.employee_id,
            punch_type = %punch_type,
            status = %outcome.status,
            saved_offline,
            "Punch recorded"
        );

        self.end_session();
        self.state = TerminalState::Result {
            outcome: outcome.clone(),
            since: Instant::now(),
        };
        Ok(outcome)
    }

    /// Explicit user action on the result screen (or session exit), ahead of
    /// the auto-return timer.
    pub fn reset(&mut self) {
        self.end_session();
        if self.active_shop.is_some() {
            self.state = TerminalState::Authenticating;
        } else {
            self.state = TerminalState::BranchSetup;
        }
    }

    pub fn pending_sync(&self) -> usize {
        self.queue.len().unwrap_or(0)
    }

    /// The day's row as currently known: the remote store when reachable,
    /// otherwise whatever the offline queue can reconstruct.
    async fn day_record(
        &self,
        employee_id: &str,
        date: chrono::NaiveDate,
    ) -> Result<Option<AttendancePunch>, TerminalError> {
        if self.connectivity.is_online() {
            match self.remote.query_attendance(employee_id, date).await {
                Ok(row) => {
                    // A punch queued but not yet drained still counts.
                    let queued = self.queue.day_view(employee_id, date)?;
                    return Ok(match (row, queued) {
                        (Some(mut row), Some(queued)) => {
                            row.merge_from(&queued);
                            Some(row)
                        }
                        (row, queued) => row.or(queued),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Day record lookup failed, using offline queue");
                }
            }
        }
        Ok(self.queue.day_view(employee_id, date)?)
    }

    async fn write_punch(
        &self,
        punch_type: PunchType,
        record: AttendancePunch,
    ) -> Result<bool, TerminalError> {
        if self.connectivity.is_online() {
            match self.remote.upsert_attendance(&record).await {
                Ok(()) => return Ok(false),
                Err(e) => {
                    warn!(error = %e, "Remote write failed, buffering punch locally");
                }
            }
        }
        self.queue.enqueue(punch_type, record)?;
        Ok(true)
    }

    fn end_session(&mut self) {
        if let TerminalState::SessionActive { staff } = &self.state {
            self.presence
                .publish(PresenceEvent::Left(staff.employee_name.clone()));
        }
        self.geofence = None;
    }
}
