use crate::api::terminal::{BranchRequest, ClockRequest, ConnectivityRequest, VerifyRequest};
use crate::model::attendance::{AttendancePunch, PunchStatus, PunchType, ShiftLabel};
use crate::model::presence::PresenceEntry;
use crate::model::shop::ShopLocation;
use crate::model::staff::StaffCredential;
use crate::terminal::geofence::{GeofenceCheck, PositionReading};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Terminal API",
        version = "1.0.4",
        description = r#"
## Kiosk Attendance Terminal

This API powers the staff clock-in/out terminal for the shop branches.

### 🔹 Key Features
- **Branch Setup**
  - Sticky per-device branch selection, QR poster entry via `?branch=`
- **Credential Entry**
  - Staff ID + PIN, verified online with an offline roster snapshot fallback
- **Geofenced Punches**
  - Clock in/out gated on physical presence inside the shop radius
- **Offline Buffering**
  - Punches are queued locally and synced to the cloud store when back online
- **Live Presence**
  - Manager-facing map of staff active right now

### 📦 Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::terminal::get_state,
        crate::api::terminal::select_branch,
        crate::api::terminal::clear_branch,
        crate::api::terminal::verify,
        crate::api::terminal::report_location,
        crate::api::terminal::clock,
        crate::api::terminal::reset,
        crate::api::terminal::connectivity,

        crate::api::presence::live_roster
    ),
    components(
        schemas(
            BranchRequest,
            VerifyRequest,
            ClockRequest,
            ConnectivityRequest,
            PositionReading,
            GeofenceCheck,
            AttendancePunch,
            PunchType,
            PunchStatus,
            ShiftLabel,
            ShopLocation,
            StaffCredential,
            PresenceEntry
        )
    ),
    tags(
        (name = "Terminal", description = "Kiosk clock-in/out flow"),
        (name = "Presence", description = "Live staff presence"),
    )
)]
pub struct ApiDoc;
