use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live position of an active staff session. Ephemeral: published on the
/// presence channel only, never written to storage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresenceEntry {
    #[schema(example = "Jane Wanjiru")]
    pub employee_name: String,

    #[schema(example = -1.2825)]
    pub lat: f64,

    #[schema(example = 36.8967)]
    pub lng: f64,

    #[schema(value_type = String, format = "date-time")]
    pub at: DateTime<Utc>,
}
