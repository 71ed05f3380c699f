use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum PunchType {
    In,
    Out,
}

/// Status labels drive payroll reports downstream, so the exact strings matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum PunchStatus {
    #[serde(rename = "On Time")]
    #[strum(serialize = "On Time")]
    OnTime,

    #[serde(rename = "Late Arrival")]
    #[strum(serialize = "Late Arrival")]
    LateArrival,

    #[serde(rename = "Shift Ended")]
    #[strum(serialize = "Shift Ended")]
    ShiftEnded,
}

/// Selectable shift, carrying the expected arrival hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum ShiftLabel {
    /// Opening crew, expected at or before 07:00.
    Opening,
    /// Day crew, expected at or before 08:00.
    Day,
}

impl ShiftLabel {
    pub fn expected_start_hour(self) -> u32 {
        match self {
            ShiftLabel::Opening => 7,
            ShiftLabel::Day => 8,
        }
    }
}

/// The attendance record for one staff member on one calendar date.
/// Logical key: (employee_id, date); the remote store holds at most one row
/// per key, enforced by upsert-on-conflict.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "K-007",
        "employee_name": "Jane Wanjiru",
        "shop": "Shop 315",
        "date": "2026-08-30",
        "status": "On Time",
        "time_in": "06:58:12",
        "time_out": null,
        "lat": -1.2825,
        "lng": 36.8967,
        "shift": "Opening",
        "hours_worked": null,
        "is_paid": false
    })
)]
pub struct AttendancePunch {
    #[schema(example = "K-007")]
    pub employee_id: String,

    #[schema(example = "Jane Wanjiru")]
    pub employee_name: String,

    #[schema(example = "Shop 315")]
    pub shop: String,

    #[schema(example = "2026-08-30", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: PunchStatus,

    #[schema(example = "06:58:12", value_type = String, nullable = true)]
    pub time_in: Option<NaiveTime>,

    #[schema(example = "17:30:05", value_type = String, nullable = true)]
    pub time_out: Option<NaiveTime>,

    #[schema(example = -1.2825, nullable = true)]
    pub lat: Option<f64>,

    #[schema(example = 36.8967, nullable = true)]
    pub lng: Option<f64>,

    #[schema(nullable = true)]
    pub shift: Option<ShiftLabel>,

    /// Computed on clock-out only: (time_out - time_in) in fractional hours,
    /// rounded to two decimals.
    #[schema(example = 8.53, nullable = true)]
    pub hours_worked: Option<f64>,

    /// Consumed by the payroll screens; punches are written unpaid.
    pub is_paid: bool,
}

impl AttendancePunch {
    /// Conflict key in the remote store.
    pub fn key(&self) -> (String, NaiveDate) {
        (self.employee_id.to_lowercase(), self.date)
    }

    /// Field-level merge for upsert-on-conflict: disjoint optional fields
    /// accumulate (a clock-in row plus a clock-out row ends up with both
    /// times), conflicting fields are last-write-wins from `incoming`.
    pub fn merge_from(&mut self, incoming: &AttendancePunch) {
        self.employee_name = incoming.employee_name.clone();
        self.shop = incoming.shop.clone();
        self.status = incoming.status;
        self.is_paid = incoming.is_paid;
        if incoming.time_in.is_some() {
            self.time_in = incoming.time_in;
        }
        if incoming.time_out.is_some() {
            self.time_out = incoming.time_out;
        }
        if incoming.lat.is_some() {
            self.lat = incoming.lat;
            self.lng = incoming.lng;
        }
        if incoming.shift.is_some() {
            self.shift = incoming.shift;
        }
        if incoming.hours_worked.is_some() {
            self.hours_worked = incoming.hours_worked;
        }
    }
}

/// A punch awaiting remote acknowledgement. Lives only in local storage;
/// deleted once the upsert it represents succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPunch {
    pub id: Uuid,
    pub punch_type: PunchType,
    pub record: AttendancePunch,
    pub queued_at: DateTime<Utc>,
}

impl QueuedPunch {
    pub fn new(punch_type: PunchType, record: AttendancePunch) -> Self {
        Self {
            id: Uuid::new_v4(),
            punch_type,
            record,
            queued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_punch(employee_id: &str, date: NaiveDate, time_in: NaiveTime) -> AttendancePunch {
        AttendancePunch {
            employee_id: employee_id.into(),
            employee_name: "Jane Wanjiru".into(),
            shop: "Shop 315".into(),
            date,
            status: PunchStatus::OnTime,
            time_in: Some(time_in),
            time_out: None,
            lat: Some(-1.2825),
            lng: Some(36.8967),
            shift: Some(ShiftLabel::Opening),
            hours_worked: None,
            is_paid: false,
        }
    }

    #[test]
    fn merge_accumulates_disjoint_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let mut row = in_punch("K-007", date, NaiveTime::from_hms_opt(6, 58, 0).unwrap());

        let out = AttendancePunch {
            status: PunchStatus::ShiftEnded,
            time_in: None,
            time_out: Some(NaiveTime::from_hms_opt(17, 2, 0).unwrap()),
            hours_worked: Some(10.07),
            ..row.clone()
        };
        row.merge_from(&out);

        assert_eq!(row.time_in, Some(NaiveTime::from_hms_opt(6, 58, 0).unwrap()));
        assert_eq!(row.time_out, Some(NaiveTime::from_hms_opt(17, 2, 0).unwrap()));
        assert_eq!(row.hours_worked, Some(10.07));
        assert_eq!(row.status, PunchStatus::ShiftEnded);
    }

    #[test]
    fn merge_is_last_write_wins_on_conflicting_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let mut row = in_punch("K-007", date, NaiveTime::from_hms_opt(6, 58, 0).unwrap());

        let later = AttendancePunch {
            status: PunchStatus::LateArrival,
            time_in: Some(NaiveTime::from_hms_opt(7, 15, 0).unwrap()),
            ..row.clone()
        };
        row.merge_from(&later);

        assert_eq!(row.time_in, Some(NaiveTime::from_hms_opt(7, 15, 0).unwrap()));
        assert_eq!(row.status, PunchStatus::LateArrival);
    }

    #[test]
    fn key_is_case_insensitive_on_employee_id() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let a = in_punch("K-007", date, NaiveTime::from_hms_opt(6, 58, 0).unwrap());
        let b = in_punch("k-007", date, NaiveTime::from_hms_opt(6, 58, 0).unwrap());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn status_labels_render_exact_strings() {
        assert_eq!(PunchStatus::OnTime.to_string(), "On Time");
        assert_eq!(PunchStatus::LateArrival.to_string(), "Late Arrival");
        assert_eq!(PunchStatus::ShiftEnded.to_string(), "Shift Ended");
    }
}
