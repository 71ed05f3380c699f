use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::model::attendance::{AttendancePunch, PunchStatus, PunchType, ShiftLabel};

/// Sunday arrivals are expected by 11:00 regardless of shift.
const SUNDAY_START_HOUR: u32 = 11;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PunchError {
    #[error("Already clocked in today")]
    AlreadyClockedIn,

    #[error("Shift already ended today")]
    AlreadyClockedOut,

    #[error("No clock-in found for today")]
    NoClockIn,
}

/// Expected arrival hour for a shift on a given day.
pub fn expected_start_hour(shift: ShiftLabel, at: NaiveDateTime) -> u32 {
    if at.weekday() == Weekday::Sun {
        SUNDAY_START_HOUR
    } else {
        shift.expected_start_hour()
    }
}

/// Lateness rule: a clock-in is late iff it is strictly after the expected
/// hour at minute zero: minute > 0 at the expected hour already counts as
/// late, seconds are ignored. Applies to arrivals only.
pub fn classify_clock_in(shift: ShiftLabel, at: NaiveDateTime) -> PunchStatus {
    let expected = expected_start_hour(shift, at);
    if at.hour() > expected || (at.hour() == expected && at.minute() > 0) {
        PunchStatus::LateArrival
    } else {
        PunchStatus::OnTime
    }
}

/// (time_out - time_in) in fractional hours, two decimals.
pub fn hours_worked(time_in: chrono::NaiveTime, time_out: chrono::NaiveTime) -> f64 {
    let minutes = (time_out - time_in).num_minutes() as f64;
    (minutes / 60.0 * 100.0).round() / 100.0
}

/// Rejects punches that would violate the at-most-two-writes-per-day shape of
/// the record, before anything reaches storage. `existing` is the day's row
/// as currently known (remote if reachable, otherwise reconstructed from the
/// offline queue).
pub fn validate(punch_type: PunchType, existing: Option<&AttendancePunch>) -> Result<(), PunchError> {
    match punch_type {
        PunchType::In => match existing {
            Some(row) if row.time_in.is_some() => Err(PunchError::AlreadyClockedIn),
            _ => Ok(()),
        },
        PunchType::Out => match existing {
            Some(row) if row.time_out.is_some() => Err(PunchError::AlreadyClockedOut),
            Some(row) if row.time_in.is_some() => Ok(()),
            _ => Err(PunchError::NoClockIn),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use crate::model::attendance::PunchStatus;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // 2026-08-31 is a Monday, 2026-08-30 a Sunday.

    #[test]
    fn opening_shift_0704_is_late() {
        assert_eq!(
            classify_clock_in(ShiftLabel::Opening, at(2026, 8, 31, 7, 4)),
            PunchStatus::LateArrival
        );
    }

    #[test]
    fn opening_shift_0658_is_on_time() {
        assert_eq!(
            classify_clock_in(ShiftLabel::Opening, at(2026, 8, 31, 6, 58)),
            PunchStatus::OnTime
        );
    }

    #[test]
    fn exact_hour_minute_zero_is_on_time() {
        assert_eq!(
            classify_clock_in(ShiftLabel::Opening, at(2026, 8, 31, 7, 0)),
            PunchStatus::OnTime
        );
        assert_eq!(
            classify_clock_in(ShiftLabel::Day, at(2026, 8, 31, 8, 0)),
            PunchStatus::OnTime
        );
    }

    #[test]
    fn day_shift_boundary_is_0800() {
        assert_eq!(
            classify_clock_in(ShiftLabel::Day, at(2026, 8, 31, 7, 59)),
            PunchStatus::OnTime
        );
        assert_eq!(
            classify_clock_in(ShiftLabel::Day, at(2026, 8, 31, 8, 1)),
            PunchStatus::LateArrival
        );
    }

    #[test]
    fn sunday_expects_1100_for_any_shift() {
        assert_eq!(
            classify_clock_in(ShiftLabel::Opening, at(2026, 8, 30, 10, 45)),
            PunchStatus::OnTime
        );
        assert_eq!(
            classify_clock_in(ShiftLabel::Day, at(2026, 8, 30, 11, 1)),
            PunchStatus::LateArrival
        );
    }

    #[test]
    fn hours_worked_rounds_to_two_decimals() {
        let t_in = NaiveTime::from_hms_opt(6, 58, 0).unwrap();
        let t_out = NaiveTime::from_hms_opt(17, 2, 0).unwrap();
        assert_eq!(hours_worked(t_in, t_out), 10.07);

        let t_out_short = NaiveTime::from_hms_opt(7, 28, 0).unwrap();
        assert_eq!(hours_worked(t_in, t_out_short), 0.5);
    }

    fn day_row(time_in: Option<&str>, time_out: Option<&str>) -> AttendancePunch {
        AttendancePunch {
            employee_id: "K-007".into(),
            employee_name: "Jane Wanjiru".into(),
            shop: "Shop 315".into(),
            date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            status: PunchStatus::OnTime,
            time_in: time_in.map(|t| t.parse().unwrap()),
            time_out: time_out.map(|t| t.parse().unwrap()),
            lat: None,
            lng: None,
            shift: Some(ShiftLabel::Opening),
            hours_worked: None,
            is_paid: false,
        }
    }

    #[test]
    fn double_clock_in_is_rejected() {
        let row = day_row(Some("06:58:00"), None);
        assert_eq!(validate(PunchType::In, Some(&row)), Err(PunchError::AlreadyClockedIn));
    }

    #[test]
    fn clock_in_after_clock_out_is_rejected() {
        let row = day_row(Some("06:58:00"), Some("17:02:00"));
        assert_eq!(validate(PunchType::In, Some(&row)), Err(PunchError::AlreadyClockedIn));
    }

    #[test]
    fn clock_out_without_clock_in_is_rejected() {
        assert_eq!(validate(PunchType::Out, None), Err(PunchError::NoClockIn));
        let row = day_row(None, None);
        assert_eq!(validate(PunchType::Out, Some(&row)), Err(PunchError::NoClockIn));
    }

    #[test]
    fn second_clock_out_is_rejected() {
        let row = day_row(Some("06:58:00"), Some("17:02:00"));
        assert_eq!(validate(PunchType::Out, Some(&row)), Err(PunchError::AlreadyClockedOut));
    }

    #[test]
    fn first_punches_pass_validation() {
        assert!(validate(PunchType::In, None).is_ok());
        let row = day_row(Some("06:58:00"), None);
        assert!(validate(PunchType::Out, Some(&row)).is_ok());
    }
}
