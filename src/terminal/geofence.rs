use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::shop::ShopLocation;

/// Mean earth radius in meters (spherical approximation).
const EARTH_RADIUS_M: f64 = 6_371e3;

/// What the device reported when asked for a position. Anything other than a
/// fix is treated as out of range: the gate fails closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionReading {
    Fix { lat: f64, lng: f64 },
    Denied,
    Timeout,
    Unsupported,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeofenceCheck {
    /// Rounded to the nearest meter; absent when no fix was obtained.
    #[schema(example = 182, nullable = true)]
    pub distance_m: Option<i64>,

    pub in_range: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GeofencePolicy {
    /// Allowed radius around the shop, in meters.
    pub radius_m: f64,
}

impl GeofencePolicy {
    /// Gates a punch on physical presence. No automatic retry happens here;
    /// the terminal re-invokes this on an explicit retry action.
    pub fn evaluate(&self, reading: PositionReading, shop: &ShopLocation) -> GeofenceCheck {
        match reading {
            PositionReading::Fix { lat, lng } => {
                let distance = haversine_m(lat, lng, shop.lat, shop.lng);
                let rounded = distance.round() as i64;
                GeofenceCheck {
                    distance_m: Some(rounded),
                    in_range: rounded as f64 <= self.radius_m,
                }
            }
            PositionReading::Denied | PositionReading::Timeout | PositionReading::Unsupported => {
                GeofenceCheck {
                    distance_m: None,
                    in_range: false,
                }
            }
        }
    }
}

/// Great-circle distance in meters between two (lat, lng) pairs, haversine
/// formula on a spherical earth.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> ShopLocation {
        ShopLocation {
            id: "315".into(),
            name: "Shop 315".into(),
            lat: -1.2825,
            lng: 36.8967,
            color: "bg-blue-600".into(),
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let (a, b) = ((-1.2825, 36.8967), (-1.2921, 36.8219));
        let d1 = haversine_m(a.0, a.1, b.0, b.1);
        let d2 = haversine_m(b.0, b.1, a.0, a.1);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_at_same_point() {
        assert_eq!(haversine_m(-1.2825, 36.8967, -1.2825, 36.8967), 0.0);
    }

    #[test]
    fn known_distance_within_tolerance() {
        // Shop 315 to Nairobi CBD is roughly 8.4 km.
        let d = haversine_m(-1.2825, 36.8967, -1.2921, 36.8219);
        assert!((8_000.0..9_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn in_range_at_and_within_radius() {
        let policy = GeofencePolicy { radius_m: 1500.0 };
        let check = policy.evaluate(
            PositionReading::Fix { lat: -1.2825, lng: 36.8967 },
            &shop(),
        );
        assert!(check.in_range);
        assert_eq!(check.distance_m, Some(0));

        // ~0.01 deg latitude is ~1.1 km, still inside 1500 m.
        let near = policy.evaluate(
            PositionReading::Fix { lat: -1.2725, lng: 36.8967 },
            &shop(),
        );
        assert!(near.in_range);
    }

    #[test]
    fn out_of_range_beyond_radius() {
        let policy = GeofencePolicy { radius_m: 50.0 };
        let check = policy.evaluate(
            PositionReading::Fix { lat: -1.2921, lng: 36.8219 },
            &shop(),
        );
        assert!(!check.in_range);
        assert!(check.distance_m.unwrap() > 50);
    }

    #[test]
    fn position_failures_fail_closed() {
        let policy = GeofencePolicy { radius_m: 1500.0 };
        for reading in [
            PositionReading::Denied,
            PositionReading::Timeout,
            PositionReading::Unsupported,
        ] {
            let check = policy.evaluate(reading, &shop());
            assert!(!check.in_range);
            assert!(check.distance_m.is_none());
        }
    }
}
