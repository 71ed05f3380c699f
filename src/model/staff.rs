use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One roster entry. The remote store is the source of truth; the terminal
/// keeps a read-only snapshot of the whole roster for offline verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "K-007",
        "employee_name": "Jane Wanjiru",
        "pin": "4921",
        "shop": "Shop 315"
    })
)]
pub struct StaffCredential {
    /// Unique, matched case-insensitively.
    #[schema(example = "K-007")]
    pub employee_id: String,

    #[schema(example = "Jane Wanjiru")]
    pub employee_name: String,

    /// Matched by exact string comparison.
    #[schema(example = "4921")]
    pub pin: String,

    /// Home branch display name.
    #[schema(example = "Shop 315")]
    pub shop: String,
}

impl StaffCredential {
    /// True when `employee_id` and `pin` match this record.
    pub fn matches(&self, employee_id: &str, pin: &str) -> bool {
        self.employee_id.eq_ignore_ascii_case(employee_id) && self.pin == pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> StaffCredential {
        StaffCredential {
            employee_id: "K-007".into(),
            employee_name: "Jane Wanjiru".into(),
            pin: "4921".into(),
            shop: "Shop 315".into(),
        }
    }

    #[test]
    fn id_match_is_case_insensitive() {
        assert!(jane().matches("k-007", "4921"));
        assert!(jane().matches("K-007", "4921"));
    }

    #[test]
    fn pin_match_is_exact() {
        assert!(!jane().matches("K-007", "4920"));
        assert!(!jane().matches("K-007", "492"));
        assert!(!jane().matches("K-007", ""));
    }

    #[test]
    fn no_partial_id_match() {
        assert!(!jane().matches("K-00", "4921"));
        assert!(!jane().matches("K-0071", "4921"));
    }
}
