use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Built-in branch table used when no SHOPS_FILE is configured.
/// Static configuration, never mutated at runtime.
static DEFAULT_SHOPS: Lazy<Vec<ShopLocation>> = Lazy::new(|| {
    vec![
        ShopLocation {
            id: "315".into(),
            name: "Shop 315".into(),
            lat: -1.2825,
            lng: 36.8967,
            color: "bg-blue-600".into(),
        },
        ShopLocation {
            id: "172".into(),
            name: "Shop 172".into(),
            lat: -1.2825,
            lng: 36.8967,
            color: "bg-slate-900".into(),
        },
        ShopLocation {
            id: "Stage".into(),
            name: "Stage Outlet".into(),
            lat: -1.2825,
            lng: 36.8967,
            color: "bg-green-600".into(),
        },
    ]
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "315",
        "name": "Shop 315",
        "lat": -1.2825,
        "lng": 36.8967,
        "color": "bg-blue-600"
    })
)]
pub struct ShopLocation {
    #[schema(example = "315")]
    pub id: String,

    #[schema(example = "Shop 315")]
    pub name: String,

    #[schema(example = -1.2825)]
    pub lat: f64,

    #[schema(example = 36.8967)]
    pub lng: f64,

    /// Accent class used by the kiosk front-end and the QR posters.
    #[schema(example = "bg-blue-600")]
    pub color: String,
}

/// Lookup table of configured branches, keyed by branch id.
#[derive(Debug, Clone)]
pub struct ShopRegistry {
    shops: BTreeMap<String, ShopLocation>,
}

impl ShopRegistry {
    pub fn new(shops: Vec<ShopLocation>) -> Self {
        Self {
            shops: shops.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Loads the registry from a JSON file containing a `ShopLocation` array.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shops file {}", path.display()))?;
        let shops: Vec<ShopLocation> =
            serde_json::from_str(&raw).context("Invalid shops file format")?;
        Ok(Self::new(shops))
    }

    pub fn get(&self, id: &str) -> Option<&ShopLocation> {
        self.shops.get(id)
    }

    pub fn all(&self) -> Vec<ShopLocation> {
        self.shops.values().cloned().collect()
    }
}

impl Default for ShopRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SHOPS.clone())
    }
}
