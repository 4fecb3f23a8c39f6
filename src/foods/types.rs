//! Food catalog wire types

use serde::{Deserialize, Serialize};

/// A catalog item. Read-only from the client's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub calories_per_unit: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub unit_type: String,
    #[serde(rename = "unit_size_description")]
    pub unit_description: String,
}
