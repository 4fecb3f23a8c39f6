//! Meal ledger wire types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::foods::Food;

/// Which meal of the day an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

impl MealType {
    /// All meal types in the order they are shown during the day
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Snacks,
        MealType::Dinner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snacks => "snacks",
            Self::Dinner => "dinner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Snacks => "Snacks",
            Self::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "snacks" | "snack" => Ok(Self::Snacks),
            "dinner" => Ok(Self::Dinner),
            other => Err(format!("unknown meal type: {}", other)),
        }
    }
}

/// Body of `POST /meals`
#[derive(Debug, Clone, Serialize)]
pub struct LogMealRequest {
    pub food_id: i64,
    pub meal_type: MealType,
    pub quantity: f64,
}

/// A meal logged on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub food: Food,
    pub meal_type: MealType,
    pub quantity: f64,
    pub logged_at: String,
    /// Calories for the logged quantity, computed by the server
    pub total_calories: f64,
}

impl Meal {
    /// `logged_at` as UTC. The backend sends naive timestamps, read as UTC.
    pub fn logged_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.logged_at) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.logged_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Portion label, e.g. `"2 bowl"`
    pub fn portion_label(&self) -> String {
        format!("{} {}", self.quantity, self.food.unit_type)
    }
}

/// One row of the per-meal breakdown in [`DayStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    pub id: i64,
    pub food_name: String,
    pub quantity: f64,
    pub unit: String,
    pub calories: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealsByType {
    #[serde(default)]
    pub breakfast: Vec<MealSummary>,
    #[serde(default)]
    pub lunch: Vec<MealSummary>,
    #[serde(default)]
    pub dinner: Vec<MealSummary>,
    #[serde(default)]
    pub snacks: Vec<MealSummary>,
}

impl MealsByType {
    pub fn get(&self, meal: MealType) -> &[MealSummary] {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Snacks => &self.snacks,
            MealType::Dinner => &self.dinner,
        }
    }
}

/// Aggregate nutrition for today, as computed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    pub daily_goal: u32,
    pub remaining_calories: f64,
    #[serde(default)]
    pub meals_by_type: MealsByType,
}
