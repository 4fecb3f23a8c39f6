//! The unified food ledger: entries from the backend and entries created locally

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meals::{Meal, MealType};

/// Number of days kept in the rolling history window, today included
pub const WEEK_DAYS: usize = 7;

/// Where an entry came from, which decides how it is removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EntrySource {
    /// Converted from a server-side meal; removal also deletes it on the server
    Backend {
        meal_id: i64,
        food_id: i64,
        quantity: f64,
    },
    /// Quick-add or unauthenticated entry; removal never touches the network
    Local,
}

/// One logged food item for a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Unique within the day's list
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub meal: MealType,
    pub timestamp: DateTime<Utc>,
    pub portion: Option<String>,
    #[serde(flatten)]
    pub source: EntrySource,
}

/// Input for a locally created entry; id and timestamp are assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub name: String,
    pub calories: f64,
    pub meal: MealType,
    pub portion: Option<String>,
}

impl NewFoodEntry {
    pub fn new(name: &str, calories: f64, meal: MealType) -> Self {
        Self {
            name: name.to_string(),
            calories,
            meal,
            portion: None,
        }
    }

    pub fn with_portion(mut self, portion: &str) -> Self {
        self.portion = Some(portion.to_string());
        self
    }
}

/// Id used for the entry of a backend meal. Stable across refetches.
pub fn backend_entry_id(meal_id: i64) -> String {
    format!("meal-{}", meal_id)
}

impl FoodEntry {
    /// Create a local-only entry with a random id, stamped now
    pub fn local(entry: NewFoodEntry) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: entry.name,
            calories: entry.calories,
            meal: entry.meal,
            timestamp: Utc::now(),
            portion: entry.portion,
            source: EntrySource::Local,
        }
    }

    /// Meal id on the server, for backend-linked entries
    pub fn backend_meal_id(&self) -> Option<i64> {
        match self.source {
            EntrySource::Backend { meal_id, .. } => Some(meal_id),
            EntrySource::Local => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.source, EntrySource::Local)
    }
}

impl From<&Meal> for FoodEntry {
    /// Calories are the server's total for the logged quantity, not recomputed
    fn from(meal: &Meal) -> Self {
        Self {
            id: backend_entry_id(meal.id),
            name: meal.food.name.clone(),
            calories: meal.total_calories,
            meal: meal.meal_type,
            timestamp: meal.logged_at_utc().unwrap_or_else(Utc::now),
            portion: Some(meal.portion_label()),
            source: EntrySource::Backend {
                meal_id: meal.id,
                food_id: meal.food.id,
                quantity: meal.quantity,
            },
        }
    }
}

/// All entries of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub entries: Vec<FoodEntry>,
    pub total_calories: f64,
}

impl DayRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
            total_calories: 0.0,
        }
    }

    pub fn with_entries(date: NaiveDate, entries: Vec<FoodEntry>) -> Self {
        let total_calories = total_calories(&entries);
        Self {
            date,
            entries,
            total_calories,
        }
    }
}

pub fn total_calories(entries: &[FoodEntry]) -> f64 {
    entries.iter().map(|e| e.calories).sum()
}

/// Empty window of [`WEEK_DAYS`] days ending on `today`, oldest first
pub fn empty_week(today: NaiveDate) -> Vec<DayRecord> {
    (0..WEEK_DAYS as i64)
        .rev()
        .map(|days_ago| DayRecord::empty(today - Duration::days(days_ago)))
        .collect()
}

/// Move the window forward so that it ends on `today`.
///
/// Days already in the window keep their records; new days start empty.
pub fn roll_week(week: &mut Vec<DayRecord>, today: NaiveDate) {
    if week.last().map(|d| d.date) == Some(today) && week.len() == WEEK_DAYS {
        return;
    }

    let mut rolled = empty_week(today);
    for day in rolled.iter_mut() {
        if let Some(existing) = week.iter().find(|d| d.date == day.date) {
            *day = existing.clone();
        }
    }
    *week = rolled;
}
