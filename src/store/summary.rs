//! Read-side summaries over the ledger: today's progress, the week, insights

use std::collections::HashMap;

use super::entry::{DayRecord, FoodEntry, WEEK_DAYS};
use crate::meals::MealType;

/// Distance from target within which a day counts as on target
pub const ON_TARGET_MARGIN: f64 = 200.0;
/// Excess over target tolerated before a day is reported as over
pub const OVER_MARGIN: f64 = 100.0;

/// Today's intake against the daily target
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub target: u32,
    pub consumed: f64,
    pub remaining: f64,
    /// Fraction of the target consumed, capped at 1
    pub progress: f64,
    pub per_meal: Vec<MealTotal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealTotal {
    pub meal: MealType,
    pub calories: f64,
    pub entries: usize,
}

pub fn daily_summary(entries: &[FoodEntry], target: u32) -> DailySummary {
    let consumed: f64 = entries.iter().map(|e| e.calories).sum();
    let target_f = f64::from(target);
    let progress = if target == 0 {
        1.0
    } else {
        (consumed / target_f).min(1.0)
    };

    let per_meal = MealType::ALL
        .iter()
        .map(|meal| {
            let (calories, count) = entries
                .iter()
                .filter(|e| e.meal == *meal)
                .fold((0.0, 0), |(c, n), e| (c + e.calories, n + 1));
            MealTotal {
                meal: *meal,
                calories,
                entries: count,
            }
        })
        .collect();

    DailySummary {
        target,
        consumed,
        remaining: (target_f - consumed).max(0.0),
        progress,
        per_meal,
    }
}

/// How a day compares with the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayStatus {
    NoData,
    Under(f64),
    Over(f64),
    OnTarget,
}

pub fn day_status(calories: f64, target: u32) -> DayStatus {
    let diff = f64::from(target) - calories;
    if calories == 0.0 {
        DayStatus::NoData
    } else if diff > ON_TARGET_MARGIN {
        DayStatus::Under(diff)
    } else if diff < -OVER_MARGIN {
        DayStatus::Over(diff.abs())
    } else {
        DayStatus::OnTarget
    }
}

fn is_on_target(calories: f64, target: u32) -> bool {
    calories > 0.0 && (calories - f64::from(target)).abs() <= ON_TARGET_MARGIN
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub total_calories: f64,
    /// Total divided by the full window length, empty days included
    pub average_calories: u32,
    pub max_calories: f64,
    pub days_on_target: usize,
}

pub fn week_summary(week: &[DayRecord], target: u32) -> WeekSummary {
    let total_calories: f64 = week.iter().map(|d| d.total_calories).sum();
    let max_calories = week.iter().map(|d| d.total_calories).fold(0.0, f64::max);
    WeekSummary {
        total_calories,
        average_calories: (total_calories / WEEK_DAYS as f64).round() as u32,
        max_calories,
        days_on_target: week
            .iter()
            .filter(|d| is_on_target(d.total_calories, target))
            .count(),
    }
}

/// Entry counts per meal type
pub fn meal_counts(entries: &[FoodEntry]) -> HashMap<MealType, usize> {
    let mut counts: HashMap<MealType, usize> = MealType::ALL.iter().map(|m| (*m, 0)).collect();
    for entry in entries {
        *counts.entry(entry.meal).or_default() += 1;
    }
    counts
}

/// The meal type with the most entries; earlier meals of the day win ties
pub fn most_logged_meal(entries: &[FoodEntry]) -> Option<MealType> {
    let counts = meal_counts(entries);
    let mut best: Option<(MealType, usize)> = None;
    for meal in MealType::ALL {
        let count = counts.get(&meal).copied().unwrap_or(0);
        if count > best.map(|(_, n)| n).unwrap_or(0) {
            best = Some((meal, count));
        }
    }
    best.map(|(meal, _)| meal)
}
