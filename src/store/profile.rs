//! Wizard-entered body profile and the daily calorie target derived from it

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target returned when the profile is incomplete. A valid default, not an error.
pub const FALLBACK_CALORIE_TARGET: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    /// Daily adjustment applied on top of the energy expenditure, in kcal
    pub fn adjustment(&self) -> f64 {
        match self {
            Self::Lose => -500.0,
            Self::Maintain => 0.0,
            Self::Gain => 300.0,
        }
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lose" => Ok(Self::Lose),
            "maintain" => Ok(Self::Maintain),
            "gain" => Ok(Self::Gain),
            other => Err(format!("unknown goal: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "sedentary" => Ok(Self::Sedentary),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "active" => Ok(Self::Active),
            "very-active" => Ok(Self::VeryActive),
            other => Err(format!("unknown activity level: {}", other)),
        }
    }
}

/// Setup wizard input, possibly incomplete
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<Goal>,
    pub activity_level: Option<ActivityLevel>,
}

impl Default for ProfileDraft {
    /// The values the setup wizard starts from
    fn default() -> Self {
        Self {
            age: Some(25),
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            goal: Some(Goal::Maintain),
            activity_level: Some(ActivityLevel::Moderate),
        }
    }
}

impl ProfileDraft {
    /// A draft with nothing filled in
    pub fn empty() -> Self {
        Self {
            age: None,
            height_cm: None,
            weight_kg: None,
            goal: None,
            activity_level: None,
        }
    }
}

/// Completed wizard result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalProfile {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal: Goal,
    pub activity_level: ActivityLevel,
    /// Computed once when the wizard completes; not kept in sync with the fields above
    pub daily_calorie_target: u32,
}

impl LocalProfile {
    /// Complete a draft, computing the calorie target. `None` if any field is missing.
    pub fn from_draft(draft: &ProfileDraft) -> Option<Self> {
        Some(Self {
            age: present(draft.age.map(f64::from))? as u32,
            height_cm: present(draft.height_cm)?,
            weight_kg: present(draft.weight_kg)?,
            goal: draft.goal?,
            activity_level: draft.activity_level?,
            daily_calorie_target: calorie_target(draft),
        })
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Daily calorie target from the Mifflin-St Jeor equation.
///
/// The male constant (+5) is applied to everyone. Missing or zero inputs
/// yield [`FALLBACK_CALORIE_TARGET`].
pub fn calorie_target(draft: &ProfileDraft) -> u32 {
    let (Some(age), Some(height), Some(weight), Some(goal), Some(activity)) = (
        present(draft.age.map(f64::from)),
        present(draft.height_cm),
        present(draft.weight_kg),
        draft.goal,
        draft.activity_level,
    ) else {
        return FALLBACK_CALORIE_TARGET;
    };

    let bmr = 10.0 * weight + 6.25 * height - 5.0 * age + 5.0;
    let tdee = bmr * activity.multiplier();

    (tdee + goal.adjustment()).round().max(0.0) as u32
}
