//! The state held by the application store

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::entry::{empty_week, roll_week, DayRecord, FoodEntry};
use super::profile::{LocalProfile, FALLBACK_CALORIE_TARGET};
use super::summary::{daily_summary, DailySummary};
use crate::auth::Session;
use crate::foods::Food;
use crate::meals::{DayStats, Meal, MealType};

/// Number of steps in the setup wizard
pub const SETUP_STEPS: u8 = 3;

/// Screens of the tracker. Any screen may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Auth,
    Onboarding,
    Setup,
    Home,
    AddFood,
    History,
    Insights,
    Profile,
}

/// Everything the screens read.
///
/// `today_entries` and `week_history` are only changed through methods that
/// keep today's record in the week window equal to the live ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub current_screen: Screen,
    pub setup_step: u8,
    pub is_onboarded: bool,
    pub profile: Option<LocalProfile>,
    pub selected_meal: MealType,

    pub session: Session,

    pub backend_foods: Vec<Food>,
    pub today_meals: Vec<Meal>,
    pub today_stats: Option<DayStats>,

    /// Shared by every operation in flight; the last writer wins
    pub is_loading: bool,
    pub error: Option<String>,

    today_entries: Vec<FoodEntry>,
    week_history: Vec<DayRecord>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl AppState {
    /// Initial state, with the history window ending on `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current_screen: Screen::Auth,
            setup_step: 1,
            is_onboarded: false,
            profile: None,
            selected_meal: MealType::Breakfast,
            session: Session::default(),
            backend_foods: Vec::new(),
            today_meals: Vec::new(),
            today_stats: None,
            is_loading: false,
            error: None,
            today_entries: Vec::new(),
            week_history: empty_week(today),
        }
    }

    pub fn today_entries(&self) -> &[FoodEntry] {
        &self.today_entries
    }

    /// The last seven days, oldest first; the last record is today
    pub fn week_history(&self) -> &[DayRecord] {
        &self.week_history
    }

    pub fn find_entry(&self, id: &str) -> Option<&FoodEntry> {
        self.today_entries.iter().find(|e| e.id == id)
    }

    pub fn entries_for(&self, meal: MealType) -> impl Iterator<Item = &FoodEntry> {
        self.today_entries.iter().filter(move |e| e.meal == meal)
    }

    /// The goal to measure today against: the backend goal, then the wizard
    /// target, then the fallback
    pub fn daily_target(&self) -> u32 {
        self.session
            .daily_calorie_goal()
            .or_else(|| self.profile.map(|p| p.daily_calorie_target))
            .unwrap_or(FALLBACK_CALORIE_TARGET)
    }

    pub fn daily_summary(&self) -> DailySummary {
        daily_summary(&self.today_entries, self.daily_target())
    }

    pub(crate) fn push_entry(&mut self, entry: FoodEntry) {
        self.today_entries.retain(|e| e.id != entry.id);
        self.today_entries.push(entry);
        self.sync_today();
    }

    /// Remove every entry matching `pred`, returning how many went
    pub(crate) fn remove_entries(&mut self, pred: impl Fn(&FoodEntry) -> bool) -> usize {
        let before = self.today_entries.len();
        self.today_entries.retain(|e| !pred(e));
        let removed = before - self.today_entries.len();
        self.sync_today();
        removed
    }

    pub(crate) fn replace_entries(&mut self, entries: Vec<FoodEntry>) {
        let today = Local::now().date_naive();
        self.roll_to(today);
        self.today_entries = entries;
        self.sync_today_on(today);
    }

    fn sync_today(&mut self) {
        self.sync_today_on(Local::now().date_naive());
    }

    /// Roll the window to `today` and copy the live ledger into its last record.
    ///
    /// When the day has changed since the last write, entries logged on an
    /// earlier local date stay in their own record and leave the live ledger.
    pub(crate) fn sync_today_on(&mut self, today: NaiveDate) {
        if self.roll_to(today) {
            self.today_entries
                .retain(|e| e.timestamp.with_timezone(&Local).date_naive() == today);
        }
        if let Some(record) = self.week_history.last_mut() {
            *record = DayRecord::with_entries(today, self.today_entries.clone());
        }
    }

    /// Returns `true` if the window moved to a new day
    fn roll_to(&mut self, today: NaiveDate) -> bool {
        let rolled = self.week_history.last().map(|d| d.date) != Some(today);
        roll_week(&mut self.week_history, today);
        rolled
    }
}
