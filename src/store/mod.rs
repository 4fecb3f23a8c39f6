//! Application state store
//!
//! One [`AppStore`] is created when the application starts and shared by
//! every screen. Screens read [`AppState`] snapshots (or [`AppStore::subscribe`]
//! to be told about changes) and call the store's actions; the store applies
//! each mutation atomically and delegates network I/O to the [`ApiClient`].
//!
//! Follow-up refreshes after a mutation are spawned and not awaited. Their
//! results are applied whenever they resolve, so two overlapping
//! [`AppStore::fetch_today_data`] calls apply in the order they *finish*,
//! not the order they were issued.

mod entry;
mod presets;
mod profile;
mod state;
mod summary;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::validate::{validate_login, validate_registration};
use crate::auth::{AuthResponse, Session, UserProfile};
use crate::error::{Error, Result};
use crate::meals::MealType;
use crate::ApiClient;

pub use entry::*;
pub use presets::*;
pub use profile::*;
pub use state::*;
pub use summary::*;

/// Process-wide state container for the tracker
#[derive(Clone)]
pub struct AppStore {
    api: ApiClient,
    state: Arc<watch::Sender<AppState>>,
    search_generation: Arc<AtomicU64>,
}

impl AppStore {
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            api,
            state: Arc::new(state),
            search_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Receiver that is notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Read the current state without copying it. Do not hold across an await.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    fn update<R: Default>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut out = None;
        self.state.send_modify(|state| out = Some(f(state)));
        out.unwrap_or_default()
    }

    fn fail(&self, err: &Error) {
        let message = err.to_string();
        self.update(|s| {
            s.error = Some(message);
            s.is_loading = false;
        });
    }

    // Navigation

    pub fn set_screen(&self, screen: Screen) {
        self.update(|s| s.current_screen = screen);
    }

    /// Callers keep `step` within `1..=SETUP_STEPS`
    pub fn set_setup_step(&self, step: u8) {
        self.update(|s| s.setup_step = step);
    }

    /// Advance the wizard. On the last step the draft is completed into a
    /// profile and stored; returns `true` when that happened.
    pub fn next_setup_step(&self, draft: &ProfileDraft) -> Result<bool> {
        let step = self.with_state(|s| s.setup_step);
        if step < SETUP_STEPS {
            self.set_setup_step(step + 1);
            return Ok(false);
        }

        let profile = LocalProfile::from_draft(draft)
            .ok_or_else(|| Error::validation("Please complete every step of your profile"))?;
        self.set_profile(profile);
        Ok(true)
    }

    pub fn previous_setup_step(&self) {
        self.update(|s| {
            if s.setup_step > 1 {
                s.setup_step -= 1;
            }
        });
    }

    pub fn complete_onboarding(&self) {
        self.update(|s| {
            s.is_onboarded = true;
            s.current_screen = Screen::Setup;
        });
    }

    /// Store the wizard result and go home. Also marks onboarding complete.
    pub fn set_profile(&self, profile: LocalProfile) {
        self.update(|s| {
            s.profile = Some(profile);
            s.is_onboarded = true;
            s.current_screen = Screen::Home;
        });
    }

    pub fn set_selected_meal(&self, meal: MealType) {
        self.update(|s| s.selected_meal = meal);
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    // Session

    /// Silently validate a stored token. Never fails: every failure ends in
    /// the signed-out state on the auth screen.
    pub async fn check_auth(&self) {
        self.update(|s| s.session.checking_auth = true);

        match self.api.auth().validate_token().await {
            Some((token, profile)) => {
                info!(email = %profile.email, "restored session");
                self.update(|s| {
                    s.session = Session::authenticated(token, profile);
                    s.current_screen = Screen::Onboarding;
                });
                self.prime_in_background();
            }
            None => {
                debug!("no valid stored session");
                self.update(|s| {
                    s.session = Session::default();
                    s.current_screen = Screen::Auth;
                });
            }
        }
    }

    /// Sign in. Failures are stored in `error` and returned so the caller
    /// can reset its own submit state.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        if let Err(e) = validate_login(email, password) {
            self.fail(&e);
            return Err(e);
        }

        self.begin_loading();
        let signed_in = self.api.auth().sign_in(email, password).await;
        self.finish_sign_in(signed_in).await
    }

    /// Create an account with the given daily calorie goal, then sign in as it.
    ///
    /// Use [`crate::auth::DEFAULT_DAILY_CALORIE_GOAL`] when the user did not choose one.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
        daily_calorie_goal: u32,
    ) -> Result<()> {
        if let Err(e) = validate_registration(email, password, confirm_password, daily_calorie_goal) {
            self.fail(&e);
            return Err(e);
        }

        self.begin_loading();
        let signed_up = self
            .api
            .auth()
            .sign_up(email, password, daily_calorie_goal)
            .await;
        self.finish_sign_in(signed_up).await
    }

    async fn finish_sign_in(&self, response: Result<AuthResponse>) -> Result<()> {
        let result: Result<(String, UserProfile)> = match response {
            Ok(auth) => match self.api.auth().get_profile().await {
                Ok(profile) => Ok((auth.access_token, profile)),
                Err(e) => {
                    // the token is only trusted once a profile came back with it
                    if let Err(remove) = self.api.auth().sign_out() {
                        warn!(error = %remove, "failed to remove stored token");
                    }
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        match result {
            Ok((token, profile)) => {
                self.update(|s| {
                    s.session = Session::authenticated(token, profile);
                    s.current_screen = Screen::Onboarding;
                    s.is_loading = false;
                });
                self.prime_in_background();
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Forget the token and reset every part of the state to its initial value
    pub fn logout(&self) {
        if let Err(e) = self.api.auth().sign_out() {
            warn!(error = %e, "failed to remove stored token");
        }
        self.search_generation.fetch_add(1, Ordering::SeqCst);
        self.update(|s| *s = AppState::default());
        info!("signed out");
    }

    // Catalog

    /// Load the whole food catalog into `backend_foods`
    pub async fn fetch_foods(&self) -> Result<()> {
        match self.api.foods().list().await {
            Ok(foods) => {
                self.update(|s| {
                    if s.session.is_authenticated {
                        s.backend_foods = foods;
                    }
                });
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Debounced catalog search.
    ///
    /// Waits for the configured quiet period and gives up if another search
    /// started meanwhile. A response that arrives after a newer search was
    /// issued is discarded. Returns whether this call's results were applied.
    /// An empty query lists the whole catalog.
    pub async fn search_foods(&self, query: &str) -> Result<bool> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let is_current = || self.search_generation.load(Ordering::SeqCst) == generation;

        tokio::time::sleep(self.api.options().search_debounce).await;
        if !is_current() {
            return Ok(false);
        }

        let query = query.trim();
        let found = if query.is_empty() {
            self.api.foods().list().await
        } else {
            self.api.foods().search(query).await
        };

        if !is_current() {
            debug!(query, "discarding stale search response");
            return Ok(false);
        }

        match found {
            Ok(foods) => {
                self.update(|s| s.backend_foods = foods);
                Ok(true)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    // Ledger

    /// Replace today's ledger with the backend's meals and refresh the stats.
    ///
    /// This is a full replace: local-only entries are dropped once it succeeds.
    /// Overlapping calls are not fenced; whichever resolves last wins.
    pub async fn fetch_today_data(&self) -> Result<()> {
        if !self.with_state(|s| s.session.is_authenticated) {
            return Err(Error::NotAuthenticated);
        }

        self.update(|s| s.is_loading = true);
        let meals = self.api.meals();
        match tokio::try_join!(meals.today(), meals.today_stats()) {
            Ok((today, stats)) => {
                let entries: Vec<FoodEntry> = today.iter().map(FoodEntry::from).collect();
                debug!(meals = today.len(), "reconciled today's ledger");
                self.update(|s| {
                    s.is_loading = false;
                    // a response landing after logout must not repopulate the ledger
                    if !s.session.is_authenticated {
                        return;
                    }
                    s.today_meals = today;
                    s.today_stats = Some(stats);
                    s.replace_entries(entries);
                });
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Log a catalog food on the backend and add it to today's ledger.
    ///
    /// Navigates home on success and refreshes today's data in the background.
    pub async fn add_meal_to_backend(
        &self,
        food_id: i64,
        meal_type: MealType,
        quantity: f64,
    ) -> Result<FoodEntry> {
        if !self.with_state(|s| s.session.is_authenticated) {
            let e = Error::NotAuthenticated;
            self.fail(&e);
            return Err(e);
        }

        self.begin_loading();
        match self.api.meals().log(food_id, meal_type, quantity).await {
            Ok(meal) => {
                let entry = FoodEntry::from(&meal);
                info!(meal_id = meal.id, food_id, "meal logged");
                let added = entry.clone();
                self.update(|s| {
                    s.today_meals.push(meal);
                    s.push_entry(added);
                    s.current_screen = Screen::Home;
                    s.is_loading = false;
                });
                self.refresh_today_in_background();
                Ok(entry)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Add a local-only entry and navigate home. Never touches the backend.
    pub fn add_food_entry(&self, entry: NewFoodEntry) -> FoodEntry {
        let entry = FoodEntry::local(entry);
        let added = entry.clone();
        self.update(|s| {
            s.push_entry(added);
            s.current_screen = Screen::Home;
        });
        entry
    }

    /// Add a preset estimate to the currently selected meal
    pub fn quick_add(&self, preset: QuickAdd) -> FoodEntry {
        let meal = self.with_state(|s| s.selected_meal);
        self.add_food_entry(NewFoodEntry::new(preset.label, f64::from(preset.calories), meal))
    }

    /// Remove an entry from today's ledger at once.
    ///
    /// Backend-linked entries are also deleted on the server in the
    /// background; if that fails the entry stays removed locally and comes
    /// back on the next successful [`AppStore::fetch_today_data`].
    pub fn remove_food_entry(&self, id: &str) -> bool {
        let removed = self.update(|s| {
            let entry = s.find_entry(id).cloned();
            if entry.is_some() {
                s.remove_entries(|e| e.id == id);
            }
            entry
        });

        match removed {
            Some(entry) => {
                if let EntrySource::Backend { meal_id, .. } = entry.source {
                    let store = self.clone();
                    self.spawn_background("remove_meal_from_backend", async move {
                        store.remove_meal_from_backend(meal_id).await
                    });
                }
                true
            }
            None => false,
        }
    }

    /// Delete a meal on the server, drop it locally and refresh in the background
    pub async fn remove_meal_from_backend(&self, meal_id: i64) -> Result<()> {
        match self.api.meals().delete(meal_id).await {
            Ok(()) => {
                info!(meal_id, "meal deleted");
                self.update(|s| {
                    s.today_meals.retain(|m| m.id != meal_id);
                    s.remove_entries(|e| e.backend_meal_id() == Some(meal_id));
                });
                self.refresh_today_in_background();
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn begin_loading(&self) {
        self.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn prime_in_background(&self) {
        self.refresh_today_in_background();
        let store = self.clone();
        self.spawn_background("fetch_foods", async move { store.fetch_foods().await });
    }

    fn refresh_today_in_background(&self) {
        let store = self.clone();
        self.spawn_background("fetch_today_data", async move { store.fetch_today_data().await });
    }

    /// Run `task` detached. Its error is already in `error`; it is only logged here.
    fn spawn_background<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = task.await {
                        warn!(task = name, error = %e, "background task failed");
                    }
                });
            }
            Err(_) => warn!(task = name, "no async runtime, background task skipped"),
        }
    }
}
