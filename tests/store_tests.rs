use std::sync::Arc;
use std::time::Duration;

use calorie_tracker_client::auth::{MemoryTokenStore, TokenStore};
use calorie_tracker_client::config::ClientOptions;
use calorie_tracker_client::error::NETWORK_ERROR_MESSAGE;
use calorie_tracker_client::meals::MealType;
use calorie_tracker_client::store::{
    AppState, AppStore, EntrySource, NewFoodEntry, ProfileDraft, Screen, MEDIUM_MEAL,
};
use calorie_tracker_client::ApiClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_with(server: &MockServer, tokens: Arc<MemoryTokenStore>) -> AppStore {
    let options = ClientOptions::default()
        .with_base_url(&server.uri())
        .with_search_debounce(Duration::from_millis(20));
    AppStore::new(ApiClient::with_token_store(options, tokens).unwrap())
}

/// Base URL of a local port with nothing listening on it
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn offline_store(tokens: Arc<MemoryTokenStore>) -> AppStore {
    let options = ClientOptions::default().with_base_url(&closed_port_url());
    AppStore::new(ApiClient::with_token_store(options, tokens).unwrap())
}

fn food(id: i64, name: &str, calories: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "calories_per_unit": calories,
        "protein_g": 1.0,
        "carbs_g": 1.0,
        "fats_g": 1.0,
        "unit_type": "bowl",
        "unit_size_description": "1 bowl"
    })
}

fn meal(id: i64, meal_type: &str, quantity: f64, total: f64) -> Value {
    json!({
        "id": id,
        "food": food(3, "Dal", 150.0),
        "meal_type": meal_type,
        "quantity": quantity,
        "logged_at": "2024-05-06T12:00:00",
        "total_calories": total
    })
}

fn stats(total: f64) -> Value {
    json!({
        "total_calories": total,
        "total_protein": 0.0,
        "total_carbs": 0.0,
        "total_fats": 0.0,
        "daily_goal": 2000,
        "remaining_calories": 2000.0 - total,
        "meals_by_type": {"breakfast": [], "lunch": [], "dinner": [], "snacks": []}
    })
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "test@example.com",
            "daily_calorie_goal": 2000,
            "created_at": "2024-01-01T08:00:00"
        })))
        .mount(server)
        .await;
}

async fn mount_today(server: &MockServer, meals: Value, total: f64) {
    Mock::given(method("GET"))
        .and(path("/meals/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meals))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/meals/stats/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats(total)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/foods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([food(3, "Dal", 150.0)])))
        .mount(server)
        .await;
}

/// Poll the store until `pred` holds, giving background tasks time to run
async fn wait_for(store: &AppStore, pred: impl Fn(&AppState) -> bool) -> bool {
    for _ in 0..100 {
        if store.with_state(&pred) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn requests_to(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| AsRef::<str>::as_ref(&r.method) == verb && r.url.path() == route)
        .count()
}

async fn signed_in_store(server: &MockServer, meals: Value, total: f64) -> AppStore {
    mount_profile(server).await;
    mount_today(server, meals, total).await;
    let store = store_with(server, Arc::new(MemoryTokenStore::with_token("valid")));
    store.check_auth().await;
    assert!(store.with_state(|s| s.session.is_authenticated));
    store
}

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test_access_token",
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;
    mount_profile(&server).await;
    mount_today(&server, json!([meal(1, "lunch", 1.0, 150.0)]), 150.0).await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let store = store_with(&server, tokens.clone());

    store.login("test@example.com", "password123").await.unwrap();

    let state = store.snapshot();
    assert!(state.session.is_authenticated);
    assert_eq!(state.current_screen, Screen::Onboarding);
    assert_eq!(state.session.user_email.as_deref(), Some("test@example.com"));
    assert_eq!(state.session.token.as_deref(), Some("test_access_token"));
    assert!(!state.is_loading);
    assert_eq!(tokens.get().as_deref(), Some("test_access_token"));

    // today's data and the catalog are primed without the caller awaiting them
    assert!(wait_for(&store, |s| s.today_entries().len() == 1 && s.backend_foods.len() == 1).await);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&server)
        .await;

    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));
    let result = store.login("test@example.com", "wrongpass").await;

    assert!(result.is_err());
    let state = store.snapshot();
    assert!(state.error.as_deref().unwrap().contains("Invalid email or password."));
    assert!(!state.session.is_authenticated);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_login_rejects_invalid_input_without_request() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));

    assert!(store.login("not-an-email", "password123").await.is_err());
    assert_eq!(
        store.snapshot().error.as_deref(),
        Some("Please enter a valid email address")
    );
    assert_eq!(requests_to(&server, "POST", "/auth/login").await, 0);

    store.clear_error();
    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn test_register_carries_goal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(wiremock::matchers::body_json(json!({
            "email": "new@example.com",
            "password": "password123",
            "daily_calorie_goal": 2500
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "new_token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server).await;
    mount_today(&server, json!([]), 0.0).await;

    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));
    store.register("new@example.com", "password123", "password123", 2500).await.unwrap();
    assert_eq!(store.snapshot().current_screen, Screen::Onboarding);
}

#[tokio::test]
async fn test_register_rejects_mismatched_confirmation() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));

    let err = store
        .register("new@example.com", "password123", "password124", 2000)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Passwords do not match");
    assert_eq!(store.snapshot().error.as_deref(), Some("Passwords do not match"));
    assert_eq!(requests_to(&server, "POST", "/auth/signup").await, 0);
}

#[tokio::test]
async fn test_check_auth_without_token_routes_to_auth() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));
    store.set_screen(Screen::Home);

    store.check_auth().await;

    let state = store.snapshot();
    assert!(!state.session.is_authenticated);
    assert!(!state.session.checking_auth);
    assert_eq!(state.current_screen, Screen::Auth);
}

#[tokio::test]
async fn test_check_auth_with_unreachable_server() {
    let tokens = Arc::new(MemoryTokenStore::with_token("valid"));
    let store = offline_store(tokens.clone());

    store.check_auth().await;
    store.check_auth().await;

    let state = store.snapshot();
    assert!(!state.session.is_authenticated);
    assert!(!state.session.checking_auth);
    assert_eq!(state.current_screen, Screen::Auth);
    assert!(tokens.get().is_none());
}

#[tokio::test]
async fn test_login_with_unreachable_server() {
    let tokens = Arc::new(MemoryTokenStore::new());
    let store = offline_store(tokens.clone());
    store.set_screen(Screen::Auth);

    let err = store.login("test@example.com", "password123").await.unwrap_err();
    assert!(err.is_network());

    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some(NETWORK_ERROR_MESSAGE));
    assert!(!state.is_loading);
    assert!(!state.session.is_authenticated);
    assert_eq!(state.current_screen, Screen::Auth);
    assert!(tokens.get().is_none());
}

#[tokio::test]
async fn test_quick_add_while_signed_out() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));
    store.set_selected_meal(MealType::Snacks);

    let entry = store.quick_add(MEDIUM_MEAL);

    let state = store.snapshot();
    assert_eq!(state.today_entries().len(), 1);
    let added = &state.today_entries()[0];
    assert_eq!(added.id, entry.id);
    assert_eq!(added.name, "Medium meal");
    assert_eq!(added.calories, 400.0);
    assert_eq!(added.meal, MealType::Snacks);
    assert_eq!(added.backend_meal_id(), None);
    assert_eq!(state.current_screen, Screen::Home);
    assert_eq!(state.week_history().last().unwrap().total_calories, 400.0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_remove_local_entry_is_local_only() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));

    let entry = store.add_food_entry(
        NewFoodEntry::new("Banana", 105.0, MealType::Breakfast).with_portion("1 medium"),
    );
    assert_eq!(store.snapshot().today_entries().len(), 1);

    assert!(store.remove_food_entry(&entry.id));
    assert!(!store.remove_food_entry(&entry.id));
    assert!(store.snapshot().today_entries().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_fetch_today_data_replaces_local_entries() {
    let server = MockServer::start().await;
    let store = signed_in_store(
        &server,
        json!([meal(10, "lunch", 2.0, 300.0), meal(11, "dinner", 1.0, 150.0)]),
        450.0,
    )
    .await;

    store.add_food_entry(NewFoodEntry::new("Samosa", 260.0, MealType::Snacks));
    store.fetch_today_data().await.unwrap();

    let state = store.snapshot();
    let ids: Vec<&str> = state.today_entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["meal-10", "meal-11"]);
    assert!(state.today_entries().iter().all(|e| !e.is_local()));
    assert_eq!(state.today_entries()[0].portion.as_deref(), Some("2 bowl"));
    assert_eq!(state.today_stats.as_ref().unwrap().total_calories, 450.0);
    assert_eq!(state.week_history().last().unwrap().total_calories, 450.0);

    // fetching again yields the same ids, so nothing is duplicated
    store.fetch_today_data().await.unwrap();
    assert_eq!(store.snapshot().today_entries().len(), 2);
}

#[tokio::test]
async fn test_add_meal_to_backend_uses_server_total() {
    let server = MockServer::start().await;
    let store = signed_in_store(&server, json!([meal(20, "breakfast", 1.5, 229.0)]), 229.0).await;

    Mock::given(method("POST"))
        .and(path("/meals"))
        .respond_with(ResponseTemplate::new(201).set_body_json(meal(20, "breakfast", 1.5, 229.0)))
        .expect(1)
        .mount(&server)
        .await;

    store.set_screen(Screen::AddFood);
    let entry = store.add_meal_to_backend(3, MealType::Breakfast, 1.5).await.unwrap();

    // 150 * 1.5 would be 225; the server's figure is kept
    assert_eq!(entry.calories, 229.0);
    assert_eq!(entry.id, "meal-20");
    assert_eq!(
        entry.source,
        EntrySource::Backend {
            meal_id: 20,
            food_id: 3,
            quantity: 1.5
        }
    );

    let state = store.snapshot();
    assert_eq!(state.current_screen, Screen::Home);
    assert!(state.today_entries().iter().any(|e| e.id == "meal-20"));
    assert!(state.today_meals.iter().any(|m| m.id == 20));
}

#[tokio::test]
async fn test_add_meal_requires_sign_in() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));

    let result = store.add_meal_to_backend(3, MealType::Lunch, 1.0).await;
    assert!(result.is_err());
    assert_eq!(store.snapshot().error.as_deref(), Some("Not logged in"));
    assert!(store.snapshot().today_entries().is_empty());
}

#[tokio::test]
async fn test_add_meal_failure_is_reported() {
    let server = MockServer::start().await;
    let store = signed_in_store(&server, json!([]), 0.0).await;

    Mock::given(method("POST"))
        .and(path("/meals"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Food not found"})))
        .mount(&server)
        .await;

    let result = store.add_meal_to_backend(999, MealType::Lunch, 1.0).await;
    assert!(result.is_err());
    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Food not found"));
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_remove_backend_entry_is_optimistic() {
    let server = MockServer::start().await;
    let store = signed_in_store(&server, json!([meal(30, "dinner", 1.0, 150.0)]), 150.0).await;
    store.fetch_today_data().await.unwrap();

    Mock::given(method("DELETE"))
        .and(path("/meals/30"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    assert!(store.remove_food_entry("meal-30"));
    // gone before the server has answered
    assert!(store.snapshot().today_entries().is_empty());

    let mut deleted = false;
    for _ in 0..100 {
        if requests_to(&server, "DELETE", "/meals/30").await == 1 {
            deleted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(deleted);
}

#[tokio::test]
async fn test_failed_backend_delete_keeps_optimistic_removal() {
    let server = MockServer::start().await;
    let store = signed_in_store(&server, json!([meal(40, "lunch", 1.0, 150.0)]), 150.0).await;
    store.fetch_today_data().await.unwrap();

    Mock::given(method("DELETE"))
        .and(path("/meals/40"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(store.remove_food_entry("meal-40"));
    assert!(wait_for(&store, |s| s.error.is_some()).await);
    assert!(store.snapshot().today_entries().is_empty());

    // the next reconciliation brings the undeleted meal back
    store.fetch_today_data().await.unwrap();
    assert_eq!(store.snapshot().today_entries().len(), 1);
}

#[tokio::test]
async fn test_logout_resets_state() {
    let server = MockServer::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token("valid"));
    mount_profile(&server).await;
    mount_today(&server, json!([meal(50, "lunch", 1.0, 150.0)]), 150.0).await;
    let store = store_with(&server, tokens.clone());

    store.check_auth().await;
    store.fetch_today_data().await.unwrap();
    store.fetch_foods().await.unwrap();
    store.add_food_entry(NewFoodEntry::new("Tea", 30.0, MealType::Snacks));
    assert!(!store.snapshot().backend_foods.is_empty());

    store.logout();

    let state = store.snapshot();
    assert!(state.today_entries().is_empty());
    assert!(state.backend_foods.is_empty());
    assert!(!state.session.is_authenticated);
    assert!(state.session.user_email.is_none());
    assert!(state.today_meals.is_empty());
    assert!(state.today_stats.is_none());
    assert!(state.profile.is_none());
    assert!(!state.is_onboarded);
    assert_eq!(state.current_screen, Screen::Auth);
    assert!(tokens.get().is_none());
}

#[tokio::test]
async fn test_search_is_debounced_and_fenced() {
    let server = MockServer::start().await;
    let store = signed_in_store(&server, json!([]), 0.0).await;
    // let the catalog priming from sign-in land first
    assert!(wait_for(&store, |s| s.backend_foods.len() == 1).await);

    Mock::given(method("GET"))
        .and(path("/foods"))
        .and(query_param("search", "ri"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([food(1, "Rice", 130.0), food(2, "Rice Kheer", 250.0)]))
                .set_delay(Duration::from_millis(300)),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/foods"))
        .and(query_param("search", "rice k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([food(2, "Rice Kheer", 250.0)])))
        .with_priority(1)
        .mount(&server)
        .await;

    // superseded during the quiet period: no request at all
    let (first, second) = tokio::join!(store.search_foods("r"), store.search_foods("ri"));
    assert!(!first.unwrap());
    assert!(second.unwrap());
    assert_eq!(store.snapshot().backend_foods.len(), 2);

    // a slow response that lands after a newer search is dropped
    let slow = store.search_foods("ri");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.search_foods("rice k").await
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert!(!slow.unwrap());
    assert!(fast.unwrap());

    let names: Vec<String> = store.snapshot().backend_foods.iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, vec!["Rice Kheer".to_string()]);
}

#[tokio::test]
async fn test_setup_wizard_flow() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));

    store.set_screen(Screen::Onboarding);
    store.complete_onboarding();
    let state = store.snapshot();
    assert!(state.is_onboarded);
    assert_eq!(state.current_screen, Screen::Setup);
    assert_eq!(state.setup_step, 1);

    let draft = ProfileDraft::default();
    assert!(!store.next_setup_step(&draft).unwrap());
    store.previous_setup_step();
    store.previous_setup_step();
    assert_eq!(store.snapshot().setup_step, 1);

    assert!(!store.next_setup_step(&draft).unwrap());
    assert!(!store.next_setup_step(&draft).unwrap());
    assert_eq!(store.snapshot().setup_step, 3);
    assert!(store.next_setup_step(&draft).unwrap());

    let state = store.snapshot();
    assert_eq!(state.current_screen, Screen::Home);
    assert_eq!(state.profile.unwrap().daily_calorie_target, 2546);
    assert_eq!(state.daily_target(), 2546);
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let server = MockServer::start().await;
    let store = store_with(&server, Arc::new(MemoryTokenStore::new()));
    let mut rx = store.subscribe();

    store.set_screen(Screen::History);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().current_screen, Screen::History);
}
