use anyhow::Context;
use calorie_tracker_client::auth::DEFAULT_DAILY_CALORIE_GOAL;
use calorie_tracker_client::config::ClientOptions;
use calorie_tracker_client::meals::MealType;
use calorie_tracker_client::store::{
    calorie_target, day_status, find_preset, most_logged_meal, week_summary, ActivityLevel,
    AppStore, DayStatus, Goal, ProfileDraft, QUICK_ADD_PRESETS,
};
use calorie_tracker_client::ApiClient;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(about = "Talk to a Calorie Tracker API from the command line", long_about = None)]
struct Cli {
    /// Base URL of the API
    #[arg(long, env = "CALORIE_TRACKER_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the server is up
    Health,
    /// Sign in and remember the session
    Login { email: String, password: String },
    /// Create an account and remember the session
    Register {
        email: String,
        password: String,
        confirm_password: String,
        #[arg(long, default_value_t = DEFAULT_DAILY_CALORIE_GOAL)]
        goal: u32,
    },
    /// Forget the stored session
    Logout,
    /// Show today's ledger
    Today,
    /// List or search the food catalog
    Foods {
        #[arg(long)]
        search: Option<String>,
    },
    /// Log a catalog food
    Log {
        food_id: i64,
        #[arg(long, default_value = "breakfast")]
        meal: MealType,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
    },
    /// Add a quick estimate to today's ledger for this run
    QuickAdd {
        /// Preset label, e.g. "Medium meal"
        preset: String,
        #[arg(long, default_value = "snacks")]
        meal: MealType,
    },
    /// Delete a logged meal
    Remove { meal_id: i64 },
    /// Compute a daily calorie target
    Target {
        #[arg(long)]
        age: u32,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value = "maintain")]
        goal: Goal,
        #[arg(long, default_value = "moderate")]
        activity: ActivityLevel,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "calorie_tracker_client=debug,info".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn build_store(api_url: Option<String>) -> anyhow::Result<AppStore> {
    let mut options = ClientOptions::from_env()?;
    if let Some(url) = api_url {
        options = options.with_base_url(&url);
    }
    if options.token_path.is_none() {
        options.token_path = ClientOptions::default_token_path();
    }
    let api = ApiClient::new(options).context("failed to build API client")?;
    Ok(AppStore::new(api))
}

async fn require_session(store: &AppStore) -> anyhow::Result<()> {
    store.check_auth().await;
    if !store.with_state(|s| s.session.is_authenticated) {
        anyhow::bail!("not signed in; run `tracker login` first");
    }
    Ok(())
}

fn print_today(store: &AppStore) {
    let state = store.snapshot();
    let summary = state.daily_summary();

    for total in &summary.per_meal {
        println!("{} ({:.0} kcal)", total.meal.label(), total.calories);
        for entry in state.entries_for(total.meal) {
            let meal_id = entry
                .backend_meal_id()
                .map(|id| format!("#{}", id))
                .unwrap_or_else(|| "local".to_string());
            println!(
                "  {:<8} {:<24} {:>7.0} kcal  {}",
                meal_id,
                entry.name,
                entry.calories,
                entry.portion.as_deref().unwrap_or("")
            );
        }
    }

    println!(
        "\nConsumed {:.0} of {} kcal, {:.0} remaining",
        summary.consumed, summary.target, summary.remaining
    );
    match day_status(summary.consumed, summary.target) {
        DayStatus::NoData => println!("Nothing logged yet"),
        DayStatus::Under(diff) => println!("{:.0} under", diff),
        DayStatus::Over(diff) => println!("{:.0} over", diff),
        DayStatus::OnTarget => println!("On target"),
    }
    if let Some(meal) = most_logged_meal(state.today_entries()) {
        println!("Most logged meal: {}", meal.label());
    }
    let week = week_summary(state.week_history(), summary.target);
    println!("Weekly average: {} kcal", week.average_calories);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let store = build_store(cli.api_url)?;
    tracing::debug!(url = %store.api().url, "using API");

    match cli.command {
        Command::Health => {
            if store.api().check_health().await {
                println!("Server is up");
            } else {
                println!("Server unreachable; it may be starting up, retry in 30s");
            }
        }
        Command::Login { email, password } => {
            store.login(&email, &password).await?;
            println!("Signed in as {}", email);
        }
        Command::Register {
            email,
            password,
            confirm_password,
            goal,
        } => {
            store
                .register(&email, &password, &confirm_password, goal)
                .await?;
            println!("Registered {} with a goal of {} kcal", email, goal);
        }
        Command::Logout => {
            store.logout();
            println!("Signed out");
        }
        Command::Today => {
            require_session(&store).await?;
            store.fetch_today_data().await?;
            print_today(&store);
        }
        Command::Foods { search } => {
            require_session(&store).await?;
            let foods = match search {
                Some(query) => store.api().foods().search(&query).await?,
                None => store.api().foods().list().await?,
            };
            for food in foods {
                println!(
                    "{:>4}  {:<28} {:>6.0} kcal / {}",
                    food.id, food.name, food.calories_per_unit, food.unit_description
                );
            }
        }
        Command::Log {
            food_id,
            meal,
            quantity,
        } => {
            require_session(&store).await?;
            let entry = store.add_meal_to_backend(food_id, meal, quantity).await?;
            println!("Logged {} ({:.0} kcal) for {}", entry.name, entry.calories, meal);
            store.fetch_today_data().await?;
            print_today(&store);
        }
        Command::QuickAdd { preset, meal } => {
            let Some(preset) = find_preset(&preset) else {
                let labels: Vec<&str> = QUICK_ADD_PRESETS.iter().map(|p| p.label).collect();
                anyhow::bail!("unknown preset; choose one of: {}", labels.join(", "));
            };
            require_session(&store).await?;
            store.fetch_today_data().await?;
            store.set_selected_meal(meal);
            let entry = store.quick_add(preset);
            println!("Added {} ({:.0} kcal) to {}", entry.name, entry.calories, meal);
            print_today(&store);
        }
        Command::Remove { meal_id } => {
            require_session(&store).await?;
            store.remove_meal_from_backend(meal_id).await?;
            println!("Removed meal #{}", meal_id);
        }
        Command::Target {
            age,
            height,
            weight,
            goal,
            activity,
        } => {
            let draft = ProfileDraft {
                age: Some(age),
                height_cm: Some(height),
                weight_kg: Some(weight),
                goal: Some(goal),
                activity_level: Some(activity),
            };
            println!("Daily target: {} kcal", calorie_target(&draft));
        }
    }

    Ok(())
}
