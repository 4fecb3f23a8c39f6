//! Meal ledger access

mod types;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::fetch::Fetch;

pub use types::*;

/// Client for the `/meals` endpoints
#[derive(Clone)]
pub struct MealsClient {
    url: String,
    client: Client,
    tokens: Arc<dyn TokenStore>,
}

impl MealsClient {
    pub(crate) fn new(url: &str, client: Client, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            url: url.to_string(),
            client,
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/meals{}", self.url, path)
    }

    /// Log a meal of `quantity` units of a catalog food
    pub async fn log(&self, food_id: i64, meal_type: MealType, quantity: f64) -> Result<Meal, Error> {
        let token = self.tokens.get();
        let body = LogMealRequest {
            food_id,
            meal_type,
            quantity,
        };

        Fetch::post(&self.client, &self.endpoint(""))
            .bearer_auth(token.as_deref())
            .json(&body)?
            .execute::<Meal>()
            .await
    }

    /// Meals logged today
    pub async fn today(&self) -> Result<Vec<Meal>, Error> {
        let token = self.tokens.get();
        Fetch::get(&self.client, &self.endpoint("/today"))
            .bearer_auth(token.as_deref())
            .execute::<Vec<Meal>>()
            .await
    }

    /// Today's aggregate nutrition
    pub async fn today_stats(&self) -> Result<DayStats, Error> {
        let token = self.tokens.get();
        Fetch::get(&self.client, &self.endpoint("/stats/today"))
            .bearer_auth(token.as_deref())
            .execute::<DayStats>()
            .await
    }

    /// Delete a logged meal
    pub async fn delete(&self, meal_id: i64) -> Result<(), Error> {
        let token = self.tokens.get();
        Fetch::delete(&self.client, &self.endpoint(&format!("/{}", meal_id)))
            .bearer_auth(token.as_deref())
            .execute_empty()
            .await
    }
}
