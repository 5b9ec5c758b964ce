use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Listing model representing a rentable property
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: Decimal, // NUMERIC(10, 2) in database
    pub max_guests: i32,
    pub is_available: bool,
    pub image_url: String,
    pub host_id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Writable listing fields, as accepted on create and update
#[derive(Debug, Clone, Deserialize)]
pub struct ListingInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub price_per_night: Decimal,
    #[serde(default = "default_max_guests")]
    pub max_guests: i32,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub image_url: String,
}

fn default_max_guests() -> i32 {
    1
}

fn default_available() -> bool {
    true
}

impl ListingInput {
    pub fn validate(&self) -> Result<(), String> {
        Listing::validate_fields(&self.title, &self.location, self.price_per_night, self.max_guests)
    }
}

impl Listing {
    /// Validate listing fields before they hit the database
    pub fn validate_fields(
        title: &str,
        location: &str,
        price_per_night: Decimal,
        max_guests: i32,
    ) -> Result<(), String> {
        if title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if location.trim().is_empty() {
            return Err("Location is required".to_string());
        }
        if price_per_night < Decimal::ZERO {
            return Err("Price per night must not be negative".to_string());
        }
        if max_guests < 1 {
            return Err("Max guests must be at least 1".to_string());
        }
        Ok(())
    }

    /// Total price for a stay of `nights` nights, `None` on overflow
    pub fn price_for(&self, nights: i64) -> Option<Decimal> {
        self.price_per_night.checked_mul(Decimal::from(nights))
    }
}
