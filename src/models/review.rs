use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Review left by a guest on a listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields accepted when posting or editing a review
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub listing_id: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

/// Fields accepted when editing a review; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewChanges {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl Review {
    /// Ratings are bounded to [1, 5]
    pub fn validate_rating(rating: i16) -> Result<(), String> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            ));
        }
        Ok(())
    }
}
