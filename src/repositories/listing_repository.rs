use crate::error::RepositoryError;
use crate::models::{Listing, ListingInput};
use sqlx::PgPool;
use uuid::Uuid;

const LISTING_COLUMNS: &str = "id, title, description, location, price_per_night, max_guests, \
     is_available, image_url, host_id, created_at, updated_at";

/// Repository for listing data access
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Create a new ListingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new listing owned by `host_id`
    pub async fn create(&self, host_id: Uuid, input: &ListingInput) -> Result<Listing, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO listings
                (title, description, location, price_per_night, max_guests, is_available, image_url, host_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LISTING_COLUMNS}
            "#
        );

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.price_per_night)
            .bind(input.max_guests)
            .bind(input.is_available)
            .bind(&input.image_url)
            .bind(host_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(listing)
    }

    /// Find a listing by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepositoryError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    /// List listings, newest first, optionally filtered by availability
    pub async fn list(&self, available: Option<bool>) -> Result<Vec<Listing>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE ($1::BOOLEAN IS NULL OR is_available = $1)
            ORDER BY created_at DESC
            "#
        );

        let listings = sqlx::query_as::<_, Listing>(&sql)
            .bind(available)
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    /// Replace the writable fields of a listing
    pub async fn update(&self, id: Uuid, input: &ListingInput) -> Result<Listing, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE listings
            SET title = $2,
                description = $3,
                location = $4,
                price_per_night = $5,
                max_guests = $6,
                is_available = $7,
                image_url = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.price_per_night)
            .bind(input.max_guests)
            .bind(input.is_available)
            .bind(&input.image_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Listing {} not found", id)))
    }

    /// Delete a listing; bookings and reviews cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
