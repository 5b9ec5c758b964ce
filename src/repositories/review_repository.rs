use crate::error::RepositoryError;
use crate::models::{Review, ReviewInput};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, listing_id, user_id, rating, comment, created_at, updated_at";

/// Repository for review data access
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Create a new ReviewRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review. A second review of the same listing by the same user is a duplicate.
    pub async fn create(&self, user_id: Uuid, input: &ReviewInput) -> Result<Review, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO reviews (listing_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(input.listing_id)
            .bind(user_id)
            .bind(input.rating)
            .bind(&input.comment)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    /// Find a review by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    /// List reviews, newest first, optionally for a single listing
    pub async fn list(&self, listing_id: Option<Uuid>) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE ($1::UUID IS NULL OR listing_id = $1)
            ORDER BY created_at DESC
            "#
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(listing_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    /// Change rating and comment of an existing review
    pub async fn update(&self, id: Uuid, rating: i16, comment: &str) -> Result<Review, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE reviews
            SET rating = $2, comment = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(rating)
            .bind(comment)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Review {} not found", id)))
    }

    /// Delete a review
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Average rating and count for a listing
    pub async fn rating_summary(&self, listing_id: Uuid) -> Result<(Option<f64>, i64), RepositoryError> {
        let row: (Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT AVG(rating)::FLOAT8, COUNT(*)
            FROM reviews
            WHERE listing_id = $1
            "#,
        )
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
