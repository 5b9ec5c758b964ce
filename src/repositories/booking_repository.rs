use crate::error::RepositoryError;
use crate::models::{Booking, BookingDetails, BookingStatus, Listing, User};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, listing_id, user_id, check_in, check_out, guests, total_price, \
     status, created_at, updated_at";

/// Repository for booking data access
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new BookingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending booking
    pub async fn create(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        total_price: Decimal,
    ) -> Result<Booking, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO bookings (listing_id, user_id, check_in, check_out, guests, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOKING_COLUMNS}
            "#
        );

        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(listing_id)
            .bind(user_id)
            .bind(check_in)
            .bind(check_out)
            .bind(guests)
            .bind(total_price)
            .bind(BookingStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Find a booking by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");

        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// List bookings, newest first. `None` lists every booking (staff view).
    pub async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Booking>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE ($1::UUID IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#
        );

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    /// Overwrite dates, guests, price and status of a booking
    pub async fn update(
        &self,
        id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        total_price: Decimal,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE bookings
            SET check_in = $2,
                check_out = $3,
                guests = $4,
                total_price = $5,
                status = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .bind(check_in)
            .bind(check_out)
            .bind(guests)
            .bind(total_price)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Booking {} not found", id)))
    }

    /// Delete a booking; its payments cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Load a booking with its listing and guest
    pub async fn find_details(&self, id: Uuid) -> Result<Option<BookingDetails>, RepositoryError> {
        let Some(booking) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, description, location, price_per_night, max_guests,
                   is_available, image_url, host_id, created_at, updated_at
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(booking.listing_id)
        .fetch_one(&self.pool)
        .await?;

        let guest = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, phone_number, is_staff, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(booking.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(BookingDetails {
            booking,
            listing,
            guest,
        }))
    }
}
