use super::BookingRepository;
use crate::error::RepositoryError;
use crate::models::{BookingDetails, BookingStatus, Payment, PaymentStatus, Settlement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, booking_id, transaction_id, gateway_reference, payment_reference, \
     amount, currency, status, checkout_url, gateway_payload, created_at, updated_at";

/// Persistence port used by the payment service
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Booking with listing and guest, or `None` if it does not exist
    async fn booking_details(&self, booking_id: Uuid) -> Result<Option<BookingDetails>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, RepositoryError>;

    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Payment>, RepositoryError>;

    /// The booking's payment that has not failed, if any
    async fn find_active_for_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, RepositoryError>;

    /// Persist a new pending payment
    async fn insert(&self, payment: &Payment) -> Result<Payment, RepositoryError>;

    /// Store the hosted checkout URL returned by the gateway
    async fn record_checkout(
        &self,
        payment_id: Uuid,
        checkout_url: &str,
        payload: &Value,
    ) -> Result<Payment, RepositoryError>;

    /// Overwrite the raw gateway payload of a payment that stays pending
    async fn refresh_payload(&self, payment_id: Uuid, payload: &Value) -> Result<(), RepositoryError>;

    /// Move a pending payment to a terminal status.
    ///
    /// Returns `None` when the payment was not pending any more, in which case
    /// nothing is written. A completed payment also confirms its booking.
    async fn settle(
        &self,
        payment_id: Uuid,
        settlement: &Settlement,
    ) -> Result<Option<Payment>, RepositoryError>;

    /// Payments, newest first. `None` lists every payment (staff view).
    async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Payment>, RepositoryError>;
}

/// PostgreSQL implementation of [`PaymentLedger`]
pub struct PaymentRepository {
    pool: PgPool,
    bookings: BookingRepository,
}

impl PaymentRepository {
    /// Create a new PaymentRepository
    pub fn new(pool: PgPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            pool,
        }
    }

    async fn fetch_one_by(&self, column: &str, value: Uuid) -> Result<Option<Payment>, RepositoryError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE {column} = $1");

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }
}

#[async_trait]
impl PaymentLedger for PaymentRepository {
    async fn booking_details(&self, booking_id: Uuid) -> Result<Option<BookingDetails>, RepositoryError> {
        self.bookings.find_details(booking_id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        self.fetch_one_by("id", id).await
    }

    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Payment>, RepositoryError> {
        self.fetch_one_by("payment_reference", reference).await
    }

    async fn find_active_for_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE booking_id = $1 AND status <> $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        );

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(booking_id)
            .bind(PaymentStatus::Failed.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn insert(&self, payment: &Payment) -> Result<Payment, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO payments (id, booking_id, payment_reference, amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(payment.id)
            .bind(payment.booking_id)
            .bind(payment.payment_reference)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(PaymentStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn record_checkout(
        &self,
        payment_id: Uuid,
        checkout_url: &str,
        payload: &Value,
    ) -> Result<Payment, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE payments
            SET checkout_url = $2, gateway_payload = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .bind(checkout_url)
            .bind(payload)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Payment {} not found", payment_id)))
    }

    async fn refresh_payload(&self, payment_id: Uuid, payload: &Value) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE payments
            SET gateway_payload = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(payment_id)
        .bind(payload)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn settle(
        &self,
        payment_id: Uuid,
        settlement: &Settlement,
    ) -> Result<Option<Payment>, RepositoryError> {
        if !settlement.status.is_terminal() {
            return Err(RepositoryError::InvalidInput(
                "Settlement must carry a terminal status".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Conditional on the row still being pending: concurrent verify and
        // webhook deliveries race here and only one of them wins.
        let sql = format!(
            r#"
            UPDATE payments
            SET status = $2,
                transaction_id = COALESCE($3, transaction_id),
                gateway_reference = COALESCE($4, gateway_reference),
                gateway_payload = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = $6
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .bind(settlement.status.as_str())
            .bind(settlement.transaction_id.as_deref())
            .bind(settlement.gateway_reference.as_deref())
            .bind(&settlement.payload)
            .bind(PaymentStatus::Pending.as_str())
            .fetch_optional(&mut tx)
            .await?;

        if let Some(payment) = &updated {
            if settlement.status == PaymentStatus::Completed {
                sqlx::query(
                    r#"
                    UPDATE bookings
                    SET status = $2, updated_at = NOW()
                    WHERE id = $1 AND status = $3
                    "#,
                )
                .bind(payment.booking_id)
                .bind(BookingStatus::Confirmed.as_str())
                .bind(BookingStatus::Pending.as_str())
                .execute(&mut tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Payment>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {columns}
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            WHERE ($1::UUID IS NULL OR b.user_id = $1)
            ORDER BY p.created_at DESC
            "#,
            columns = PAYMENT_COLUMNS
                .split(", ")
                .map(|c| format!("p.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }
}
