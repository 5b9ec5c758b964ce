use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Payment status.
///
/// `Pending` is the only non-terminal state. A payment leaves it exactly once,
/// to either `Completed` or `Failed`, and never moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Rejected state change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Payment is already {from:?}, cannot move to {to:?}")]
pub struct TransitionError {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
}

impl PaymentStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Apply a transition.
    ///
    /// `Pending -> Pending` is accepted as a no-op (the gateway has not settled yet).
    /// Terminal states only accept themselves.
    pub fn transition(self, to: PaymentStatus) -> Result<PaymentStatus, TransitionError> {
        match (self, to) {
            (PaymentStatus::Pending, next) => Ok(next),
            (current, next) if current == next => Ok(current),
            (from, to) => Err(TransitionError { from, to }),
        }
    }

    /// Map the status string reported by the gateway's verify endpoint
    pub fn from_gateway(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "success" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Payment model tracking settlement of a booking through the Chapa gateway
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub transaction_id: Option<String>,    // Gateway transaction reference, set on success
    pub gateway_reference: Option<String>, // tx_ref echoed back by the gateway
    pub payment_reference: Uuid,           // Sent to the gateway as tx_ref
    pub amount: Decimal,
    pub currency: String,
    pub status: String, // Stored as TEXT, use PaymentStatus enum for type safety
    pub checkout_url: Option<String>,
    #[serde(skip_serializing)]
    pub gateway_payload: Option<Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Payment {
    /// Build a fresh pending payment for a booking
    pub fn new(booking_id: Uuid, amount: Decimal, currency: &str) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            transaction_id: None,
            gateway_reference: None,
            payment_reference: Uuid::new_v4(),
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::Pending.as_str().to_string(),
            checkout_url: None,
            gateway_payload: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.status).unwrap_or(PaymentStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == PaymentStatus::Pending
    }
}

/// Outcome of a gateway status check, applied to a pending payment
#[derive(Debug, Clone)]
pub struct Settlement {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_reference: Option<String>,
    pub payload: Value,
}
