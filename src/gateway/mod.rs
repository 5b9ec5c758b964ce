//! Payment gateway port and the Chapa implementation.
//!
//! The payment service talks to the gateway only through [`PaymentGateway`],
//! which keeps the state machine testable without network access.

mod chapa_client;

pub use chapa_client::ChapaClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while talking to the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Network failure, timeout, TLS, ...
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// Gateway answered but the body is not what we expected
    #[error("Gateway returned an invalid response: {0}")]
    InvalidResponse(String),

    /// Gateway answered with a non-success envelope
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Checkout session request sent to `transaction/initialize`
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub tx_ref: Uuid,
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub description: String,
    pub meta: Value,
}

/// Outcome of a successful initialization
#[derive(Debug, Clone)]
pub struct Checkout {
    pub checkout_url: String,
    /// Full gateway response, persisted on the payment row
    pub payload: Value,
}

/// Outcome of a successful verification call
#[derive(Debug, Clone)]
pub struct Verification {
    /// Raw transaction status as reported by the gateway (`success`, `failed`, `pending`, ...)
    pub status: String,
    pub reference: Option<String>,
    pub tx_ref: Option<String>,
    pub payload: Value,
}

/// Generic response envelope used by every gateway endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub message: Option<Value>,
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Human-readable message; the gateway sometimes sends an object here
    pub fn message_text(&self) -> String {
        match &self.message {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "no message".to_string(),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session
    async fn initialize(&self, request: &InitializeRequest) -> GatewayResult<Checkout>;

    /// Ask the gateway for the current status of `tx_ref`
    async fn verify(&self, tx_ref: &str) -> GatewayResult<Verification>;
}

/// Interpret a raw initialize response body
pub fn parse_checkout(http_ok: bool, payload: Value) -> GatewayResult<Checkout> {
    let envelope: Envelope = serde_json::from_value(payload.clone())
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    if !http_ok || !envelope.is_success() {
        return Err(GatewayError::Rejected(envelope.message_text()));
    }

    let checkout_url = envelope
        .data
        .as_ref()
        .and_then(|d| d.get("checkout_url"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| GatewayError::InvalidResponse("missing data.checkout_url".to_string()))?
        .to_string();

    Ok(Checkout { checkout_url, payload })
}

/// Interpret a raw verify response body
pub fn parse_verification(http_ok: bool, payload: Value) -> GatewayResult<Verification> {
    let envelope: Envelope = serde_json::from_value(payload.clone())
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    if !http_ok || !envelope.is_success() {
        return Err(GatewayError::Rejected(envelope.message_text()));
    }

    let data = envelope
        .data
        .ok_or_else(|| GatewayError::InvalidResponse("missing data".to_string()))?;

    let field = |key: &str| data.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let status = field("status")
        .ok_or_else(|| GatewayError::InvalidResponse("missing data.status".to_string()))?;

    Ok(Verification {
        status,
        reference: field("reference"),
        tx_ref: field("tx_ref").or_else(|| field("trx_ref")),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_checkout_success() {
        let body = json!({
            "message": "Hosted Link",
            "status": "success",
            "data": { "checkout_url": "https://checkout.chapa.co/checkout/payment/abc" }
        });
        let checkout = parse_checkout(true, body).unwrap();
        assert_eq!(checkout.checkout_url, "https://checkout.chapa.co/checkout/payment/abc");
    }

    #[test]
    fn test_parse_checkout_rejected() {
        let body = json!({
            "message": { "currency": ["The currency field is required."] },
            "status": "failed",
            "data": null
        });
        match parse_checkout(false, body) {
            Err(GatewayError::Rejected(msg)) => assert!(msg.contains("currency")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_checkout_missing_url() {
        let body = json!({ "status": "success", "data": {} });
        assert!(matches!(
            parse_checkout(true, body),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_verification() {
        let body = json!({
            "message": "Payment details",
            "status": "success",
            "data": {
                "status": "success",
                "reference": "AP634JFwmzfA",
                "tx_ref": "4f0b7f3e-3a38-4f4e-8b71-2d0e7a1c9c11"
            }
        });
        let verification = parse_verification(true, body).unwrap();
        assert_eq!(verification.status, "success");
        assert_eq!(verification.reference.as_deref(), Some("AP634JFwmzfA"));
        assert!(verification.tx_ref.is_some());
    }

    #[test]
    fn test_parse_verification_not_found() {
        let body = json!({ "message": "Invalid transaction or Transaction not found", "status": "failed", "data": null });
        assert!(matches!(
            parse_verification(false, body),
            Err(GatewayError::Rejected(_))
        ));
    }

    #[test]
    fn test_initialize_request_serializes_amount_as_string() {
        let request = InitializeRequest {
            amount: Decimal::new(150000, 2),
            currency: "ETB".to_string(),
            email: "guest@example.com".to_string(),
            first_name: "Guest".to_string(),
            last_name: String::new(),
            phone_number: None,
            tx_ref: Uuid::nil(),
            return_url: "https://example.com/done".to_string(),
            callback_url: None,
            description: "Payment for booking".to_string(),
            meta: json!({}),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["amount"], "1500.00");
        assert!(value.get("callback_url").is_none());
        assert!(value.get("phone_number").is_none());
    }
}
