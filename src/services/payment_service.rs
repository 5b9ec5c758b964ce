use super::notifier::{Notification, Notifier};
use crate::auth::{self, ActingUser};
use crate::error::{AppError, AppResult};
use crate::gateway::{GatewayError, InitializeRequest, PaymentGateway};
use crate::models::{BookingDetails, BookingStatus, Payment, PaymentStatus, Settlement};
use crate::repositories::PaymentLedger;
use actix_web::http::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Body of `POST /payments/initiate`
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePayment {
    pub booking_id: Uuid,
    pub return_url: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// A checkout session ready for the guest
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPayment {
    pub payment_reference: Uuid,
    pub checkout_url: String,
    pub payment: Payment,
}

/// State of a payment after a verify call or webhook
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    /// True when this call moved the payment out of `pending`
    pub transitioned: bool,
    pub payment: Payment,
}

/// Drives the payment lifecycle: initiation, verification and webhooks
pub struct PaymentService {
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier,
    currency: String,
    webhook_hash: String,
}

fn validate_url(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{} must be an http(s) URL", field)))
    }
}

impl PaymentService {
    pub fn new(
        ledger: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Notifier,
        currency: String,
        webhook_hash: String,
    ) -> Self {
        Self {
            ledger,
            gateway,
            notifier,
            currency,
            webhook_hash,
        }
    }

    async fn load_details(&self, booking_id: Uuid) -> AppResult<BookingDetails> {
        self.ledger
            .booking_details(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
    }

    /// Start a gateway checkout for a pending booking
    pub async fn initiate(
        &self,
        actor: &ActingUser,
        request: &InitiatePayment,
    ) -> AppResult<InitiatedPayment> {
        validate_url("return_url", &request.return_url)?;
        if let Some(callback_url) = &request.callback_url {
            validate_url("callback_url", callback_url)?;
        }

        let details = self.load_details(request.booking_id).await?;
        actor.ensure_can_manage(details.booking.user_id, "booking")?;

        let active = self.ledger.find_active_for_booking(details.booking.id).await?;
        if let Some(existing) = &active {
            if existing.status_enum() == PaymentStatus::Completed {
                return Err(AppError::Conflict(format!(
                    "Booking {} is already paid",
                    details.booking.id
                )));
            }
        }

        if !details.booking.is_pending() {
            return Err(AppError::Validation(
                "Booking is not in a valid state for payment".to_string(),
            ));
        }

        // Reuse a pending payment so the gateway sees the same tx_ref again
        let payment = match active {
            Some(existing) => {
                info!(
                    "Reusing pending payment {} for booking {}",
                    existing.payment_reference, details.booking.id
                );
                existing
            }
            None => {
                let fresh = Payment::new(details.booking.id, details.booking.total_price, &self.currency);
                self.ledger.insert(&fresh).await?
            }
        };

        let gateway_request = InitializeRequest {
            amount: payment.amount,
            currency: payment.currency.clone(),
            email: details.guest.email.clone(),
            first_name: details.guest.display_name().to_string(),
            last_name: details.guest.last_name.clone(),
            phone_number: details.guest.phone_number.clone(),
            tx_ref: payment.payment_reference,
            return_url: request.return_url.trim().to_string(),
            callback_url: request.callback_url.as_ref().map(|u| u.trim().to_string()),
            description: format!(
                "Payment for booking {} - {}",
                details.booking.id, details.listing.title
            ),
            meta: json!({
                "booking_id": details.booking.id,
                "listing_title": details.listing.title,
            }),
        };

        match self.gateway.initialize(&gateway_request).await {
            Ok(checkout) => {
                let payment = self
                    .ledger
                    .record_checkout(payment.id, &checkout.checkout_url, &checkout.payload)
                    .await?;

                info!(
                    "Payment {} initiated for booking {}",
                    payment.payment_reference, details.booking.id
                );

                Ok(InitiatedPayment {
                    payment_reference: payment.payment_reference,
                    checkout_url: checkout.checkout_url,
                    payment,
                })
            }
            Err(GatewayError::Rejected(message)) => {
                warn!(
                    "Gateway rejected payment {} for booking {}: {}",
                    payment.payment_reference, details.booking.id, message
                );

                let settlement = Settlement {
                    status: PaymentStatus::Failed,
                    transaction_id: None,
                    gateway_reference: None,
                    payload: json!({ "status": "failed", "message": message }),
                };

                if let Some(failed) = self.ledger.settle(payment.id, &settlement).await? {
                    self.notifier.enqueue(Notification::PaymentFailed {
                        details,
                        payment: failed,
                    });
                }

                Err(GatewayError::Rejected(message).into())
            }
            // Transport trouble: leave the payment pending so a retry reuses it
            Err(e) => Err(e.into()),
        }
    }

    /// Ask the gateway for the payment status and apply it
    pub async fn verify(&self, tx_ref: &str) -> AppResult<VerificationOutcome> {
        let reference = Uuid::parse_str(tx_ref.trim())
            .map_err(|_| AppError::Validation(format!("Invalid tx_ref: {}", tx_ref)))?;

        let payment = self
            .ledger
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", reference)))?;

        let current = payment.status_enum();
        if current.is_terminal() {
            let details = self.load_details(payment.booking_id).await?;
            return Ok(Self::outcome(payment, &details, false));
        }

        let verification = self.gateway.verify(&reference.to_string()).await?;
        let target = current
            .transition(PaymentStatus::from_gateway(&verification.status))
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        if !target.is_terminal() {
            self.ledger.refresh_payload(payment.id, &verification.payload).await?;
            info!("Payment {} still pending at gateway", reference);
            let details = self.load_details(payment.booking_id).await?;
            return Ok(Self::outcome(payment, &details, false));
        }

        let settlement = Settlement {
            status: target,
            transaction_id: verification.reference.clone(),
            gateway_reference: verification.tx_ref.clone(),
            payload: verification.payload.clone(),
        };

        match self.ledger.settle(payment.id, &settlement).await? {
            Some(settled) => {
                let details = self.load_details(settled.booking_id).await?;
                info!("Payment {} moved to {}", reference, target.as_str());

                let notification = match target {
                    PaymentStatus::Completed => Notification::PaymentConfirmed {
                        details: details.clone(),
                        payment: settled.clone(),
                    },
                    _ => Notification::PaymentFailed {
                        details: details.clone(),
                        payment: settled.clone(),
                    },
                };
                self.notifier.enqueue(notification);

                Ok(Self::outcome(settled, &details, true))
            }
            None => {
                // Another verify or webhook settled it first
                let latest = self
                    .ledger
                    .find_by_id(payment.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", reference)))?;
                let details = self.load_details(latest.booking_id).await?;
                Ok(Self::outcome(latest, &details, false))
            }
        }
    }

    /// Authenticate a gateway callback and verify the payment it names
    pub async fn handle_webhook(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<VerificationOutcome> {
        auth::verify_webhook_headers(&self.webhook_hash, headers, body).map_err(|e| {
            warn!("Rejected webhook delivery: {}", e);
            e
        })?;

        let payload: serde_json::Value = serde_json::from_slice(body)?;
        let tx_ref = payload
            .get("tx_ref")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Validation("Missing tx_ref in webhook data".to_string()))?;

        info!("Webhook received for tx_ref={}", tx_ref);
        self.verify(tx_ref).await
    }

    /// Payments visible to the caller
    pub async fn list_for(&self, actor: &ActingUser) -> AppResult<Vec<Payment>> {
        let scope = if actor.is_staff { None } else { Some(actor.id) };
        Ok(self.ledger.list(scope).await?)
    }

    /// One payment, if the caller may see it
    pub async fn get_for(&self, actor: &ActingUser, id: Uuid) -> AppResult<Payment> {
        let payment = self
            .ledger
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))?;

        if !actor.is_staff {
            let details = self.load_details(payment.booking_id).await?;
            if details.booking.user_id != actor.id {
                // Do not leak existence
                return Err(AppError::NotFound(format!("Payment {} not found", id)));
            }
        }

        Ok(payment)
    }

    fn outcome(payment: Payment, details: &BookingDetails, transitioned: bool) -> VerificationOutcome {
        VerificationOutcome {
            payment_status: payment.status_enum(),
            booking_status: details.booking.status_enum(),
            transitioned,
            payment,
        }
    }
}
