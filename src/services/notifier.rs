use super::mailer::{EmailMessage, Mailer};
use crate::models::{BookingDetails, Payment};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Email-worthy things that happened to a booking
#[derive(Debug, Clone)]
pub enum Notification {
    BookingCreated {
        details: BookingDetails,
    },
    PaymentConfirmed {
        details: BookingDetails,
        payment: Payment,
    },
    PaymentFailed {
        details: BookingDetails,
        payment: Payment,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::BookingCreated { .. } => "booking_created",
            Notification::PaymentConfirmed { .. } => "payment_confirmed",
            Notification::PaymentFailed { .. } => "payment_failed",
        }
    }

    pub fn details(&self) -> &BookingDetails {
        match self {
            Notification::BookingCreated { details }
            | Notification::PaymentConfirmed { details, .. }
            | Notification::PaymentFailed { details, .. } => details,
        }
    }

    /// Render the plain-text email for this notification
    pub fn render(&self, from: &str) -> EmailMessage {
        let details = self.details();
        let booking = &details.booking;
        let listing = &details.listing;

        let summary = format!(
            "Property: {}\nLocation: {}\nCheck-in: {}\nCheck-out: {}\nGuests: {}",
            listing.title, listing.location, booking.check_in, booking.check_out, booking.guests
        );

        let (subject, body) = match self {
            Notification::BookingCreated { .. } => (
                format!("Booking Received - {}", listing.title),
                format!(
                    "Your booking has been received and is awaiting payment.\n\n{}\nTotal: {}\nBooking ID: {}",
                    summary, booking.total_price, booking.id
                ),
            ),
            Notification::PaymentConfirmed { payment, .. } => (
                format!("Booking Confirmation - {}", listing.title),
                format!(
                    "Your payment has been successfully processed! Here are your booking details:\n\n{}\nTotal Amount: {} {}\nPayment Reference: {}",
                    summary, payment.amount, payment.currency, payment.payment_reference
                ),
            ),
            Notification::PaymentFailed { payment, .. } => (
                format!("Payment Failed - {}", listing.title),
                format!(
                    "Unfortunately, your payment for the following booking could not be processed:\n\n{}\nTotal Amount: {} {}\nPayment Reference: {}\n\nPlease try again or contact our support team if you continue to experience issues.",
                    summary, payment.amount, payment.currency, payment.payment_reference
                ),
            ),
        };

        EmailMessage {
            from: from.to_string(),
            to: details.guest.email.clone(),
            subject,
            text: format!(
                "Dear {},\n\n{}\n\nBest regards,\nThe Travel Team",
                details.guest.display_name(),
                body
            ),
        }
    }
}

/// Handle for enqueueing notifications from request handlers.
///
/// Enqueueing never blocks and never fails the request; delivery is best effort.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiving end for its worker
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue a notification. Returns false if the worker is gone.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let kind = notification.kind();
        let booking_id = notification.details().booking.id;

        match self.sender.send(notification) {
            Ok(()) => {
                info!("Queued {} email for booking {}", kind, booking_id);
                true
            }
            Err(_) => {
                warn!("Notification worker stopped; dropping {} email for booking {}", kind, booking_id);
                false
            }
        }
    }
}

/// Background task draining the notification queue into a [`Mailer`]
pub struct NotificationWorker {
    receiver: mpsc::UnboundedReceiver<Notification>,
    mailer: Arc<dyn Mailer>,
    from_address: String,
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Notification>,
        mailer: Arc<dyn Mailer>,
        from_address: String,
    ) -> Self {
        Self {
            receiver,
            mailer,
            from_address,
        }
    }

    /// Run until every [`Notifier`] handle is dropped
    pub async fn start(mut self) {
        info!("Notification worker started");

        while let Some(notification) = self.receiver.recv().await {
            self.deliver(&notification).await;
        }

        info!("Notification worker stopped");
    }

    async fn deliver(&self, notification: &Notification) {
        let message = notification.render(&self.from_address);

        if let Err(e) = self.mailer.send(&message).await {
            error!(
                "Failed to send {} email for booking {}: {}",
                notification.kind(),
                notification.details().booking.id,
                e
            );
        }
    }
}
