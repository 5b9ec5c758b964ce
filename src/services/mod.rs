pub mod booking_service;
pub mod mailer;
pub mod notifier;
pub mod payment_service;

pub use booking_service::BookingService;
pub use mailer::{mailer_from_config, EmailMessage, LogMailer, MailError, Mailer, RelayMailer};
pub use notifier::{Notification, NotificationWorker, Notifier};
pub use payment_service::{InitiatePayment, InitiatedPayment, PaymentService, VerificationOutcome};
