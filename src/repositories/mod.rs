pub mod booking_repository;
pub mod listing_repository;
pub mod payment_repository;
pub mod review_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use booking_repository::BookingRepository;
pub use listing_repository::ListingRepository;
pub use payment_repository::{PaymentLedger, PaymentRepository};
pub use review_repository::ReviewRepository;
pub use user_repository::UserRepository;
