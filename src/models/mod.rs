//! Domain models for the travel backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the booking platform.

pub mod booking;
pub mod listing;
pub mod payment;
pub mod review;
pub mod user;

// Re-export all models for convenient access
pub use booking::{
    Booking, BookingChangeError, BookingChanges, BookingDetails, BookingInput, BookingStatus,
    MAX_TOTAL_PRICE,
};
pub use listing::{Listing, ListingInput};
pub use payment::{Payment, PaymentStatus, Settlement, TransitionError};
pub use review::{Review, ReviewChanges, ReviewInput};
pub use user::{User, UserInput};
