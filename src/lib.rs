//! Travel Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use config::ChapaConfig;
use database::Database;
use gateway::PaymentGateway;
use repositories::*;
use services::{BookingService, Notifier, PaymentService};
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub listing_repo: Arc<ListingRepository>,
    pub review_repo: Arc<ReviewRepository>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    /// Create a new AppState backed by PostgreSQL
    pub fn new(
        pool: sqlx::PgPool,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Notifier,
        chapa: &ChapaConfig,
    ) -> Self {
        let ledger = Arc::new(PaymentRepository::new(pool.clone()));
        let payment_service = PaymentService::new(
            ledger,
            gateway,
            notifier.clone(),
            chapa.currency.clone(),
            chapa.webhook_hash.clone(),
        );

        Self::with_payment_service(pool, notifier, payment_service)
    }

    /// Create an AppState around an already assembled payment service
    pub fn with_payment_service(
        pool: sqlx::PgPool,
        notifier: Notifier,
        payment_service: PaymentService,
    ) -> Self {
        let listing_repo = Arc::new(ListingRepository::new(pool.clone()));
        let booking_repo = Arc::new(BookingRepository::new(pool.clone()));

        Self {
            database: Database::new(pool.clone()),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            review_repo: Arc::new(ReviewRepository::new(pool)),
            booking_service: Arc::new(BookingService::new(booking_repo, listing_repo.clone(), notifier)),
            listing_repo,
            payment_service: Arc::new(payment_service),
        }
    }
}
