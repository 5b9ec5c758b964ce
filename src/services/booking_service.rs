use super::notifier::{Notification, Notifier};
use crate::auth::ActingUser;
use crate::error::{AppError, AppResult};
use crate::models::{Booking, BookingChangeError, BookingChanges, BookingInput};
use crate::repositories::{BookingRepository, ListingRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for managing bookings
pub struct BookingService {
    booking_repo: Arc<BookingRepository>,
    listing_repo: Arc<ListingRepository>,
    notifier: Notifier,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<BookingRepository>,
        listing_repo: Arc<ListingRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            booking_repo,
            listing_repo,
            notifier,
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<Booking> {
        self.booking_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Book a listing for the acting user
    pub async fn create(&self, actor: &ActingUser, input: &BookingInput) -> AppResult<Booking> {
        info!(
            "Creating booking: listing={}, user={}, {} -> {}",
            input.listing_id, actor.id, input.check_in, input.check_out
        );

        let listing = self
            .listing_repo
            .find_by_id(input.listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", input.listing_id)))?;

        let total_price = Booking::quote(&listing, input.check_in, input.check_out, input.guests)
            .map_err(AppError::Validation)?;

        let booking = self
            .booking_repo
            .create(
                listing.id,
                actor.id,
                input.check_in,
                input.check_out,
                input.guests,
                total_price,
            )
            .await?;

        info!("✓ Booking {} created, total {}", booking.id, booking.total_price);

        if let Some(details) = self.booking_repo.find_details(booking.id).await? {
            self.notifier.enqueue(Notification::BookingCreated { details });
        }

        Ok(booking)
    }

    /// Bookings visible to the caller, newest first
    pub async fn list_for(&self, actor: &ActingUser) -> AppResult<Vec<Booking>> {
        let scope = if actor.is_staff { None } else { Some(actor.id) };
        Ok(self.booking_repo.list(scope).await?)
    }

    pub async fn get_for(&self, actor: &ActingUser, id: Uuid) -> AppResult<Booking> {
        let booking = self.load(id).await?;
        if !actor.can_manage(booking.user_id) {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }
        Ok(booking)
    }

    /// Change dates, guests or status.
    ///
    /// Only pending bookings may change their stay. Guests may cancel a pending
    /// booking; confirmation and every other status move are staff-only.
    pub async fn update(
        &self,
        actor: &ActingUser,
        id: Uuid,
        changes: &BookingChanges,
    ) -> AppResult<Booking> {
        let booking = self.load(id).await?;
        actor.ensure_can_manage(booking.user_id, "booking")?;

        let status = changes.status.unwrap_or_else(|| booking.status_enum());
        let check_in = changes.check_in.unwrap_or(booking.check_in);
        let check_out = changes.check_out.unwrap_or(booking.check_out);
        let guests = changes.guests.unwrap_or(booking.guests);

        let stay_changed =
            check_in != booking.check_in || check_out != booking.check_out || guests != booking.guests;

        booking
            .check_change(status, stay_changed, actor.is_staff)
            .map_err(|e| match e {
                BookingChangeError::Forbidden(msg) => AppError::Forbidden(msg),
                BookingChangeError::Invalid(msg) => AppError::Validation(msg),
            })?;

        let total_price = if stay_changed {
            let listing = self
                .listing_repo
                .find_by_id(booking.listing_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", booking.listing_id)))?;
            Booking::quote(&listing, check_in, check_out, guests).map_err(AppError::Validation)?
        } else {
            booking.total_price
        };

        let updated = self
            .booking_repo
            .update(id, check_in, check_out, guests, total_price, status)
            .await?;

        info!("Booking {} updated (status={})", id, updated.status);
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActingUser, id: Uuid) -> AppResult<()> {
        let booking = self.load(id).await?;
        actor.ensure_can_manage(booking.user_id, "booking")?;

        if !self.booking_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }

        info!("Booking {} deleted by {}", id, actor.id);
        Ok(())
    }
}
