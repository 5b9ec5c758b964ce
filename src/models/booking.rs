use super::{Listing, User};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Largest total a `NUMERIC(12, 2)` column holds
pub const MAX_TOTAL_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Fields accepted when creating a booking
#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub listing_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: i32,
}

fn default_guests() -> i32 {
    1
}

/// Fields accepted when updating a booking; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingChanges {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub status: Option<BookingStatus>,
}

/// Why a booking change was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingChangeError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),
}

/// Booking model representing a reservation of a listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub total_price: Decimal, // NUMERIC(12, 2) in database
    pub status: String,       // Stored as TEXT, use BookingStatus enum for type safety
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Validate a stay: check-out strictly after check-in, at least one guest.
    /// Returns the number of nights.
    pub fn validate_stay(check_in: NaiveDate, check_out: NaiveDate, guests: i32) -> Result<i64, String> {
        if check_in >= check_out {
            return Err("check_in must be before check_out".to_string());
        }
        if guests < 1 {
            return Err("Guests must be at least 1".to_string());
        }
        Ok((check_out - check_in).num_days())
    }

    /// Validate a stay against the listing it targets and price it
    pub fn quote(
        listing: &Listing,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
    ) -> Result<Decimal, String> {
        let nights = Self::validate_stay(check_in, check_out, guests)?;
        if !listing.is_available {
            return Err(format!("Listing {} is not available", listing.id));
        }
        if guests > listing.max_guests {
            return Err(format!(
                "Listing accommodates at most {} guests",
                listing.max_guests
            ));
        }
        listing
            .price_for(nights)
            .filter(|total| *total <= MAX_TOTAL_PRICE)
            .ok_or_else(|| format!("A {} night stay exceeds the maximum booking total", nights))
    }

    /// Check a requested change against the booking lifecycle.
    ///
    /// Dates and guests are frozen once the booking leaves `pending`. Guests may
    /// only cancel a pending booking; any other status move is staff-only.
    pub fn check_change(
        &self,
        next: BookingStatus,
        stay_changed: bool,
        by_staff: bool,
    ) -> Result<(), BookingChangeError> {
        let current = self.status_enum();

        if stay_changed && current != BookingStatus::Pending {
            return Err(BookingChangeError::Invalid(format!(
                "Dates and guests of a {} booking cannot change",
                current.as_str()
            )));
        }

        if next == current || by_staff {
            return Ok(());
        }

        match (current, next) {
            (BookingStatus::Pending, BookingStatus::Cancelled) => Ok(()),
            (_, BookingStatus::Confirmed) => Err(BookingChangeError::Forbidden(
                "Only staff can confirm a booking manually".to_string(),
            )),
            (from, to) => Err(BookingChangeError::Forbidden(format!(
                "Only staff can move a booking from {} to {}",
                from.as_str(),
                to.as_str()
            ))),
        }
    }

    /// Number of nights booked
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> BookingStatus {
        BookingStatus::from_str(&self.status).unwrap_or(BookingStatus::Pending)
    }

    /// Check if the booking is still waiting for payment
    pub fn is_pending(&self) -> bool {
        self.status_enum() == BookingStatus::Pending
    }
}

/// A booking together with the listing and guest it references.
///
/// Payment initiation and notification rendering both need all three.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub listing: Listing,
    pub guest: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listing(max_guests: i32, is_available: bool) -> Listing {
        let now = chrono::Utc::now().naive_utc();
        Listing {
            id: Uuid::new_v4(),
            title: "Lakeside cabin".to_string(),
            description: String::new(),
            location: "Bahir Dar".to_string(),
            price_per_night: Decimal::new(150000, 2),
            max_guests,
            is_available,
            image_url: String::new(),
            host_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_out_must_follow_check_in() {
        assert_eq!(Booking::validate_stay(date(2025, 1, 1), date(2025, 1, 4), 2), Ok(3));
        assert!(Booking::validate_stay(date(2025, 1, 4), date(2025, 1, 4), 2).is_err());
        assert!(Booking::validate_stay(date(2025, 1, 5), date(2025, 1, 4), 2).is_err());
    }

    #[test]
    fn test_guests_must_be_positive() {
        assert!(Booking::validate_stay(date(2025, 1, 1), date(2025, 1, 2), 0).is_err());
    }

    #[test]
    fn test_quote_prices_nights() {
        let total = Booking::quote(&listing(4, true), date(2025, 3, 1), date(2025, 3, 3), 2).unwrap();
        assert_eq!(total, Decimal::new(300000, 2));
    }

    #[test]
    fn test_quote_rejects_unavailable_or_crowded() {
        assert!(Booking::quote(&listing(4, false), date(2025, 3, 1), date(2025, 3, 3), 2).is_err());
        assert!(Booking::quote(&listing(2, true), date(2025, 3, 1), date(2025, 3, 3), 3).is_err());
    }

    fn booking(status: BookingStatus) -> Booking {
        let now = chrono::Utc::now().naive_utc();
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            check_in: date(2025, 3, 1),
            check_out: date(2025, 3, 3),
            guests: 2,
            total_price: Decimal::new(300000, 2),
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_quote_rejects_totals_beyond_column_range() {
        let mut pricey = listing(4, true);
        pricey.price_per_night = Decimal::new(99_999_999_99, 2); // NUMERIC(10, 2) max

        let result = Booking::quote(&pricey, date(2025, 1, 1), date(9999, 12, 31), 1);
        assert!(result.unwrap_err().contains("maximum booking total"));

        // 100 nights fit, 101 do not
        assert!(Booking::quote(&pricey, date(2025, 1, 1), date(2025, 4, 11), 1).is_ok());
        assert!(Booking::quote(&pricey, date(2025, 1, 1), date(2025, 4, 12), 1).is_err());
    }

    #[test]
    fn test_max_total_price_matches_column() {
        assert_eq!(MAX_TOTAL_PRICE, Decimal::new(999_999_999_999, 2));
    }

    #[test]
    fn test_guest_may_only_cancel_pending_booking() {
        let pending = booking(BookingStatus::Pending);
        assert!(pending.check_change(BookingStatus::Cancelled, false, false).is_ok());
        assert!(pending.check_change(BookingStatus::Pending, true, false).is_ok());
        assert!(matches!(
            pending.check_change(BookingStatus::Confirmed, false, false),
            Err(BookingChangeError::Forbidden(_))
        ));

        let confirmed = booking(BookingStatus::Confirmed);
        for next in [BookingStatus::Pending, BookingStatus::Cancelled] {
            assert!(matches!(
                confirmed.check_change(next, false, false),
                Err(BookingChangeError::Forbidden(_))
            ));
        }
        assert!(confirmed.check_change(BookingStatus::Confirmed, false, false).is_ok());

        let cancelled = booking(BookingStatus::Cancelled);
        assert!(cancelled.check_change(BookingStatus::Pending, false, false).is_err());
    }

    #[test]
    fn test_stay_is_frozen_after_pending() {
        let confirmed = booking(BookingStatus::Confirmed);
        assert!(matches!(
            confirmed.check_change(BookingStatus::Confirmed, true, false),
            Err(BookingChangeError::Invalid(_))
        ));
        assert!(matches!(
            confirmed.check_change(BookingStatus::Confirmed, true, true),
            Err(BookingChangeError::Invalid(_))
        ));
    }

    #[test]
    fn test_staff_may_move_status() {
        let confirmed = booking(BookingStatus::Confirmed);
        assert!(confirmed.check_change(BookingStatus::Cancelled, false, true).is_ok());
        assert!(booking(BookingStatus::Pending)
            .check_change(BookingStatus::Confirmed, false, true)
            .is_ok());
    }

    #[test]
    fn test_booking_status_conversion() {
        assert_eq!(BookingStatus::Pending.as_str(), "pending");
        assert_eq!(BookingStatus::from_str("CONFIRMED"), Ok(BookingStatus::Confirmed));
        assert!(BookingStatus::from_str("archived").is_err());
    }
}
