use crate::auth::ActingUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    BookingChanges, BookingInput, Listing, ListingInput, Review, ReviewChanges, ReviewInput, UserInput,
};
use crate::services::InitiatePayment;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// HEALTH
// ============================================================================

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.database.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "database": "ok"
        })),
        Err(e) => {
            warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "degraded",
                "database": "unreachable"
            }))
        }
    }
}

// ============================================================================
// USERS
// ============================================================================

pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<UserInput>,
) -> AppResult<HttpResponse> {
    body.validate().map_err(AppError::Validation)?;

    let user = state.user_repo.create(&body).await?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok(HttpResponse::Created().json(user))
}

pub async fn get_user(
    _actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(HttpResponse::Ok().json(user))
}

// ============================================================================
// LISTINGS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub available: Option<bool>,
}

/// Listing with its review summary
#[derive(Debug, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

async fn load_listing(state: &AppState, id: Uuid) -> AppResult<Listing> {
    state
        .listing_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
}

pub async fn list_listings(
    state: web::Data<AppState>,
    query: web::Query<ListingQuery>,
) -> AppResult<HttpResponse> {
    let listings = state.listing_repo.list(query.available).await?;
    Ok(HttpResponse::Ok().json(listings))
}

pub async fn get_listing(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let listing = load_listing(&state, path.into_inner()).await?;
    let (average_rating, review_count) = state.review_repo.rating_summary(listing.id).await?;

    Ok(HttpResponse::Ok().json(ListingDetail {
        listing,
        average_rating,
        review_count,
    }))
}

pub async fn create_listing(
    actor: ActingUser,
    state: web::Data<AppState>,
    body: web::Json<ListingInput>,
) -> AppResult<HttpResponse> {
    body.validate().map_err(AppError::Validation)?;

    let listing = state.listing_repo.create(actor.id, &body).await?;
    info!("Listing {} created by host {}", listing.id, actor.id);

    Ok(HttpResponse::Created().json(listing))
}

pub async fn update_listing(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ListingInput>,
) -> AppResult<HttpResponse> {
    body.validate().map_err(AppError::Validation)?;

    let listing = load_listing(&state, path.into_inner()).await?;
    actor.ensure_can_manage(listing.host_id, "listing")?;

    let updated = state.listing_repo.update(listing.id, &body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_listing(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let listing = load_listing(&state, path.into_inner()).await?;
    actor.ensure_can_manage(listing.host_id, "listing")?;

    if !state.listing_repo.delete(listing.id).await? {
        return Err(AppError::NotFound(format!("Listing {} not found", listing.id)));
    }
    info!("Listing {} deleted by {}", listing.id, actor.id);

    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// BOOKINGS
// ============================================================================

pub async fn list_bookings(actor: ActingUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let bookings = state.booking_service.list_for(&actor).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn get_booking(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let booking = state.booking_service.get_for(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn create_booking(
    actor: ActingUser,
    state: web::Data<AppState>,
    body: web::Json<BookingInput>,
) -> AppResult<HttpResponse> {
    let booking = state.booking_service.create(&actor, &body).await?;
    Ok(HttpResponse::Created().json(booking))
}

pub async fn update_booking(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<BookingChanges>,
) -> AppResult<HttpResponse> {
    let booking = state
        .booking_service
        .update(&actor, path.into_inner(), &body)
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn delete_booking(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.booking_service.delete(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// REVIEWS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub listing_id: Option<Uuid>,
}

async fn load_review(state: &AppState, id: Uuid) -> AppResult<Review> {
    state
        .review_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))
}

pub async fn list_reviews(
    state: web::Data<AppState>,
    query: web::Query<ReviewQuery>,
) -> AppResult<HttpResponse> {
    let reviews = state.review_repo.list(query.listing_id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn get_review(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let review = load_review(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn create_review(
    actor: ActingUser,
    state: web::Data<AppState>,
    body: web::Json<ReviewInput>,
) -> AppResult<HttpResponse> {
    Review::validate_rating(body.rating).map_err(AppError::Validation)?;
    load_listing(&state, body.listing_id).await?;

    let review = state.review_repo.create(actor.id, &body).await.map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("You have already reviewed this listing".to_string()),
        other => other,
    })?;

    info!("Review {} posted for listing {}", review.id, review.listing_id);
    Ok(HttpResponse::Created().json(review))
}

pub async fn update_review(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ReviewChanges>,
) -> AppResult<HttpResponse> {
    let review = load_review(&state, path.into_inner()).await?;
    if review.user_id != actor.id {
        return Err(AppError::Forbidden("Only the author can edit a review".to_string()));
    }

    let rating = body.rating.unwrap_or(review.rating);
    Review::validate_rating(rating).map_err(AppError::Validation)?;
    let comment = body.comment.as_deref().unwrap_or(&review.comment);

    let updated = state.review_repo.update(review.id, rating, comment).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_review(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let review = load_review(&state, path.into_inner()).await?;
    actor.ensure_can_manage(review.user_id, "review")?;

    state.review_repo.delete(review.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// PAYMENTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub tx_ref: String,
}

pub async fn list_payments(actor: ActingUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let payments = state.payment_service.list_for(&actor).await?;
    Ok(HttpResponse::Ok().json(payments))
}

pub async fn get_payment(
    actor: ActingUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let payment = state.payment_service.get_for(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

pub async fn initiate_payment(
    actor: ActingUser,
    state: web::Data<AppState>,
    body: web::Json<InitiatePayment>,
) -> AppResult<HttpResponse> {
    let initiated = state.payment_service.initiate(&actor, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "payment_reference": initiated.payment_reference,
        "checkout_url": initiated.checkout_url,
        "status": initiated.payment.status,
    })))
}

pub async fn verify_payment(
    _actor: ActingUser,
    state: web::Data<AppState>,
    body: web::Json<VerifyRequest>,
) -> AppResult<HttpResponse> {
    let outcome = state.payment_service.verify(&body.tx_ref).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "payment_status": outcome.payment_status,
        "booking_status": outcome.booking_status,
    })))
}

/// Gateway callback. The raw body is needed for signature checking.
pub async fn chapa_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let outcome = state.payment_service.handle_webhook(req.headers(), &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "payment_status": outcome.payment_status,
        "booking_status": outcome.booking_status,
    })))
}
