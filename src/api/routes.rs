use super::handlers;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/users")
                .route("", web::post().to(handlers::create_user))
                .route("/{id}", web::get().to(handlers::get_user)),
        )
        .service(
            web::scope("/listings")
                .route("", web::get().to(handlers::list_listings))
                .route("", web::post().to(handlers::create_listing))
                .route("/{id}", web::get().to(handlers::get_listing))
                .route("/{id}", web::put().to(handlers::update_listing))
                .route("/{id}", web::delete().to(handlers::delete_listing)),
        )
        .service(
            web::scope("/bookings")
                .route("", web::get().to(handlers::list_bookings))
                .route("", web::post().to(handlers::create_booking))
                .route("/{id}", web::get().to(handlers::get_booking))
                .route("/{id}", web::put().to(handlers::update_booking))
                .route("/{id}", web::delete().to(handlers::delete_booking)),
        )
        .service(
            web::scope("/reviews")
                .route("", web::get().to(handlers::list_reviews))
                .route("", web::post().to(handlers::create_review))
                .route("/{id}", web::get().to(handlers::get_review))
                .route("/{id}", web::put().to(handlers::update_review))
                .route("/{id}", web::delete().to(handlers::delete_review)),
        )
        .service(
            // Literal segments first so they are not captured by `/{id}`
            web::scope("/payments")
                .route("", web::get().to(handlers::list_payments))
                .route("/initiate", web::post().to(handlers::initiate_payment))
                .route("/verify", web::post().to(handlers::verify_payment))
                .route("/{id}", web::get().to(handlers::get_payment)),
        )
        .route("/chapa/webhook", web::post().to(handlers::chapa_webhook));
}
