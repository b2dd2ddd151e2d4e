//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod error;
pub mod health;
pub mod routes;
pub mod state;
pub mod users;
mod validation;

pub use error::ApiResult;

/// Register every endpoint and the extractor error handlers.
///
/// Query and JSON extraction failures are answered with the domain error
/// payload so clients see one error shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(error::extractor_error))
        .app_data(web::JsonConfig::default().error_handler(error::extractor_error))
        .service(users::get_user)
        .service(routes::list_routes)
        .service(routes::rename_route)
        .service(routes::delete_route)
        .service(health::ready)
        .service(health::live);
}
