// server/src/web/routes.rs

use actix_web::{error, web, HttpRequest, HttpResponse};
use tracing::debug;

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, food_handlers, order_handlers, user_handlers};

async fn root_handler() -> HttpResponse {
  HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("Hello from API")
}

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn rejected_input(kind: &str, detail: String, req: &HttpRequest) -> error::Error {
  debug!(path = %req.path(), kind, %detail, "Rejected malformed request input.");
  AppError::Validation(format!("Invalid {}: {}", kind, detail)).into()
}

/// Malformed bodies, queries and paths all answer 400 `{message}`.
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, req| rejected_input("body", err.to_string(), req)))
    .app_data(web::QueryConfig::default().error_handler(|err, req| rejected_input("query", err.to_string(), req)))
    .app_data(web::PathConfig::default().error_handler(|err, req| rejected_input("path", err.to_string(), req)));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);
  cfg
    .route("/", web::get().to(root_handler))
    .route("/health", web::get().to(health_check_handler))
    // Identity
    .route("/jwt", web::post().to(auth_handlers::issue_token_handler))
    .route("/logout", web::post().to(auth_handlers::logout_handler))
    .route("/users", web::post().to(user_handlers::create_user_handler))
    // Catalog
    .route("/count/foods", web::get().to(food_handlers::count_foods_handler))
    .route("/top/foods", web::get().to(food_handlers::top_foods_handler))
    .route(
      "/foods/user/{email}",
      web::get().to(food_handlers::list_foods_by_seller_handler),
    )
    .service(
      web::resource("/foods")
        .route(web::get().to(food_handlers::list_foods_handler))
        .route(web::post().to(food_handlers::create_food_handler)),
    )
    .service(
      web::resource("/foods/{id}")
        .route(web::get().to(food_handlers::get_food_handler))
        .route(web::patch().to(food_handlers::update_food_handler))
        .route(web::delete().to(food_handlers::delete_food_handler)),
    )
    // Orders
    .service(
      web::resource("/orders")
        .route(web::get().to(order_handlers::list_orders_handler))
        .route(web::post().to(order_handlers::place_order_handler)),
    )
    .route("/orders/{id}", web::delete().to(order_handlers::delete_order_handler));
}
