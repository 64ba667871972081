//! HTTP handlers and route configuration.

mod assets;
mod auth;
mod posts;
mod uploads;

use actix_web::{HttpResponse, http::header, web};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub use auth::DEVICE_COOKIE;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(posts::index))
    .route("/login", web::get().to(auth::login_form))
    .route("/login", web::post().to(auth::login))
    .route("/logout", web::post().to(auth::logout))
    .route("/new", web::get().to(posts::new_form))
    .route("/new", web::post().to(posts::create))
    .route("/posts/{id}/edit", web::get().to(posts::edit_form))
    .route("/posts/{id}/edit", web::post().to(posts::edit))
    .route("/posts/{id}", web::delete().to(posts::delete))
    .route("/upload", web::post().to(uploads::upload))
    .route("/uploads/{path:.*}", web::get().to(uploads::serve))
    .route("/static/{file}", web::get().to(assets::serve));
}

fn render<T: Serialize>(state: &AppState, template: &str, view: &T) -> AppResult<HttpResponse> {
    let body = state.views.render(template, view)?;
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::html())
        .body(body))
}

fn redirect_home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Malformed id: {}", raw)))
}
