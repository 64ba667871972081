//! Embedded stylesheet and script.

use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{HttpResponse, web};

use crate::middleware::error::{AppError, AppResult};

const ASSETS: &[(&str, &str)] = &[
    ("style.css", include_str!("../../static/style.css")),
    ("app.js", include_str!("../../static/app.js")),
];

/// GET /static/{file}
pub async fn serve(file: web::Path<String>) -> AppResult<HttpResponse> {
    let (name, body) = ASSETS
        .iter()
        .find(|(name, _)| *name == file.as_str())
        .ok_or_else(|| AppError::NotFound(format!("No asset named {}", file)))?;

    Ok(HttpResponse::Ok()
        .content_type(mime_guess::from_path(name).first_or_octet_stream().to_string())
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(3600),
        ]))
        .body(*body))
}
