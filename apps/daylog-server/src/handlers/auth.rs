//! Login and logout handlers.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::{HttpRequest, HttpResponse, http::header, web};

use daylog_core::domain::DEVICE_LIFETIME_DAYS;
use daylog_core::ports::RateLimiter;
use daylog_core::services::Recognition;
use daylog_shared::dto::LoginForm;

use super::render;
use crate::middleware::SessionHandle;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::LoginView;

/// Cookie naming the remembered device.
pub const DEVICE_COOKIE: &str = "dl-device";

/// GET /login
pub async fn login_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    render(&state, "login.html", &LoginView { failed: false })
}

/// POST /login
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: SessionHandle,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let client = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    match state.login_limiter.check(&client).await {
        Ok(result) if !result.allowed => {
            tracing::warn!(client = %client, "Login rate limit exceeded");
            return Err(AppError::TooManyRequests {
                retry_after: result.retry_after,
            });
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
    }

    // Argon2 verification is CPU bound.
    let gate = state.gate.clone();
    let mut candidate = session.get();
    let password = form.into_inner().password;
    let (candidate, verdict) = web::block(move || {
        let verdict = gate.login(&mut candidate, &password);
        (candidate, verdict)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    if !verdict? {
        return render(&state, "login.html", &LoginView { failed: true });
    }
    session.update(|current| *current = candidate);

    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, "/"));

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let known = req.cookie(DEVICE_COOKIE);

    match state
        .devices
        .recognize(known.as_ref().map(|c| c.value()), user_agent)
        .await
    {
        Ok(Recognition::New(device)) => {
            response.cookie(state.cookies.build(
                DEVICE_COOKIE,
                device.id.to_string(),
                CookieDuration::days(DEVICE_LIFETIME_DAYS),
            ));
        }
        Ok(Recognition::Known(device)) => {
            tracing::debug!(device_id = %device.id, "Known device");
        }
        Err(e) => tracing::warn!(error = %e, "Device registry unavailable"),
    }

    Ok(response.finish())
}

/// POST /logout
pub async fn logout(state: web::Data<AppState>, session: SessionHandle) -> HttpResponse {
    session.update(|s| state.gate.logout(s));
    tracing::info!("Logged out");

    HttpResponse::Ok()
        .insert_header(("HX-Redirect", "/"))
        .insert_header((header::LOCATION, "/"))
        .finish()
}
