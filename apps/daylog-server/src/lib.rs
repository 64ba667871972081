//! # Daylog Server
//!
//! The actix-web front of the journal: session gate, HTML pages, uploads
//! and the housekeeping scheduler.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod views;

#[cfg(feature = "scheduler")]
pub mod background;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use tracing_actix_web::TracingLogger;

use middleware::AuthGateMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;

/// Assemble the application: tracing, request IDs, the session gate, then
/// the routes.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let gate = AuthGateMiddleware::new(state.gate.clone(), state.sessions.clone(), state.cookies);

    App::new()
        .wrap(gate)
        .wrap(RequestIdMiddleware)
        .wrap(TracingLogger::default())
        .app_data(web::Data::new(state))
        .configure(handlers::configure_routes)
}
