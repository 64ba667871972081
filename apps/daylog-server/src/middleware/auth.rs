//! Session gate middleware and extractors.
//!
//! Every request gets its session decoded from the signed `dsession`
//! cookie. Private paths without an authenticated session are redirected to
//! the login form before any handler runs. Handlers reach the session
//! through [`SessionHandle`] and the derived access level through
//! [`Access`]; whatever they change is written back once the response is
//! ready.

use std::cell::RefCell;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
    body::EitherBody,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};

use daylog_core::domain::Session;
use daylog_core::ports::SessionCodec;
use daylog_core::services::{ArchiveAccess, AuthGate, AuthState, is_public};

use super::error::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "dsession";

const SESSION_COOKIE_DAYS: i64 = 30;

/// Attributes shared by the cookies this server sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    pub fn build<'c>(&self, name: &'c str, value: String, max_age: CookieDuration) -> Cookie<'c> {
        Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unchanged,
    Changed,
    /// The inbound cookie failed verification and must be dropped.
    Purged,
}

#[derive(Debug)]
struct SessionInner {
    session: Session,
    status: Status,
}

/// Request-scoped access to the session bag.
#[derive(Debug, Clone)]
pub struct SessionHandle(Rc<RefCell<SessionInner>>);

impl SessionHandle {
    fn new(session: Session, status: Status) -> Self {
        Self(Rc::new(RefCell::new(SessionInner { session, status })))
    }

    pub fn get(&self) -> Session {
        self.0.borrow().session.clone()
    }

    /// Mutate the session; it is re-persisted with the response.
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut inner = self.0.borrow_mut();
        inner.status = Status::Changed;
        f(&mut inner.session)
    }

    fn snapshot(&self) -> (Session, Status) {
        let inner = self.0.borrow();
        (inner.session.clone(), inner.status)
    }
}

impl FromRequest for SessionHandle {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionHandle>()
                .cloned()
                .ok_or_else(|| AppError::Internal("Session middleware not installed".to_string())),
        )
    }
}

/// The caller's standing as decided by the gate for this request.
#[derive(Debug, Clone, Copy)]
pub struct Access {
    pub state: AuthState,
    pub archive: ArchiveAccess,
}

impl FromRequest for Access {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Access>()
                .copied()
                .ok_or_else(|| AppError::Internal("Session middleware not installed".to_string())),
        )
    }
}

/// Session gate middleware factory.
pub struct AuthGateMiddleware {
    gate: Arc<AuthGate>,
    codec: Arc<dyn SessionCodec>,
    cookies: CookieSettings,
}

impl AuthGateMiddleware {
    pub fn new(gate: Arc<AuthGate>, codec: Arc<dyn SessionCodec>, cookies: CookieSettings) -> Self {
        Self {
            gate,
            codec,
            cookies,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGateMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service,
            gate: self.gate.clone(),
            codec: self.codec.clone(),
            cookies: self.cookies,
        }))
    }
}

pub struct AuthGateService<S> {
    service: S,
    gate: Arc<AuthGate>,
    codec: Arc<dyn SessionCodec>,
    cookies: CookieSettings,
}

impl<S> AuthGateService<S> {
    fn load(&self, req: &ServiceRequest) -> (Session, Status) {
        let Some(cookie) = req.cookie(SESSION_COOKIE) else {
            return (Session::default(), Status::Unchanged);
        };

        match self.codec.decode(cookie.value()) {
            Ok(session) => (session, Status::Unchanged),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unverifiable session cookie");
                (Session::default(), Status::Purged)
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let (mut session, status) = self.load(&req);
        let state = self.gate.state(&session);

        if !state.is_authenticated() && !is_public(req.path()) {
            tracing::debug!(path = %req.path(), "Unauthenticated request redirected to login");

            let mut response = AppError::Unauthorized.error_response();
            if status == Status::Purged {
                set_cookie(&mut response, &session_cookie(&self.cookies, None));
            }
            let res = req.into_response(response);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let status = if self.gate.touch(&mut session) {
            Status::Changed
        } else {
            status
        };
        let access = Access {
            state,
            archive: self.gate.archive_access(&session),
        };

        let handle = SessionHandle::new(session, status);
        req.extensions_mut().insert(handle.clone());
        req.extensions_mut().insert(access);

        let fut = self.service.call(req);
        let codec = self.codec.clone();
        let cookies = self.cookies;

        Box::pin(async move {
            let mut res = fut.await?;
            persist(&handle, codec.as_ref(), &cookies, &mut res);
            Ok(res.map_into_left_body())
        })
    }
}

/// Write the session back, or drop the cookie when nothing is left in it.
fn persist<B>(
    handle: &SessionHandle,
    codec: &dyn SessionCodec,
    cookies: &CookieSettings,
    res: &mut ServiceResponse<B>,
) {
    let (session, status) = handle.snapshot();
    if status == Status::Unchanged {
        return;
    }

    let value = if session == Session::default() {
        None
    } else {
        match codec.encode(&session) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Session cookie not persisted");
                return;
            }
        }
    };

    set_cookie(res.response_mut(), &session_cookie(cookies, value));
}

/// The session cookie carrying `value`, or its removal when `None`.
fn session_cookie(cookies: &CookieSettings, value: Option<String>) -> Cookie<'static> {
    match value {
        Some(value) => cookies.build(
            SESSION_COOKIE,
            value,
            CookieDuration::days(SESSION_COOKIE_DAYS),
        ),
        None => {
            let mut cookie = cookies.build(SESSION_COOKIE, String::new(), CookieDuration::ZERO);
            cookie.make_removal();
            cookie
        }
    }
}

fn set_cookie<B>(res: &mut HttpResponse<B>, cookie: &Cookie<'_>) {
    if let Err(e) = res.add_cookie(cookie) {
        tracing::warn!(error = %e, "Session cookie not persisted");
    }
}
