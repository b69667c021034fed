use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use super::session::SessionRegistry;
use crate::cookie::session_id_from_headers;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity of the caller, derived fresh on every request from the `cctv_sid`
/// cookie and the session registry. `None` means unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn from_parts(parts: &Parts, registry: &SessionRegistry) -> Self {
        let user = session_id_from_headers(&parts.headers).and_then(|sid| registry.resolve(&sid));
        CurrentUser(user)
    }

    pub fn username(&self) -> Option<&str> { self.0.as_deref() }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SessionRegistry: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let registry = SessionRegistry::from_ref(state);
        Ok(CurrentUser::from_parts(parts, &registry))
    }
}

/// Tag each request with a fresh id, run it inside a `request` span and echo
/// the id back in `x-request-id`.
pub async fn with_request_context(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut resp = next.run(req).instrument(span).await;
    if let Ok(v) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    resp
}
