//!
//! cctv HTTP server
//! ----------------
//! This module defines the Axum-based HTTP surface for the CCTV dashboard.
//!
//! Responsibilities:
//! - Login/logout endpoints issuing and clearing the `cctv_sid` session cookie.
//! - `/api/me` identity check backed by the in-memory session registry.
//! - Static file serving across two roots with an index-document fallback.
//! - Redirecting anonymous page navigation to the login page.
//! - Startup configuration logs and the optional session sweeper.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRef, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{middleware, Json, Router};
use path_absolutize::Absolutize;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::assets::{decode_request_path, StaticRoots, FAVICON_ASSET, INDEX_DOCUMENT};
use crate::config::ServerConfig;
use crate::cookie::{cleared_session_cookie, session_cookie, session_id_from_headers};
use crate::error::{AppError, AppResult};
use crate::identity::{
    page_access, sid_prefix, with_request_context, CredentialVerifier, CurrentUser, PageAccess,
    SessionRegistry, LOGIN_PAGE,
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialVerifier>,
    pub sessions: SessionRegistry,
    pub assets: StaticRoots,
    /// Attach `Secure` to the session cookie.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialVerifier>,
        sessions: SessionRegistry,
        assets: StaticRoots,
        secure_cookies: bool,
    ) -> Self {
        Self { credentials, sessions, assets, secure_cookies }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let sessions = match config.session_ttl {
            Some(ttl) => SessionRegistry::with_ttl(ttl),
            None => SessionRegistry::new(),
        };
        Self::new(
            Arc::new(config.credentials.clone()),
            sessions,
            StaticRoots::new(config.static_dir.clone(), config.root_dir.clone()),
            config.secure_cookies(),
        )
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Credentials pulled out of an arbitrary JSON body. Non-string fields count as absent.
#[derive(Debug, Default, PartialEq, Eq)]
struct LoginPayload {
    username: Option<String>,
    password: Option<String>,
}

impl LoginPayload {
    fn from_json(v: &Value) -> Self {
        let field = |name: &str| v.get(name).and_then(Value::as_str).map(str::to_string);
        Self { username: field("username"), password: field("password") }
    }
}

#[derive(Debug, Serialize)]
struct LoginOk<'a> {
    ok: bool,
    username: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub username: Option<String>,
}

pub fn router(state: AppState) -> Router {
    // API paths only match their own method; anything else is treated as a page request.
    Router::new()
        .route("/api/login", post(login).fallback(serve_page))
        .route("/api/logout", post(logout).fallback(serve_page))
        // axum answers HEAD with the GET handler unless HEAD has its own endpoint.
        .route("/api/me", get(me).head(serve_page).fallback(serve_page))
        .route("/favicon.ico", any(favicon))
        .fallback(serve_page)
        .layer(middleware::from_fn(with_request_context))
        .with_state(state)
}

async fn login(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body.map_err(|e| AppError::malformed(e.body_text()))?;
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        debug!("login body rejected: {e}");
        AppError::malformed(e.to_string())
    })?;
    let payload = LoginPayload::from_json(&value);
    let username = payload.username.as_deref().unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();

    if !state.credentials.verify(username, password) {
        warn!(user = username, "login rejected");
        return Err(AppError::InvalidCredentials);
    }
    let sid = state.sessions.create(username)?;
    info!(user = username, sid = sid_prefix(&sid), "login");

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&sid, state.secure_cookies).to_header_value()?);
    Ok((StatusCode::OK, headers, Json(LoginOk { ok: true, username })).into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(sid) = session_id_from_headers(&headers) {
        let removed = state.sessions.revoke(&sid);
        debug!(sid = sid_prefix(&sid), removed, "logout");
    }
    let mut h = HeaderMap::new();
    h.insert(header::SET_COOKIE, cleared_session_cookie(state.secure_cookies).to_header_value()?);
    Ok((StatusCode::OK, h, Json(serde_json::json!({"ok": true}))).into_response())
}

async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { authenticated: user.0.is_some(), username: user.0 })
}

async fn favicon(State(state): State<AppState>) -> Response {
    match state.assets.load(FAVICON_ASSET).await {
        Some(icon) => icon.into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn redirect_to_login() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, LOGIN_PAGE)]).into_response()
}

/// Catch-all: gate page navigation, then serve the file, the index document, or 404.
/// The gate and the file lookup both see the same once-decoded path.
async fn serve_page(State(state): State<AppState>, user: CurrentUser, uri: Uri) -> Response {
    let decoded = decode_request_path(uri.path());
    let path = decoded.as_deref().unwrap_or(uri.path());
    if page_access(path, user.username()) == PageAccess::RedirectToLogin {
        debug!("anonymous page request, redirecting to {LOGIN_PAGE}");
        return redirect_to_login();
    }
    if decoded.is_some() {
        let file_path = if path == "/" { INDEX_DOCUMENT } else { path };
        if let Some(asset) = state.assets.load(file_path).await {
            return asset.into_response();
        }
    }
    match state.assets.load(INDEX_DOCUMENT).await {
        Some(index) => index.into_response(),
        None => AppError::ResourceNotFound.into_response(),
    }
}

fn log_startup(config: &ServerConfig, state: &AppState) {
    let abs = |p: &std::path::Path| {
        p.absolutize().map(|a| a.display().to_string()).unwrap_or_else(|_| p.display().to_string())
    };
    let roots: Vec<String> = state.assets.roots().iter().map(|r| abs(r)).collect();
    info!(
        target: "startup",
        "cctv server starting: bind={}, static_roots={:?}, production={}, secure_cookies={}, session_ttl_secs={:?}",
        config.bind_addr(),
        roots,
        config.production,
        state.secure_cookies,
        state.sessions.ttl().map(|d| d.as_secs()),
    );
    info!(target: "startup", "enabled accounts: {:?}", config.credentials.enabled_usernames());
    for dir in state.assets.roots() {
        if !dir.is_dir() {
            warn!(target: "startup", "static root {} does not exist", abs(dir));
        }
    }
}

/// Background sweep of expired sessions; only meaningful when a TTL is set.
fn spawn_session_sweeper(sessions: SessionRegistry) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;
            let removed = sessions.purge_expired();
            if removed > 0 { debug!(removed, "session_sweep"); }
        }
    });
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    log_startup(&config, &state);

    if config.session_ttl.is_some() {
        spawn_session_sweeper(state.sessions.clone());
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("While binding HTTP listener on {addr}"))?;
    info!("Server listening on http://{}", listener.local_addr()?);
    serve(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
