//! Session cookie codec: `Cookie` header parsing and `Set-Cookie` rendering.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "cctv_sid";
/// Session cookie lifetime on login (12 hours).
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 12;

/// Parse a `Cookie` header value into a map. A repeated key keeps its last value.
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for part in raw.split(';') {
        let p = part.trim();
        let (k, v) = match p.split_once('=') {
            Some((k, v)) => (k, v),
            None => (p, ""),
        };
        if k.is_empty() { continue; }
        map.insert(k.to_string(), v.to_string());
    }
    map
}

/// All `Cookie` headers of a request, joined in order.
pub fn cookies_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let joined = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    parse_cookie_header(&joined)
}

/// The `cctv_sid` value carried by a request, if any. An empty value counts as absent.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    cookies_from_headers(headers)
        .remove(SESSION_COOKIE)
        .filter(|sid| !sid.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub http_only: bool,
    pub path: String,
    pub same_site: Option<SameSite>,
    pub secure: bool,
    pub max_age: Option<u64>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            http_only: true,
            path: "/".to_string(),
            same_site: Some(SameSite::Lax),
            secure: false,
            max_age: None,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self { self.secure = secure; self }
    pub fn max_age(mut self, secs: u64) -> Self { self.max_age = Some(secs); self }

    /// Render attributes in a fixed order: value, HttpOnly, Path, SameSite, Secure, Max-Age.
    pub fn render(&self) -> String {
        let mut attrs = vec![format!("{}={}", self.name, self.value)];
        if self.http_only { attrs.push("HttpOnly".to_string()); }
        attrs.push(format!("Path={}", self.path));
        if let Some(ss) = self.same_site { attrs.push(format!("SameSite={}", ss.as_str())); }
        if self.secure { attrs.push("Secure".to_string()); }
        if let Some(age) = self.max_age { attrs.push(format!("Max-Age={age}")); }
        attrs.join("; ")
    }

    pub fn to_header_value(&self) -> AppResult<HeaderValue> {
        HeaderValue::from_str(&self.render())
            .map_err(|e| AppError::internal(format!("invalid Set-Cookie value: {e}")))
    }
}

pub fn session_cookie(sid: &str, secure: bool) -> SetCookie {
    SetCookie::new(SESSION_COOKIE, sid).secure(secure).max_age(SESSION_MAX_AGE_SECS)
}

pub fn cleared_session_cookie(secure: bool) -> SetCookie {
    SetCookie::new(SESSION_COOKIE, "").secure(secure).max_age(0)
}
