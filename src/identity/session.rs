use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub type SessionId = String;

/// Random bytes per session id; rendered as lowercase hex (32 chars).
const SESSION_ID_BYTES: usize = 16;

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    issued_at: Instant,
}

/// In-memory session id -> username map for the lifetime of the process.
///
/// Cloning shares the same storage. Without a TTL entries live until revoked;
/// with one they are dropped lazily on lookup or by [`SessionRegistry::purge_expired`].
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    ttl: Option<Duration>,
}

pub(crate) fn gen_session_id() -> AppResult<SessionId> {
    let mut buf = [0u8; SESSION_ID_BYTES];
    getrandom::getrandom(&mut buf).map_err(|e| AppError::internal(format!("session id entropy: {e}")))?;
    let mut sid = String::with_capacity(SESSION_ID_BYTES * 2);
    for b in &buf { let _ = write!(&mut sid, "{:02x}", b); }
    Ok(sid)
}

/// Short, log-safe form of a session id.
pub fn sid_prefix(sid: &str) -> &str {
    sid.get(..8).unwrap_or(sid)
}

impl SessionRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { sessions: Arc::default(), ttl: Some(ttl) }
    }

    pub fn ttl(&self) -> Option<Duration> { self.ttl }

    /// Issue a fresh session for an already-authenticated user.
    pub fn create(&self, username: &str) -> AppResult<SessionId> {
        if username.is_empty() { return Err(AppError::InvalidCredentials); }
        let sid = gen_session_id()?;
        let entry = SessionEntry { username: username.to_string(), issued_at: Instant::now() };
        self.sessions.write().insert(sid.clone(), entry);
        debug!(user = username, sid = sid_prefix(&sid), "session.create");
        Ok(sid)
    }

    pub fn resolve(&self, sid: &str) -> Option<String> {
        {
            let map = self.sessions.read();
            let entry = map.get(sid)?;
            if !self.is_expired(entry, Instant::now()) {
                return Some(entry.username.clone());
            }
        }
        self.sessions.write().remove(sid);
        debug!(sid = sid_prefix(sid), "session.expired");
        None
    }

    /// Remove a session; unknown ids are ignored. Returns whether anything was removed.
    pub fn revoke(&self, sid: &str) -> bool {
        let removed = self.sessions.write().remove(sid).is_some();
        if removed { debug!(sid = sid_prefix(sid), "session.revoke"); }
        removed
    }

    /// Drop every entry older than the TTL. No-op when no TTL is configured.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() { return 0; }
        let now = Instant::now();
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, entry| !self.is_expired(entry, now));
        before - map.len()
    }

    pub fn len(&self) -> usize { self.sessions.read().len() }

    pub fn is_empty(&self) -> bool { self.sessions.read().is_empty() }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.issued_at) >= ttl,
            None => false,
        }
    }
}
