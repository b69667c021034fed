//! Process configuration: environment variables first, command-line flags on top.
//! Empty environment values are treated as unset.

use std::path::PathBuf;
use std::time::Duration;

use crate::identity::CredentialStore;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_STATIC_DIR: &str = "web/src";
pub const DEFAULT_ROOT_DIR: &str = "web";

pub const USAGE: &str = "cctv_server\n\nUSAGE:\n  cctv_server [--port N] [--host H] [--static-dir PATH] [--root-dir PATH] [--production]\n\nOPTIONS:\n  --port N            HTTP port (env: PORT, default 3000)\n  --host H            Bind host (env: CCTV_BIND_HOST, default 0.0.0.0)\n  --static-dir PATH   Primary static root (env: CCTV_STATIC_DIR, default web/src)\n  --root-dir PATH     Secondary static root (env: CCTV_ROOT_DIR, default web)\n  --production        Production mode; session cookie gets Secure (env: CCTV_PRODUCTION or NODE_ENV=production)\n\nENVIRONMENT:\n  CCTV_ADMIN_PASSWORD, CCTV_VIEWER_PASSWORD, CCTV_MANAGER_PASSWORD, CCTV_GUEST_PASSWORD\n  CCTV_COOKIE_SECURE     force the cookie Secure attribute on/off\n  CCTV_SESSION_TTL_SECS  expire sessions server-side after N seconds (default: never)\n";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub root_dir: PathBuf,
    pub production: bool,
    /// Explicit override for the cookie `Secure` attribute.
    pub cookie_secure: Option<bool>,
    pub session_ttl: Option<Duration>,
    pub credentials: CredentialStore,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            production: false,
            cookie_secure: None,
            session_ttl: None,
            credentials: CredentialStore::from_lookup(|_| None),
        }
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).map(String::as_str)
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

impl ServerConfig {
    /// Assemble configuration from an environment lookup and CLI args (args override env).
    pub fn from_sources<F>(lookup: F, args: &[String]) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = arg_value(args, "--port")
            .and_then(|v| v.parse::<u16>().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse::<u16>().ok()))
            .unwrap_or(defaults.port);
        let host = arg_value(args, "--host").map(str::to_string).or_else(|| env("CCTV_BIND_HOST")).unwrap_or(defaults.host);
        let static_dir = arg_value(args, "--static-dir").map(PathBuf::from)
            .or_else(|| env("CCTV_STATIC_DIR").map(PathBuf::from))
            .unwrap_or(defaults.static_dir);
        let root_dir = arg_value(args, "--root-dir").map(PathBuf::from)
            .or_else(|| env("CCTV_ROOT_DIR").map(PathBuf::from))
            .unwrap_or(defaults.root_dir);

        let production = has_flag(args, "--production")
            || env("CCTV_PRODUCTION").and_then(|v| parse_bool(&v)).unwrap_or(false)
            || env("NODE_ENV").is_some_and(|v| v == "production");
        let cookie_secure = env("CCTV_COOKIE_SECURE").and_then(|v| parse_bool(&v));
        let session_ttl = env("CCTV_SESSION_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            host,
            port,
            static_dir,
            root_dir,
            production,
            cookie_secure,
            session_ttl,
            credentials: CredentialStore::from_lookup(&lookup),
        }
    }

    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::from_sources(|name| std::env::var(name).ok(), args)
    }

    /// Whether the session cookie carries `Secure`: explicit override, else production mode.
    pub fn secure_cookies(&self) -> bool {
        self.cookie_secure.unwrap_or(self.production)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
