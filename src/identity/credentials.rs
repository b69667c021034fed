use std::collections::HashMap;

/// Fixed set of dashboard accounts. Each role logs in under its own username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Viewer,
    Manager,
    Guest,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Viewer, Role::Manager, Role::Guest];

    pub fn username(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
            Role::Manager => "manager",
            Role::Guest => "guest",
        }
    }

    /// Environment variable carrying this role's password.
    pub fn password_env(self) -> &'static str {
        match self {
            Role::Admin => "CCTV_ADMIN_PASSWORD",
            Role::Viewer => "CCTV_VIEWER_PASSWORD",
            Role::Manager => "CCTV_MANAGER_PASSWORD",
            Role::Guest => "CCTV_GUEST_PASSWORD",
        }
    }

    /// Only admin has a built-in development password; the rest stay disabled unless configured.
    pub fn default_password(self) -> Option<&'static str> {
        match self {
            Role::Admin => Some("admin"),
            _ => None,
        }
    }
}

/// Credential check seam. The router only ever sees this trait, so a hashed
/// implementation can replace [`CredentialStore`] without touching request handling.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Plaintext username -> password table, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    accounts: HashMap<String, Option<String>>,
}

impl CredentialStore {
    /// Build the role table from a lookup (normally the process environment).
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let accounts = Role::ALL
            .iter()
            .map(|role| {
                let configured = lookup(role.password_env()).filter(|v| !v.is_empty());
                let password = configured.or_else(|| role.default_password().map(str::to_string));
                (role.username().to_string(), password)
            })
            .collect();
        Self { accounts }
    }

    /// Explicit table, mostly for tests.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { accounts: pairs.into_iter().map(|(k, v)| (k.into(), v.map(Into::into))).collect() }
    }

    /// Usernames that can currently log in, sorted.
    pub fn enabled_usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .accounts
            .iter()
            .filter(|(_, pw)| pw.as_deref().is_some_and(|p| !p.is_empty()))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl CredentialVerifier for CredentialStore {
    fn verify(&self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() { return false; }
        match self.accounts.get(username) {
            Some(Some(expected)) if !expected.is_empty() => expected == password,
            _ => false,
        }
    }
}
