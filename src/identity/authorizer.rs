//! Page navigation gate. Only top-level HTML navigation is protected; scripts,
//! images and stylesheets are always served. This is a UX redirect, not an
//! access-control boundary over the files themselves.

pub const LOGIN_PAGE: &str = "/login.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Serve,
    RedirectToLogin,
}

/// Paths served without a session: the root, the login page and the index document.
pub fn is_login_exempt(path: &str) -> bool {
    path == "/" || path.ends_with("login.html") || path == "/index.html"
}

pub fn is_page_request(path: &str) -> bool {
    path == "/" || path.ends_with(".html")
}

pub fn page_access(path: &str, user: Option<&str>) -> PageAccess {
    if user.is_none() && !is_login_exempt(path) && is_page_request(path) {
        PageAccess::RedirectToLogin
    } else {
        PageAccess::Serve
    }
}
