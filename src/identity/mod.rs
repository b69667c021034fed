//! Session authentication: credential check, session registry and the page gate.
//! Keep the public surface thin and split implementation across sub-modules.

mod credentials;
mod session;
mod request_context;
mod authorizer;

pub use credentials::{CredentialStore, CredentialVerifier, Role};
pub use session::{sid_prefix, SessionId, SessionRegistry};
pub use request_context::{with_request_context, CurrentUser, REQUEST_ID_HEADER};
pub use authorizer::{is_login_exempt, is_page_request, page_access, PageAccess, LOGIN_PAGE};
