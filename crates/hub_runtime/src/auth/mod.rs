// Authentication & Authorization
// Password digests and the role gate used by every page entry point

pub mod passwords;
pub mod rbac;

pub use passwords::{hash_password, verify_password};
pub use rbac::{require_auth, require_roles, Role, SessionContext};
