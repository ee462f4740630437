pub mod auth;

pub use auth::{ensure_admin, require_admin, require_auth, Claims};
