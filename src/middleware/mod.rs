pub mod auth;

pub use auth::{issue_token, require_auth, user_from_headers, CurrentUser, JwtClaims, Role};
