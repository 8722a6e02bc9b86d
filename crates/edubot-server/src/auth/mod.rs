//! Authentication: password hashing, bearer token codec, revocation
//! registry, and the session guard that ties them together.

pub mod guard;
pub mod password;
pub mod revocation;
pub mod token;

pub use guard::{require_session, Identity, SessionGuard};
pub use password::PasswordHasher;
pub use revocation::RevocationRegistry;
pub use token::TokenCodec;
