//! Authentication: password hashing, signed bearer tokens and the request verifier.

mod password;
mod token;
mod verifier;

pub use password::{hash_password, verify_password, verify_password_or_dummy};
pub use token::{Claims, TokenError, TokenKeys};
pub use verifier::AuthUser;
