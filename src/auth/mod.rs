//! Authentication: password hashing and signed session tokens.

pub mod handlers;
pub mod jwt;
pub mod password;

pub use handlers::{login, register, signup};
pub use jwt::{TokenClaims, create_token, verify_token};
