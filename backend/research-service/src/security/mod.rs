pub mod hash;
pub mod jwt;
pub mod password;

pub use hash::sha256_hex;
pub use jwt::{AccessClaims, JwtKeys, RefreshClaims};
