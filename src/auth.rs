pub mod gate;
pub mod jwt;

use sha2::{Digest, Sha256};

pub use gate::{require_auth, AuthGate, AuthUser, Rejection};
pub use jwt::{Claims, TokenError, TokenService};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}
