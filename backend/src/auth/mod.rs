pub mod jwt;
pub mod password;
pub mod revocation;
pub mod throttle;

pub use jwt::{AdminSession, Claims, IssuedToken, JwtManager};
pub use password::{hash_password, is_bcrypt_hash, verify_stored, PasswordCheck};
pub use revocation::RevocationList;
pub use throttle::LoginThrottle;
