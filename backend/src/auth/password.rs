//! Admin password checks.
//!
//! Stored credentials are either bcrypt hashes or, for rows created before
//! hashing was introduced, plain text. Plain-text rows are upgraded to a hash
//! on their first successful login.

use crate::error::{AppError, Result};

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Dummy hash for timing-safe comparison when the admin is not found.
/// bcrypt::verify against it takes about as long as a real check.
const DUMMY_HASH: &str = "$2b$12$LJ3m4ys3Lg2VBe.LBsDMzuCdNhJFUJShHTzu/hNRccWFEMOAb.Kze";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Matched a plain-text credential that should be re-hashed.
    ValidLegacy,
    Invalid,
    /// Plain-text credential while legacy logins are switched off.
    LegacyDisabled,
}

pub fn is_bcrypt_hash(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p))
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password.as_bytes(), bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_stored(password: &str, stored: &str, legacy_allowed: bool) -> Result<PasswordCheck> {
    if is_bcrypt_hash(stored) {
        let ok = bcrypt::verify(password.as_bytes(), stored).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to verify password: {}", e))
        })?;
        return Ok(if ok {
            PasswordCheck::Valid
        } else {
            PasswordCheck::Invalid
        });
    }

    if !legacy_allowed {
        return Ok(PasswordCheck::LegacyDisabled);
    }

    Ok(if password == stored {
        PasswordCheck::ValidLegacy
    } else {
        PasswordCheck::Invalid
    })
}

/// Burn one bcrypt verification so an unknown username costs the same as a
/// wrong password.
pub fn verify_dummy(password: &str) {
    let _ = bcrypt::verify(password.as_bytes(), DUMMY_HASH);
}
