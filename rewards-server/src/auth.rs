use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use common::LedgerError;

const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a plaintext password into a PHC string for `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String, LedgerError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LedgerError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| LedgerError::InvalidInput(format!("could not hash password: {}", e)))
}
