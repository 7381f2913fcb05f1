use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Hash compared against when there is no real credential, so a miss costs
/// the same Argon2 work as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password(&Password::new("dummy-password-for-timing")).ok());

/// Hash a password using Argon2id with a random salt embedded in the PHC string.
pub fn hash_password(password: &Password) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Verify a password against a stored PHC hash. Any failure, including an
/// unparseable hash, is a mismatch.
pub fn verify_password(password: &Password, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        tracing::warn!("Stored password hash has an invalid format");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .is_ok()
}

/// Burn one verification's worth of work; always reports a mismatch.
pub fn verify_against_dummy(password: &Password) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123");
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id"));
    }

    #[test]
    fn test_verify_password_correct_and_incorrect() {
        let password = Password::new("mySecurePassword123");
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash));
        assert!(!verify_password(&Password::new("wrongPassword"), &hash));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password(&Password::new("x"), "not-a-phc-string"));
        assert!(!verify_against_dummy(&Password::new("dummy-password-for-timing")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{:?}", password), "Password(***)");
    }
}
