//! bcrypt password hashing.
//!
//! Hashes are compatible with `bcryptjs` (`$2a$`/`$2b$`). bcrypt only looks at the
//! first 72 bytes, so longer inputs are refused instead of silently truncated.
//! Hashing runs on the blocking pool to keep the async workers free.

use tracing::debug;

use super::AuthError;

pub const DEFAULT_COST: u32 = 10;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 72;

const DECOY_PASSWORD: &str = "decoy-password";

/// Hash `password` with a fresh random salt.
///
/// # Errors
/// Returns `ServerFault` if the input is too long or hashing fails.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::ServerFault(format!(
            "password longer than {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AuthError::ServerFault(format!("hash task failed: {err}")))?
        .map_err(|err| AuthError::ServerFault(format!("failed to hash password: {err}")))
}

/// Compare `password` with a stored hash.
///
/// # Errors
/// Returns `ServerFault` if the stored hash is unreadable.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Ok(false);
    }
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AuthError::ServerFault(format!("verify task failed: {err}")))?
        .map_err(|err| AuthError::ServerFault(format!("failed to verify password: {err}")))
}

/// Hash a throwaway password at `cost`, used by [`verify_decoy`] for unknown
/// accounts. Runs on the calling thread.
///
/// # Errors
/// Returns `ServerFault` if the cost is out of range.
pub fn decoy_hash(cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(DECOY_PASSWORD, cost)
        .map_err(|err| AuthError::ServerFault(format!("failed to build decoy hash: {err}")))
}

/// Spend the same bcrypt effort as a real comparison when the account does
/// not exist, so response timing does not reveal registered emails.
/// `decoy` must be hashed at the cost used for stored passwords.
pub async fn verify_decoy(decoy: &str, password: &str) {
    let password = password.to_string();
    let decoy = decoy.to_string();
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &decoy)).await;
    match result {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => debug!("decoy verify failed: {err}"),
        Err(err) => debug!("decoy verify task failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use proptest::prelude::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify_matches() -> Result<()> {
        let hash = hash_password("s3cret-pass", TEST_COST).await?;
        assert!(hash.starts_with("$2"));
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash).await?);
        assert!(!verify_password("s3cret-pasS", &hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() -> Result<()> {
        let first = hash_password("repeat", TEST_COST).await?;
        let second = hash_password("repeat", TEST_COST).await?;
        assert_ne!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn verifies_bcryptjs_style_prefix() -> Result<()> {
        let hash = hash_password("legacy", TEST_COST).await?;
        let legacy = hash.replacen("$2b$", "$2a$", 1);
        assert!(verify_password("legacy", &legacy).await?);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_overlong_passwords() -> Result<()> {
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(hash_password(&long, TEST_COST).await.is_err());

        let hash = hash_password(&long[..MAX_PASSWORD_LENGTH], TEST_COST).await?;
        assert!(!verify_password(&long, &hash).await?);
        Ok(())
    }

    #[test]
    fn decoy_hash_uses_the_requested_cost() -> Result<()> {
        assert!(decoy_hash(TEST_COST)?.starts_with("$2b$04$"));
        assert!(decoy_hash(5)?.starts_with("$2b$05$"));
        assert!(matches!(decoy_hash(2), Err(AuthError::ServerFault(_))));
        Ok(())
    }

    #[tokio::test]
    async fn decoy_never_matches_a_real_password() -> Result<()> {
        let decoy = decoy_hash(TEST_COST)?;
        assert!(!verify_password("s3cret-pass", &decoy).await?);
        verify_decoy(&decoy, "s3cret-pass").await;
        verify_decoy("not-a-bcrypt-hash", "s3cret-pass").await;
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_hash_is_a_server_fault() {
        let result = verify_password("whatever", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(AuthError::ServerFault(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn only_the_original_password_verifies(
            password in "[ -~]{1,72}",
            other in "[ -~]{1,72}",
        ) {
            prop_assume!(password != other);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            let (original, different) = runtime.block_on(async {
                let hash = hash_password(&password, TEST_COST).await.expect("hash");
                (
                    verify_password(&password, &hash).await.expect("verify"),
                    verify_password(&other, &hash).await.expect("verify"),
                )
            });
            prop_assert!(original);
            prop_assert!(!different);
        }
    }
}
