//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (`tower_sessions.session`) and the cookie is
//! signed with the configured session secret.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "larder_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session secret could not be turned into a signing key.
#[derive(Debug, thiserror::Error)]
#[error("invalid session signing key: {0}")]
pub struct SessionLayerError(String);

/// Create the session layer over `store`.
///
/// Production uses `tower_sessions_sqlx_store::PostgresStore`; tests pass a
/// `MemoryStore`.
///
/// # Errors
///
/// Returns an error if the session secret is shorter than 64 bytes.
pub fn create_session_layer<S: SessionStore>(
    store: S,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, SessionLayerError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionLayerError(e.to_string()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_session_layer_accepts_64_byte_secret() {
        assert!(create_session_layer(MemoryStore::default(), &test_config()).is_ok());
    }

    #[test]
    fn test_session_layer_rejects_short_secret() {
        let mut config = test_config();
        config.session_secret = SecretString::from("too-short");
        assert!(create_session_layer(MemoryStore::default(), &config).is_err());
    }
}
