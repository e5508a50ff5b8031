//! Authentication service.
//!
//! Password signup and login, plus the emailed password reset flow.

mod error;

pub use error::{AuthError, FieldError, FieldErrors};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use larder_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{PasswordResetToken, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Reset tokens are valid for one hour.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Random bytes in a reset token (hex-encoded to twice as many chars).
const RESET_TOKEN_BYTES: usize = 32;

/// Submitted signup form fields.
#[derive(Debug, Clone)]
pub struct SignupInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    hash_cost: u32,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// `hash_cost` is the Argon2 time cost used for new hashes.
    #[must_use]
    pub const fn new(pool: &'a PgPool, hash_cost: u32) -> Self {
        Self {
            users: UserRepository::new(pool),
            hash_cost,
        }
    }

    /// Register a new user with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn signup(&self, input: &SignupInput<'_>) -> Result<User, AuthError> {
        let email = validate_signup(input)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(input.password, self.hash_cost)?;

        self.users
            .create(input.name.trim(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for malformed input,
    /// `AuthError::UserNotFound` for an unknown email and
    /// `AuthError::IncorrectPassword` for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = validate_login(email, password)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::IncorrectPassword);
        }

        Ok(user)
    }

    /// Issue a reset token for the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the email.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<(User, PasswordResetToken), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        let reset = PasswordResetToken {
            user_id: user.id,
            token,
            expires_at,
        };
        Ok((user, reset))
    }

    /// Look up a reset token and check that it has not expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or expired.
    pub async fn verify_reset_token(&self, token: &str) -> Result<PasswordResetToken, AuthError> {
        let reset = self
            .users
            .find_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if reset.is_expired_at(Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }
        Ok(reset)
    }

    /// Set a new password using a reset token, then invalidate the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the password is too short and
    /// `AuthError::InvalidResetToken` if the token, user id and expiry do not
    /// all check out.
    pub async fn set_new_password(
        &self,
        user_id: UserId,
        token: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        check_password_length(password, &mut errors);
        errors.into_result()?;

        let password_hash = hash_password(password, self.hash_cost)?;
        if self
            .users
            .reset_password(user_id, token, &password_hash)
            .await?
        {
            Ok(())
        } else {
            Err(AuthError::InvalidResetToken)
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn check_email(email: &str, errors: &mut FieldErrors) -> Option<Email> {
    match Email::parse(email) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.push("email", "Please enter a valid email.");
            None
        }
    }
}

fn check_password_length(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }
}

/// Validate a signup form, returning the normalized email.
fn validate_signup(input: &SignupInput<'_>) -> Result<Email, AuthError> {
    let mut errors = FieldErrors::new();

    if input.name.trim().is_empty() {
        errors.push("name", "Please enter your name.");
    }
    let email = check_email(input.email, &mut errors);
    check_password_length(input.password, &mut errors);
    if input.password != input.confirm_password {
        errors.push("confirm_password", "Passwords have to match!");
    }

    match email {
        Some(email) if errors.is_empty() => Ok(email),
        _ => Err(AuthError::Validation(errors)),
    }
}

/// Validate a login form, returning the normalized email.
fn validate_login(email: &str, password: &str) -> Result<Email, AuthError> {
    let mut errors = FieldErrors::new();

    let email = check_email(email, &mut errors);
    if password.is_empty() {
        errors.push("password", "Please enter your password.");
    }

    match email {
        Some(email) if errors.is_empty() => Ok(email),
        _ => Err(AuthError::Validation(errors)),
    }
}

// =============================================================================
// Hashing
// =============================================================================

/// Hash a password using Argon2id with the given time cost.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the parameters are invalid or hashing fails.
pub fn hash_password(password: &str, time_cost: u32) -> Result<String, AuthError> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        time_cost,
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|_| AuthError::PasswordHash)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    // Parameters come from the PHC string, so the default instance verifies any cost.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// 32 random bytes, hex-encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
