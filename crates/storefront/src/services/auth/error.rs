//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// A validation message attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Ordered collection of form validation failures.
///
/// The first error is shown as the page banner; all of them annotate fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A single error on one field.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message of the first failure, if any.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|e| e.message.as_str())
    }

    /// Whether `field` has at least one error (used for input styling).
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// The first message attached to `field`.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(AuthError::Validation)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` carrying these errors if any were pushed.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// No account for the submitted email.
    #[error("user not found")]
    UserNotFound,

    /// Password did not match the stored hash.
    #[error("incorrect password")]
    IncorrectPassword,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Reset token unknown, expired, or not issued to this user.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Field errors to re-render a form with, or `None` for errors that are
    /// not the user's fault.
    #[must_use]
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::UserNotFound => Some(FieldErrors::single("email", "E-mail not found.")),
            Self::IncorrectPassword => {
                Some(FieldErrors::single("password", "Password is incorrect."))
            }
            Self::UserAlreadyExists => Some(FieldErrors::single(
                "email",
                "E-mail exists already, please pick a different one.",
            )),
            Self::InvalidResetToken | Self::Repository(_) | Self::PasswordHash => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_first_and_has() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.push("email", "Please enter a valid email.");
        errors.push("password", "Too short.");
        assert_eq!(errors.first_message(), Some("Please enter a valid email."));
        assert!(errors.has("password"));
        assert_eq!(errors.message_for("password"), Some("Too short."));
        assert!(!errors.has("name"));
        assert_eq!(errors.message_for("name"), None);
        assert!(matches!(
            errors.into_result(),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_login_failures_map_to_fields() {
        let not_found = AuthError::UserNotFound.field_errors().unwrap_or_default();
        assert!(not_found.has("email"));
        assert_eq!(not_found.first_message(), Some("E-mail not found."));

        let wrong = AuthError::IncorrectPassword
            .field_errors()
            .unwrap_or_default();
        assert!(wrong.has("password"));
        assert_eq!(wrong.first_message(), Some("Password is incorrect."));

        assert!(AuthError::PasswordHash.field_errors().is_none());
    }
}
