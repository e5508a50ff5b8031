//! Email service for transactional customer email.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and text templates.
//! Without SMTP configuration the service runs in log-only mode.
//! Sends are fire-and-forget: callers spawn them and never wait on delivery.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::Instrument;

use larder_core::Email;

use crate::config::EmailConfig;

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
    shop_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
    shop_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered email ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    shop_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `None` config yields a service that logs messages instead of sending.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>, shop_url: &str) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self::disabled(shop_url));
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: Some(builder.build()),
            from_address: config.from_address.clone(),
            shop_url: shop_url.to_string(),
        })
    }

    /// A service that only logs outgoing messages.
    #[must_use]
    pub fn disabled(shop_url: &str) -> Self {
        Self {
            mailer: None,
            from_address: "no-reply@localhost".to_string(),
            shop_url: shop_url.to_string(),
        }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Render the signup confirmation email.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn welcome_email(&self, to: &Email, name: &str) -> Result<OutgoingEmail, EmailError> {
        let shop_url = self.shop_url.as_str();
        Ok(OutgoingEmail {
            to: to.as_str().to_string(),
            subject: "Sign up succeeded!".to_string(),
            text: WelcomeEmailText { name, shop_url }.render()?,
            html: WelcomeEmailHtml { name, shop_url }.render()?,
        })
    }

    /// Render the password reset email.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn password_reset_email(
        &self,
        to: &Email,
        name: &str,
        reset_url: &str,
    ) -> Result<OutgoingEmail, EmailError> {
        Ok(OutgoingEmail {
            to: to.as_str().to_string(),
            subject: "Password reset".to_string(),
            text: PasswordResetEmailText { name, reset_url }.render()?,
            html: PasswordResetEmailHtml { name, reset_url }.render()?,
        })
    }

    /// Deliver a rendered email, or log it when delivery is disabled.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or SMTP delivery fails.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                body = %email.text,
                "Email delivery disabled, logging message"
            );
            return Ok(());
        };

        let message = self.build_message(email)?;
        mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }

    /// Send in the background. Failures are logged and never reach the caller.
    pub fn spawn_send(&self, email: Result<OutgoingEmail, EmailError>) {
        let email = match email {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render email");
                return;
            }
        };

        let service = self.clone();
        let span = tracing::info_span!("send_email", to = %email.to, subject = %email.subject);
        tokio::spawn(
            async move {
                if let Err(e) = service.send(&email).await {
                    tracing::error!(error = %e, "Failed to send email");
                }
            }
            .instrument(span),
        );
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;
        Ok(message)
    }
}
