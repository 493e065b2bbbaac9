use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use service_core::error::AppError;
use std::time::Duration;

use crate::config::SmtpConfig;

/// Outbound notification channel. The service only needs one message kind;
/// the trait exists so tests can swap in a recording/no-op implementation.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::DeliveryFailed(e.to_string()),
            )?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(AppError::from)?;

        // Send on the blocking pool so the SMTP roundtrip never stalls the
        // async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %to_email, "Failed to send email");
                Err(AppError::DeliveryFailed(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r###"            <html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Your OTP Code</h2>
                    <p>Your one-time passcode is:</p>
                    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{}</p>
                    <p style="color: #666; font-size: 12px;">
                        This code is valid for {} minutes. If you didn't request it, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            code, ttl_minutes
        );

        let plain_body = format!(
            "Your OTP is {}. It is valid for {} minutes.",
            code, ttl_minutes
        );

        self.send_email(to_email, "Your OTP Code", &plain_body, &html_body)
            .await
    }
}

/// No-op provider for tests.
#[derive(Clone)]
pub struct MockEmailService;

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_otp_email(
        &self,
        _to_email: &str,
        _code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_service_creation() {
        let config = SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            user: "test@gmail.com".to_string(),
            password: "test_password".to_string(),
            from: "test@gmail.com".to_string(),
        };

        let service = EmailService::new(&config);
        assert!(service.is_ok());
    }
}
