//! Email service for submission and booking confirmations
//!
//! Sends are best-effort by contract: callers log failures and carry on, an
//! undelivered confirmation never fails the operation that triggered it.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

/// Email service backed by an async SMTP transport
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    from_name: String,
}

impl Mailer {
    /// Build a mailer from configuration
    ///
    /// Returns `None` when no SMTP host is configured; callers treat the
    /// missing mailer as "notifications disabled".
    pub fn from_config(config: &EmailConfig) -> Option<Result<Self>> {
        if !config.is_configured() {
            return None;
        }

        Some(Self::new(config))
    }

    fn new(config: &EmailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.smtp_from.clone(),
            from_name: config.smtp_from_name.clone(),
        })
    }

    /// Confirmation sent to the agency contact after intake
    pub async fn send_submission_confirmation(
        &self,
        to: &str,
        article_title: &str,
        author_name: &str,
    ) -> Result<()> {
        let subject = "Article Submission Confirmation - MedTimes";
        let body = format!(
            "Dear {},\n\n\
             Thank you for submitting your article \"{}\" to MedTimes.\n\n\
             Your article has been received and is currently under review. \
             We will notify you once the review process is complete.\n\n\
             Best regards,\nThe MedTimes Team",
            author_name, article_title
        );

        self.send(to, subject, body).await
    }

    /// Confirmation sent when an interview booking is paid
    pub async fn send_interview_confirmation(
        &self,
        to: &str,
        kol_name: &str,
        scheduled_time: &str,
        duration_minutes: i32,
    ) -> Result<()> {
        let subject = "Interview Booking Confirmation - MedTimes";
        let body = format!(
            "Your interview with {} has been successfully scheduled.\n\n\
             Date & Time: {}\n\
             Duration: {} minutes\n\n\
             We will send you a calendar invitation and meeting link shortly.\n\n\
             Best regards,\nThe MedTimes Team",
            kol_name, scheduled_time, duration_minutes
        );

        self.send(to, subject, body).await
    }

    /// Confirmation sent after a successful checkout
    pub async fn send_payment_confirmation(
        &self,
        to: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<()> {
        let subject = "Payment Confirmation - MedTimes";
        let body = format!(
            "Thank you for your payment of ${:.2} for {}.\n\n\
             Your transaction has been processed successfully.\n\n\
             Best regards,\nThe MedTimes Team",
            amount_cents as f64 / 100.0,
            description
        );

        self.send(to, subject, body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let from = format!("{} <{}>", self.from_name, self.from);

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_email_yields_no_mailer() {
        let config = EmailConfig::default();
        assert!(Mailer::from_config(&config).is_none());
    }

    #[test]
    fn test_configured_email_builds_mailer() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "mailer".to_string(),
            smtp_password: "secret".to_string(),
            ..EmailConfig::default()
        };

        let mailer = Mailer::from_config(&config).expect("Mailer should be built");
        assert!(mailer.is_ok());
    }
}
