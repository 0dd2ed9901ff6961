//! Outbound mail behind a trait seam. The only transport here writes
//! to the log; send failures are logged by callers, never surfaced to
//! the request.

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::models::VerificationMail;

/// A composed message ready for a transport
#[derive(Debug, Clone)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<()>;
}

/// Log-backed transport
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<()> {
        tracing::info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "outbound mail:\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Renders the account verification mail for a fresh or unverified
/// user. `token` is the 24h verification JWT.
pub fn compose_verification(config: &Config, email: &str, username: &str, token: &str) -> VerificationMail {
    let base = config.public_base_url();
    let verify_url = format!("{}/v1/auth/verify-email?token={}", base, token);
    let resend_url = format!(
        "{}/v1/auth/send-email-verification?email={}",
        base,
        urlencoding::encode(email)
    );

    let body = format!(
        "Hi {username},\n\n\
         Welcome to MedMarket! Confirm your email address to activate your account:\n\n\
         {verify_url}\n\n\
         The link expires in 24 hours. If it stopped working, request a new one:\n\n\
         {resend_url}\n"
    );

    VerificationMail {
        from: config.mail.from.clone(),
        to: email.to_string(),
        subject: "Welcome to MedMarket!".to_string(),
        verify_url,
        resend_url,
        body,
    }
}

impl From<VerificationMail> for Mail {
    fn from(mail: VerificationMail) -> Self {
        Mail {
            from: mail.from,
            to: mail.to,
            subject: mail.subject,
            body: mail.body,
        }
    }
}
