use crate::config::MailConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Outgoing plain-text email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail relay unreachable: {0}")]
    Transport(String),

    #[error("Mail relay refused message: HTTP {0}")]
    Refused(u16),
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

/// Delivers rendered emails
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Writes emails to the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "📧 Email (log only)\n{}",
            message.text
        );
        Ok(())
    }
}

/// Posts emails as JSON to an HTTP mail relay
#[derive(Clone)]
pub struct RelayMailer {
    relay_url: String,
    client: reqwest::Client,
}

impl RelayMailer {
    pub fn new(relay_url: String) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { relay_url, client })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let response = self.client.post(&self.relay_url).json(message).send().await?;

        if !response.status().is_success() {
            return Err(MailError::Refused(response.status().as_u16()));
        }

        info!("📧 Email relayed to {}: {}", message.to, message.subject);
        Ok(())
    }
}

/// Pick the mailer implied by configuration
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.relay_url {
        Some(url) => Ok(Arc::new(RelayMailer::new(url.clone())?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let message = EmailMessage {
            from: "noreply@travel.local".to_string(),
            to: "guest@example.com".to_string(),
            subject: "Hello".to_string(),
            text: "Body".to_string(),
        };
        assert!(LogMailer.send(&message).await.is_ok());
    }

    #[test]
    fn test_mailer_from_config() {
        assert!(mailer_from_config(&MailConfig::default()).is_ok());

        let config = MailConfig {
            relay_url: Some("http://localhost:8025/send".to_string()),
            ..Default::default()
        };
        assert!(mailer_from_config(&config).is_ok());
    }
}
