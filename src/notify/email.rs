use std::{fmt, time::Duration};

use askama::Template;
use async_trait::async_trait;
use serde::Serialize;

use super::{Notification, NotificationKind, NotifyError};
use crate::config::NotifyConfig;

#[derive(Template)]
#[template(path = "email/account_verification.txt")]
struct AccountVerificationEmail<'a> {
    display_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmail<'a> {
    display_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/restaurant_rejected.txt")]
struct RestaurantRejectedEmail<'a> {
    restaurant_name: &'a str,
}

#[derive(Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

// Bodies carry confirmation links, keep them out of logs.
impl fmt::Debug for OutboundEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundEmail")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct MailRenderer {
    public_base_url: String,
}

impl MailRenderer {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn render(&self, notification: &Notification) -> Result<OutboundEmail, NotifyError> {
        let (subject, text) = match &notification.kind {
            NotificationKind::AccountVerification { display_name, key } => {
                let link = format!("{}/verify?key={key}", self.public_base_url);
                let body = AccountVerificationEmail {
                    display_name,
                    link: &link,
                }
                .render();
                ("Activate your account", body)
            }
            NotificationKind::PasswordReset { display_name, key } => {
                let link = format!("{}/reset-password?key={key}", self.public_base_url);
                let body = PasswordResetEmail {
                    display_name,
                    link: &link,
                }
                .render();
                ("Reset your password", body)
            }
            NotificationKind::RestaurantRejected { restaurant_name } => {
                let body = RestaurantRejectedEmail { restaurant_name }.render();
                ("Your restaurant registration", body)
            }
        };

        Ok(OutboundEmail {
            to: notification.recipient.clone(),
            subject: subject.to_string(),
            text: text.map_err(|err| NotifyError::Render(err.to_string()))?,
        })
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotifyError>;
}

/// Used when no mail API is configured.
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
        tracing::info!(to = %email.to, subject = %email.subject, "mail delivery not configured, dropping email");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: &'a MailAddress,
    to: Vec<MailAddress>,
    subject: &'a str,
    text_content: &'a str,
}

/// Posts to a transactional mail API that accepts a Brevo-style JSON body
/// and an `api-key` header.
pub struct HttpMailTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: MailAddress,
}

impl HttpMailTransport {
    pub fn new(
        api_url: String,
        api_key: String,
        sender_email: String,
        sender_name: Option<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| NotifyError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            sender: MailAddress {
                email: sender_email,
                name: sender_name,
            },
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
        let body = SendEmailBody {
            sender: &self.sender,
            to: vec![MailAddress {
                email: email.to.clone(),
                name: None,
            }],
            subject: &email.subject,
            text_content: &email.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(format!("mail request failed: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(NotifyError::Transport(format!(
            "mail send failed (status={status}): {detail}"
        )))
    }
}

/// Picks the HTTP transport when an API endpoint is configured.
pub fn transport_from_config(
    cfg: &NotifyConfig,
) -> Result<std::sync::Arc<dyn MailTransport>, NotifyError> {
    match (cfg.api_url.as_ref(), cfg.api_key.as_ref()) {
        (Some(url), Some(key)) => Ok(std::sync::Arc::new(HttpMailTransport::new(
            url.clone(),
            key.clone(),
            cfg.sender_email.clone(),
            cfg.sender_name.clone(),
        )?)),
        _ => Ok(std::sync::Arc::new(LogMailTransport)),
    }
}
