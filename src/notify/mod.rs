//! Outbound notifications. Requests only enqueue; a worker task renders and
//! delivers, so mail failures never reach the request path.

pub mod email;

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

pub use email::{
    HttpMailTransport, LogMailTransport, MailRenderer, MailTransport, OutboundEmail,
    transport_from_config,
};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,
    #[error("notification queue is closed")]
    QueueClosed,
    #[error("failed to render notification: {0}")]
    Render(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Template arguments travel with the kind.
#[derive(Clone)]
pub enum NotificationKind {
    AccountVerification { display_name: String, key: String },
    PasswordReset { display_name: String, key: String },
    RestaurantRejected { restaurant_name: String },
}

impl NotificationKind {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::AccountVerification { .. } => "account_verification",
            NotificationKind::PasswordReset { .. } => "password_reset",
            NotificationKind::RestaurantRejected { .. } => "restaurant_rejected",
        }
    }
}

#[derive(Clone)]
pub struct Notification {
    pub recipient: String,
    pub kind: NotificationKind,
}

/// Non-blocking hand-off. An error means the notification will not be sent.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

pub struct NotificationWorker {
    rx: mpsc::Receiver<Notification>,
    renderer: MailRenderer,
    transport: Arc<dyn MailTransport>,
}

impl NotificationQueue {
    pub fn new(
        capacity: usize,
        renderer: MailRenderer,
        transport: Arc<dyn MailTransport>,
    ) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self { tx },
            NotificationWorker {
                rx,
                renderer,
                transport,
            },
        )
    }

    pub fn spawn(
        capacity: usize,
        renderer: MailRenderer,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let (queue, worker) = Self::new(capacity, renderer, transport);
        tokio::spawn(worker.run());
        queue
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        match self.tx.try_send(notification) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(NotifyError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(NotifyError::QueueClosed),
        }
    }
}

impl NotificationWorker {
    /// Drains until every queue handle is dropped.
    pub async fn run(mut self) {
        while let Some(notification) = self.rx.recv().await {
            let kind = notification.kind.name();
            let email = match self.renderer.render(&notification) {
                Ok(email) => email,
                Err(err) => {
                    tracing::error!(kind, error = %err, "dropping notification");
                    continue;
                }
            };

            match self.transport.send(&email).await {
                Ok(()) => tracing::debug!(kind, to = %email.to, "notification delivered"),
                Err(err) => tracing::warn!(kind, to = %email.to, error = %err, "notification delivery failed"),
            }
        }
        tracing::debug!("notification worker stopped");
    }
}
