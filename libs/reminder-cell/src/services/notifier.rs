use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{Notification, NotifierError};

/// Delivery port. Implementations hand the event to whatever transport the
/// deployment wires up; callers treat any error as "not delivered".
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Default notifier: POSTs the event to a webhook endpoint.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            webhook_url: config.notifier_webhook_url.clone(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        if self.webhook_url.is_empty() {
            return Err(NotifierError::NotConfigured);
        }

        debug!(
            "Dispatching {:?} notification for appointment {}",
            notification.kind, notification.appointment_id
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifierError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
