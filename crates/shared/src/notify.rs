//! Best-effort SMS/WhatsApp notification service.
//!
//! Notification delivery must never affect the outcome of the request that
//! triggered it: every public method swallows transport failures after
//! logging them. When gateway credentials are absent the service runs in
//! log-only mode.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::NotifyConfig;

/// Notification transport errors. Logged, never surfaced to callers.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Gateway is not configured.
    #[error("notification gateway not configured")]
    NotConfigured,
    /// Gateway request failed.
    #[error("gateway request failed: {0}")]
    Transport(String),
    /// Gateway rejected the message.
    #[error("gateway rejected message: status {0}")]
    Rejected(u16),
}

/// SMS/WhatsApp notification service.
#[derive(Clone)]
pub struct NotificationService {
    config: NotifyConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("configured", &self.config.is_configured())
            .finish()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    #[must_use]
    pub fn new(config: NotifyConfig) -> Self {
        if !config.is_configured() && (config.account_sid.is_some() || config.auth_token.is_some())
        {
            warn!("notification gateway credentials are incomplete; SMS/WhatsApp disabled");
        }
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Sends an SMS message. Failures are logged and swallowed.
    pub async fn send_sms(&self, phone_number: &str, message: &str) {
        let from = self.config.from_number.clone().unwrap_or_default();
        if let Err(e) = self.dispatch(&from, phone_number, message).await {
            warn!(error = %e, to = %phone_number, "failed to send SMS");
        } else {
            info!(to = %phone_number, "SMS sent");
        }
    }

    /// Sends a WhatsApp message. Failures are logged and swallowed.
    pub async fn send_whatsapp(&self, phone_number: &str, message: &str) {
        let from = format!(
            "whatsapp:{}",
            self.config.whatsapp_number.clone().unwrap_or_default()
        );
        let to = format!("whatsapp:{phone_number}");
        if let Err(e) = self.dispatch(&from, &to, message).await {
            warn!(error = %e, to = %phone_number, "failed to send WhatsApp message");
        } else {
            info!(to = %phone_number, "WhatsApp message sent");
        }
    }

    /// Notifies about a recorded delivery.
    pub async fn notify_delivery(&self, seller_id: Uuid, buyer_id: Uuid, quantity: Decimal) {
        let message = format!("Milk delivery recorded: {quantity}L delivered. Thank you!");
        info!(
            seller_id = %seller_id,
            buyer_id = %buyer_id,
            "delivery notification: {message}"
        );
    }

    /// Notifies a buyer about a pending payment.
    pub async fn notify_pending_payment(&self, buyer_id: Uuid, pending_amount: Decimal) {
        let message = format!(
            "You have a pending payment of Rs. {pending_amount}. Please pay at your earliest convenience."
        );
        info!(buyer_id = %buyer_id, "pending payment notification: {message}");
    }

    async fn dispatch(&self, from: &str, to: &str, body: &str) -> Result<(), NotifyError> {
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured);
        }
        let (Some(sid), Some(token)) = (&self.config.account_sid, &self.config.auth_token) else {
            return Err(NotifyError::NotConfigured);
        };

        let url = format!("https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json");
        let params = [("From", from), ("To", to), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_send_is_a_noop() {
        let service = NotificationService::new(NotifyConfig::default());
        // Must not panic or error; the failure is logged and swallowed.
        service.send_sms("+10000000000", "test").await;
        service.send_whatsapp("+10000000000", "test").await;
    }
}
