use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{Notification, NotificationError, NotificationKind, OutboundEmail};
use crate::services::templates;

const COLLECTION: &str = "notifications";

/// Sends email through the HTTP mail relay and records every delivery
/// in the notifications collection.
pub struct MailerService {
    client: Client,
    store: DataApiClient,
    relay_url: String,
    relay_token: String,
    from: String,
    configured: bool,
}

impl MailerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            store: DataApiClient::new(config),
            relay_url: config.mail_relay_url.clone(),
            relay_token: config.mail_relay_token.clone(),
            from: config.mail_from.clone(),
            configured: config.is_mail_configured(),
        }
    }

    pub async fn send_appointment_created(
        &self,
        recipient: &str,
        patient_name: &str,
        doctor_name: &str,
        date: &str,
        time: &str,
    ) -> Result<(), NotificationError> {
        let template = templates::appointment_created(patient_name, doctor_name, date, time);
        self.deliver(recipient, NotificationKind::AppointmentCreated, template)
            .await
    }

    pub async fn send_appointment_updated(
        &self,
        recipient: &str,
        patient_name: &str,
        doctor_name: &str,
        date: &str,
        time: &str,
    ) -> Result<(), NotificationError> {
        let template = templates::appointment_updated(patient_name, doctor_name, date, time);
        self.deliver(recipient, NotificationKind::AppointmentUpdated, template)
            .await
    }

    pub async fn send_appointment_cancelled(
        &self,
        recipient: &str,
        patient_name: &str,
        doctor_name: &str,
        date: &str,
        time: &str,
    ) -> Result<(), NotificationError> {
        let template = templates::appointment_cancelled(patient_name, doctor_name, date, time);
        self.deliver(recipient, NotificationKind::AppointmentCancelled, template)
            .await
    }

    pub async fn send_two_factor_code(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<(), NotificationError> {
        let template = templates::two_factor_code(code);
        self.deliver(recipient, NotificationKind::TwoFactorCode, template)
            .await
    }

    async fn deliver(
        &self,
        recipient: &str,
        kind: NotificationKind,
        template: templates::EmailTemplate,
    ) -> Result<(), NotificationError> {
        if !self.configured {
            return Err(NotificationError::NotConfigured);
        }

        let email = OutboundEmail {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: template.subject.clone(),
            text: template.text,
        };

        debug!("Sending {:?} email to {}", kind, recipient);

        let response = self
            .client
            .post(&self.relay_url)
            .header("Authorization", format!("Bearer {}", self.relay_token))
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Mail relay rejected message ({}): {}", status, message);
            return Err(NotificationError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            recipient: recipient.to_string(),
            kind,
            subject: template.subject,
            sent_at: Utc::now(),
        };
        let document = serde_json::to_value(&notification)
            .map_err(|e| NotificationError::Decode(e.to_string()))?;
        self.store.insert_one(COLLECTION, document).await?;

        info!("Email delivered to {} ({:?})", recipient, kind);
        Ok(())
    }

    /// Notification history for one recipient, most recent first.
    pub async fn history(&self, recipient: &str) -> Result<Vec<Notification>, NotificationError> {
        let documents = self
            .store
            .find_sorted(
                COLLECTION,
                json!({ "recipient": recipient }),
                json!({ "sent_at": -1 }),
                Some(50),
            )
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| NotificationError::Decode(e.to_string()))
            })
            .collect()
    }
}
