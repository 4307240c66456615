use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

pub struct WhatsAppCloudProvider {
    api_token: String,
    phone_id: String,
    client: reqwest::Client,
}

impl WhatsAppCloudProvider {
    pub fn new(api_token: String, phone_id: String) -> Self {
        Self {
            api_token,
            phone_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppCloudProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        // Unconfigured token means dev mode: drop the message silently.
        if self.api_token.is_empty() {
            tracing::debug!(to = %to, "WHATSAPP_API_TOKEN not set, skipping send");
            return Ok(());
        }

        let url = format!(
            "https://graph.facebook.com/v17.0/{}/messages",
            self.phone_id
        );

        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        self.client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        Ok(())
    }
}
