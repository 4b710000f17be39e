use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SmsConfig;

/// Outbound SMS delivery. Returns whether the gateway accepted the
/// message; transport failures are errors, rejections are `false`.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send(&self, phone_number: &str, message: &str) -> Result<bool, anyhow::Error>;
}

#[derive(Serialize)]
struct GatewayPayload<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

/// HTTP SMS gateway client.
pub struct HttpSms {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
    sender_id: String,
}

impl HttpSms {
    pub fn new(gateway_url: String, config: &SmsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url,
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
        }
    }
}

#[async_trait]
impl SmsProvider for HttpSms {
    async fn send(&self, phone_number: &str, message: &str) -> Result<bool, anyhow::Error> {
        let response = self
            .client
            .post(&self.gateway_url)
            .bearer_auth(&self.api_key)
            .json(&GatewayPayload {
                to: phone_number,
                from: &self.sender_id,
                body: message,
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(true)
        } else {
            warn!(status = %response.status(), "SMS gateway rejected message");
            Ok(false)
        }
    }
}

/// Logs messages instead of sending them. Used when no gateway is
/// configured, typically in development.
pub struct ConsoleSms;

#[async_trait]
impl SmsProvider for ConsoleSms {
    async fn send(&self, phone_number: &str, message: &str) -> Result<bool, anyhow::Error> {
        info!(phone_number = %phone_number, message = %message, "SMS (console delivery)");
        Ok(true)
    }
}

/// Capturing provider for tests.
#[derive(Default)]
pub struct MockSms {
    sent: std::sync::Mutex<Vec<(String, String)>>,
    fail_next: std::sync::atomic::AtomicBool,
}

impl MockSms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl SmsProvider for MockSms {
    async fn send(&self, phone_number: &str, message: &str) -> Result<bool, anyhow::Error> {
        if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
            return Ok(false);
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone_number.to_string(), message.to_string()));
        Ok(true)
    }
}
