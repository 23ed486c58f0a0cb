//! Outbound message egress. The ticks only see the [`Notifier`] seam; the
//! production implementation talks to the Telegram Bot API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bot api: {0}")]
    Api(String),
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Delivers one localized message to a chat. Callers log failures and
    /// carry on; nothing is retried here.
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), GatewayError>;
}

pub struct TelegramGateway {
    http: reqwest::Client,
    send_url: String,
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    description: Option<String>,
}

impl TelegramGateway {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            send_url: format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
        }
    }
}

#[async_trait]
impl Notifier for TelegramGateway {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), GatewayError> {
        let reply: ApiReply = self
            .http
            .post(&self.send_url)
            .json(&SendMessageParams { chat_id, text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !reply.ok {
            return Err(GatewayError::Api(
                reply.description.unwrap_or_else(|| "unknown error".to_owned()),
            ));
        }

        Ok(())
    }
}
