use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;

/// Envelope every Bot API call comes back in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One long-poll update. Only message updates are of interest.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<Sender>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub id: i64,
}

/// Minimal Telegram Bot API client: long-poll for updates, send text
/// messages. The token is part of the request URL, so it must not leak
/// into errors or logs.
pub struct BotClient {
    http: reqwest::Client,
    base: String,
}

impl BotClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{}", token),
        }
    }

    /// Fetch updates past `offset`, blocking server-side for up to
    /// `timeout_secs` when none are pending.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .get(format!("{}/getUpdates", self.base))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout_secs.to_string()),
            ])
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("getUpdates returned malformed JSON")?;

        if !response.ok {
            bail!(
                "getUpdates rejected: {}",
                response.description.unwrap_or_default()
            );
        }

        Ok(response.result.unwrap_or_default())
    }

    /// Send a plain-text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage returned malformed JSON")?;

        if !response.ok {
            bail!(
                "sendMessage rejected: {}",
                response.description.unwrap_or_default()
            );
        }

        Ok(())
    }
}
