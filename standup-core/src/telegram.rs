use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Client for the Telegram Bot API.
///
/// All methods go through the `https://api.telegram.org/bot<token>/<method>`
/// endpoint family. Responses arrive wrapped in the standard envelope
/// (`ok`/`result`/`description`/`error_code`), which `ApiResponse` unwraps.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_root: String,
}

/// Envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, turning `ok: false` into an error that carries
    /// the API's own description.
    fn into_result(self, method: &str) -> Result<T> {
        if self.ok {
            self.result
                .ok_or_else(|| anyhow!("Telegram API returned ok with no result for {}", method))
        } else {
            let description = self
                .description
                .unwrap_or_else(|| "no description provided".to_string());
            match self.error_code {
                Some(code) => Err(anyhow!(
                    "Telegram API error from {}: {} - {}",
                    method,
                    code,
                    description
                )),
                None => Err(anyhow!(
                    "Telegram API error from {}: {}",
                    method,
                    description
                )),
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Human-readable name: first name, plus last name when Telegram has one.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub message_thread_id: Option<i64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// One entry from `getChatAdministrators` / `getChatMember`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberInfo {
    pub user: User,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: i64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

impl SendMessageRequest {
    /// Standard outgoing message: Markdown parse mode, optionally pinned to a
    /// forum topic thread.
    pub fn markdown(chat_id: i64, message_thread_id: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: Some("Markdown"),
            message_thread_id,
            reply_to_message_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    chat_id: i64,
}

#[derive(Debug, Serialize)]
struct ChatMemberRequest {
    chat_id: i64,
    user_id: i64,
}

impl TelegramClient {
    /// Create a client for the bot identified by `token`.
    ///
    /// When `proxy_url` is set, all API traffic is routed through that proxy.
    /// This matters for deployments in networks where api.telegram.org is not
    /// directly reachable.
    pub fn new(token: &str, proxy_url: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().user_agent("standup-bot/0.1.0");

        if let Some(url) = proxy_url {
            let proxy = Proxy::all(url)
                .with_context(|| format!("Failed to configure proxy from '{}'", url))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_root: format!("https://api.telegram.org/bot{}", token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_root, method)
    }

    async fn call<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.method_url(method))
            .body(serde_json::to_string(request)?)
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!("Telegram API error from {}: {} - {}", method, status, error_text);
            return Err(anyhow!(
                "Telegram API error from {}: {} - {}",
                method,
                status,
                error_text
            ));
        }

        let envelope: ApiResponse<Resp> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        envelope.into_result(method)
    }

    /// Fetch the bot's own identity. Used at startup both as a connectivity
    /// check and to learn the bot's username for command addressing.
    pub async fn get_me(&self) -> Result<User> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .context("Failed to send getMe request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!("Telegram API error from getMe: {} - {}", status, error_text);
            return Err(anyhow!(
                "Telegram API error from getMe: {} - {}",
                status,
                error_text
            ));
        }

        let envelope: ApiResponse<User> = response
            .json()
            .await
            .context("Failed to parse getMe response")?;

        envelope.into_result("getMe")
    }

    /// Long-poll for new updates.
    ///
    /// Blocks server-side for up to `timeout_secs` waiting for activity, so
    /// the polling loop can run back-to-back calls without hammering the API.
    /// Only message updates are requested; everything else is filtered out
    /// at the Telegram end.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };

        let updates: Vec<Update> = self.call("getUpdates", &request).await?;

        if !updates.is_empty() {
            debug!("Received {} updates from Telegram", updates.len());
        }

        Ok(updates)
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<Message> {
        let message: Message = self.call("sendMessage", request).await?;

        info!(
            "Sent message {} to chat {}",
            message.message_id, request.chat_id
        );

        Ok(message)
    }

    pub async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<ChatMemberInfo>> {
        let request = ChatRequest { chat_id };
        let administrators: Vec<ChatMemberInfo> =
            self.call("getChatAdministrators", &request).await?;

        debug!(
            "Fetched {} administrators for chat {}",
            administrators.len(),
            chat_id
        );

        Ok(administrators)
    }

    pub async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMemberInfo> {
        let request = ChatMemberRequest { chat_id, user_id };
        self.call("getChatMember", &request).await
    }
}
