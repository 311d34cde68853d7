//! Serde views of the Telegram Bot API types we consume.

use serde::{Deserialize, Serialize};

/// One entry from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    /// Monotonic update id; the idempotency handle and poll offset.
    pub update_id: i64,

    pub message: Option<TelegramMessage>,
}

/// A Telegram message.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,

    pub chat: TelegramChat,

    /// Forum topic id when posted inside a topic.
    pub message_thread_id: Option<i64>,

    pub from: Option<TelegramUser>,

    pub text: Option<String>,

    /// Unix seconds.
    pub date: i64,
}

/// Chat (group / supergroup) identity.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Message author.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

/// Generic Bot API response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// Result of `createForumTopic`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramForumTopic {
    pub message_thread_id: i64,
}

/// Request body of `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct TelegramSendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

/// Request body of `createForumTopic`.
#[derive(Debug, Clone, Serialize)]
pub struct TelegramCreateForumTopic<'a> {
    pub chat_id: &'a str,
    pub name: &'a str,
}

/// Request body of `getUpdates`.
#[derive(Debug, Clone, Serialize)]
pub struct TelegramGetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}
