//! Chat history for the assistant panel.
//!
//! A [`ChatHistory`] is an ordinary value owned by whoever renders the chat.
//! Persistence goes through the injected [`KeyValueStore`]; the message list
//! is written as JSON under [`STORAGE_KEY`] after every change.  The loading
//! flag is transient and never persisted.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Key the message list is stored under.
pub const STORAGE_KEY: &str = "chat-storage";

const GREETING_ID: &str = "1";
const GREETING_TEXT: &str = "Hello! How can I help you today?";

// ── Storage port ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored chat history is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key-value persistence.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: ChatSender,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl ChatMessage {
    /// A new message with a fresh id, stamped now.
    pub fn new(text: impl Into<String>, sender: ChatSender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp_ms: now_ms(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, ChatSender::User)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, ChatSender::Bot)
    }

    fn greeting() -> Self {
        Self {
            id: GREETING_ID.to_string(),
            text: GREETING_TEXT.to_string(),
            sender: ChatSender::Bot,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── History ───────────────────────────────────────────────────────────────────

pub struct ChatHistory {
    store: Arc<dyn KeyValueStore>,
    messages: Vec<ChatMessage>,
    is_loading: bool,
}

impl ChatHistory {
    /// An unloaded history holding only the greeting.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            messages: vec![ChatMessage::greeting()],
            is_loading: false,
        }
    }

    /// Creates a history and restores any persisted messages.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let mut history = Self::new(store);
        if let Some(json) = history.store.get(STORAGE_KEY)? {
            history.messages = serde_json::from_str(&json)?;
            debug!(count = history.messages.len(), "chat history restored");
        }
        Ok(history)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn add_message(&mut self, message: ChatMessage) -> Result<(), StorageError> {
        self.messages.push(message);
        self.persist()
    }

    /// Replaces the text of message `id`.  Returns `false` if there is none.
    pub fn update_message(&mut self, id: &str, text: &str) -> Result<bool, StorageError> {
        self.edit(id, |msg| msg.text = text.to_string())
    }

    /// Appends a streamed chunk to message `id`.
    pub fn append_to_message(&mut self, id: &str, chunk: &str) -> Result<bool, StorageError> {
        self.edit(id, |msg| msg.text.push_str(chunk))
    }

    /// Resets to the greeting.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.messages = vec![ChatMessage::greeting()];
        self.persist()
    }

    fn edit(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut ChatMessage),
    ) -> Result<bool, StorageError> {
        let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) else {
            return Ok(false);
        };
        f(msg);
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.messages)?;
        self.store.put(STORAGE_KEY, &json)
    }
}
