use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::ChatError;
use crate::model::{Message, MessageRole};

/// Ordered transcript of role-tagged messages. Index 0 holds the system
/// prompt unless the transcript was replaced wholesale by a load.
#[derive(Debug, Clone)]
pub struct Conversation {
    seed: Message,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let seed = Message::system(system_prompt);
        Self {
            messages: vec![seed.clone()],
            seed,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Truncates to the leading system message. A transcript loaded without
    /// one falls back to the system prompt this conversation was created with.
    pub fn reset(&mut self) -> Result<(), ChatError> {
        let Some(first) = self.messages.first() else {
            return Err(ChatError::InvalidState(
                "cannot reset an empty conversation",
            ));
        };

        if first.role == MessageRole::System {
            self.messages.truncate(1);
        } else {
            self.messages = vec![self.seed.clone()];
        }
        Ok(())
    }

    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Pretty-printed JSON array, UTF-8, non-ASCII kept literal.
    pub fn serialize(&self) -> Result<Vec<u8>, ChatError> {
        serde_json::to_vec_pretty(&self.messages)
            .map_err(|err| ChatError::Encode(err.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Vec<Message>, ChatError> {
        serde_json::from_slice(bytes).map_err(|err| ChatError::Parse(err.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ChatError> {
        let bytes = self.serialize()?;
        fs::write(path, bytes).map_err(|err| ChatError::file_io(path, err))?;
        info!(
            path = %path.display(),
            message_count = self.messages.len(),
            "saved conversation"
        );
        Ok(())
    }

    /// Replaces the transcript with the file's contents; on any error the
    /// current transcript is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<usize, ChatError> {
        let bytes = fs::read(path).map_err(|err| ChatError::file_io(path, err))?;
        let messages = Self::deserialize(&bytes)?;
        let count = messages.len();
        self.replace(messages);
        info!(
            path = %path.display(),
            message_count = count,
            "loaded conversation"
        );
        Ok(count)
    }
}

pub fn default_save_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(now.format("conversation_%Y%m%d_%H%M%S.json").to_string())
}

/// How much of the transcript goes out with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Resend the whole transcript every turn.
    #[default]
    Unbounded,
    /// Leading system messages plus the newest messages, `n` in total.
    LastMessages(usize),
}

impl HistoryWindow {
    pub fn apply(&self, messages: &[Message]) -> Vec<Message> {
        let limit = match self {
            Self::Unbounded => return messages.to_vec(),
            Self::LastMessages(limit) => *limit,
        };
        if messages.len() <= limit {
            return messages.to_vec();
        }

        let system_prefix = messages
            .iter()
            .take_while(|msg| msg.role == MessageRole::System)
            .count();
        let keep_tail = limit.saturating_sub(system_prefix).max(1);
        let tail_start = messages.len().saturating_sub(keep_tail).max(system_prefix);

        let mut trimmed = messages[..system_prefix].to_vec();
        trimmed.extend_from_slice(&messages[tail_start..]);
        trimmed
    }
}
