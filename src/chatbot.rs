use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::conversation::{Conversation, HistoryWindow, default_save_path};
use crate::error::ChatError;
use crate::model::{GenerationParams, Message, MessageRole};

pub struct Chatbot<C> {
    client: C,
    params: GenerationParams,
    window: HistoryWindow,
    conversation: Conversation,
}

impl<C: CompletionClient> Chatbot<C> {
    pub fn new(client: C, cfg: &Config) -> Self {
        Self {
            client,
            params: cfg.generation,
            window: cfg.history_window,
            conversation: Conversation::new(cfg.system_prompt.clone()),
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn clear(&mut self) -> Result<(), ChatError> {
        self.conversation.reset()?;
        info!("conversation reset");
        Ok(())
    }

    pub fn save(&self, name: Option<&str>) -> Result<PathBuf, ChatError> {
        let path = name
            .map(PathBuf::from)
            .unwrap_or_else(|| default_save_path(Local::now()));
        self.conversation.save(&path)?;
        Ok(path)
    }

    pub fn load(&mut self, name: &str) -> Result<usize, ChatError> {
        self.conversation.load(Path::new(name))
    }

    /// Runs one exchange. The user message and the reply are appended only
    /// when the endpoint answers; a failed exchange leaves the transcript as it was.
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let mut pending = self.conversation.messages().to_vec();
        pending.push(Message::user(text));
        let request = self.window.apply(&pending);
        debug!(
            history_len = pending.len(),
            request_len = request.len(),
            "dispatching chat turn"
        );

        let reply = self.client.complete(&request, &self.params).await?;

        self.conversation.append(MessageRole::User, text);
        self.conversation.append(MessageRole::Assistant, reply.clone());
        Ok(reply)
    }
}
