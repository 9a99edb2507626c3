use std::future::Future;
use std::pin::Pin;

use crate::error::ChatError;
use crate::model::{GenerationParams, Message};

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ChatError>> + 'a>>;

/// One request per chat turn. Implementations never touch the conversation;
/// the caller decides what to append once a reply comes back.
pub trait CompletionClient {
    fn model(&self) -> &str;

    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
        params: &'a GenerationParams,
    ) -> CompletionFuture<'a>;
}
