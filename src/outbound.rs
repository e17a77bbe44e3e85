//! Outbound delivery: the transport-facing trait the engines talk to.

use async_trait::async_trait;

use crate::errors::DeliveryError;
use crate::markup::sanitize;
use crate::store::MessageContent;

/// An inline button that reports `callback` back to the bot when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAction {
    pub label: String,
    pub callback: String,
}

impl InlineAction {
    pub fn new(label: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: callback.into(),
        }
    }
}

/// Reply controls attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard, rows of labels
    Reply(Vec<Vec<String>>),
    /// Buttons attached to the message itself
    Inline(Vec<Vec<InlineAction>>),
    /// Hide any reply keyboard
    Remove,
}

impl Keyboard {
    /// One label per row
    pub fn column<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Keyboard::Reply(labels.into_iter().map(|label| vec![label.into()]).collect())
    }

    /// Every label shown by a reply keyboard
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Keyboard::Reply(rows) => rows.iter().flatten().map(String::as_str).collect(),
            Keyboard::Inline(rows) => rows.iter().flatten().map(|a| a.label.as_str()).collect(),
            Keyboard::Remove => Vec::new(),
        }
    }
}

/// Delivery of formatted messages to a chat. Text and captions are safe markup.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<(), DeliveryError>;

    async fn send_voice(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError>;

    async fn send_video_note(&self, chat_id: i64, file_id: &str, keyboard: Option<&Keyboard>) -> Result<(), DeliveryError>;

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError>;

    async fn send_video(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError>;

    async fn send_document(&self, chat_id: i64, file_id: &str, caption: Option<&str>) -> Result<(), DeliveryError>;

    /// Drop the inline keyboard from a previously sent message
    async fn remove_inline_keyboard(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError>;
}

/// Send one stored message; video-note captions follow as a separate text
pub async fn deliver_content(
    messenger: &dyn Messenger,
    chat_id: i64,
    content: &MessageContent,
    keyboard: Option<&Keyboard>,
) -> Result<(), DeliveryError> {
    match content {
        MessageContent::Text { content } => messenger.send_text(chat_id, content, keyboard).await,
        MessageContent::Voice { file_id, caption } => {
            messenger.send_voice(chat_id, file_id, caption.as_deref(), keyboard).await
        }
        MessageContent::VideoNote { file_id, caption } => {
            messenger.send_video_note(chat_id, file_id, keyboard).await?;
            match caption {
                Some(caption) => messenger.send_text(chat_id, caption, None).await,
                None => Ok(()),
            }
        }
        MessageContent::Photo { file_id, caption } => {
            messenger.send_photo(chat_id, file_id, caption.as_deref(), keyboard).await
        }
        MessageContent::Video { file_id, caption } => {
            messenger.send_video(chat_id, file_id, caption.as_deref(), keyboard).await
        }
    }
}

/// Re-sanitize stored markup before it is played back
pub fn sanitized(content: &MessageContent) -> MessageContent {
    match content {
        MessageContent::Text { content } => MessageContent::Text {
            content: sanitize(content),
        },
        media => {
            let caption = media.caption().map(sanitize);
            media.clone().with_caption(caption)
        }
    }
}
