//! Telegram transport: update classification and message delivery

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, MessageEntity, MessageEntityKind, MessageId, ParseMode,
    ReplyMarkup,
};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use crate::errors::DeliveryError;
use crate::event::{InboundEvent, Payload, RichText};
use crate::markup::{Span, SpanKind};
use crate::outbound::{Keyboard, Messenger};

use super::unix_now;

fn span_kind(kind: &MessageEntityKind) -> Option<SpanKind> {
    match kind {
        MessageEntityKind::Bold => Some(SpanKind::Bold),
        MessageEntityKind::Italic => Some(SpanKind::Italic),
        MessageEntityKind::Underline => Some(SpanKind::Underline),
        MessageEntityKind::Strikethrough => Some(SpanKind::Strikethrough),
        MessageEntityKind::Spoiler => Some(SpanKind::Spoiler),
        MessageEntityKind::TextLink { url } => Some(SpanKind::Link(url.to_string())),
        MessageEntityKind::Blockquote | MessageEntityKind::ExpandableBlockquote => Some(SpanKind::Quote),
        MessageEntityKind::Code => Some(SpanKind::Code),
        MessageEntityKind::Pre { language } => Some(SpanKind::Pre(language.clone())),
        _ => None,
    }
}

/// Formatting spans for the entities we can express as markup
pub fn spans_from_entities(entities: Option<&[MessageEntity]>) -> Vec<Span> {
    entities
        .unwrap_or_default()
        .iter()
        .filter_map(|entity| span_kind(&entity.kind).map(|kind| Span::new(entity.offset, entity.length, kind)))
        .collect()
}

fn classify(msg: &Message) -> Payload {
    if let Some(text) = msg.text() {
        return Payload::Text(RichText::new(text, spans_from_entities(msg.entities())));
    }

    let caption = msg
        .caption()
        .map(|caption| RichText::new(caption, spans_from_entities(msg.caption_entities())));

    if let Some(voice) = msg.voice() {
        Payload::Voice {
            file_id: voice.file.id.0.clone(),
            caption,
        }
    } else if let Some(note) = msg.video_note() {
        Payload::VideoNote {
            file_id: note.file.id.0.clone(),
        }
    } else if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        Payload::Photo {
            file_id: largest.file.id.0.clone(),
            caption,
        }
    } else if let Some(video) = msg.video() {
        Payload::Video {
            file_id: video.file.id.0.clone(),
            caption,
        }
    } else if let Some(document) = msg.document() {
        Payload::Document {
            file_id: document.file.id.0.clone(),
            caption,
        }
    } else {
        Payload::Unsupported
    }
}

/// Classify a message once; messages without a sender are ignored
pub fn event_from_message(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let mut event = InboundEvent::new(user.id.0 as i64, unix_now(), classify(msg));
    event.chat_id = msg.chat.id.0;
    debug!(user_id = %event.user_id, payload = ?event.payload, "Classified message");
    Some(event)
}

/// Classify a callback query; queries without data are ignored
pub fn event_from_callback(q: &CallbackQuery) -> Option<InboundEvent> {
    let data = q.data.clone()?;
    let message_id = q.message.as_ref().map(|m| m.id().0);
    let mut event = InboundEvent::new(q.from.id.0 as i64, unix_now(), Payload::Callback { data, message_id });
    if let Some(message) = &q.message {
        event.chat_id = message.chat().id.0;
    }
    Some(event)
}

fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
                .collect();
            KeyboardMarkup::new(rows).resize_keyboard().into()
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<InlineKeyboardButton>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|action| InlineKeyboardButton::callback(action.label.clone(), action.callback.clone()))
                        .collect()
                })
                .collect();
            InlineKeyboardMarkup::new(rows).into()
        }
        Keyboard::Remove => KeyboardRemove::new().into(),
    }
}

fn delivery_error(chat_id: i64, err: RequestError) -> DeliveryError {
    match err {
        RequestError::Api(ApiError::BotBlocked | ApiError::ChatNotFound | ApiError::UserDeactivated) => {
            DeliveryError::Blocked(chat_id)
        }
        other => DeliveryError::Request(other.to_string()),
    }
}

fn file(file_id: &str) -> InputFile {
    InputFile::file_id(FileId(file_id.to_string()))
}

/// [`Messenger`] over the Telegram Bot API, HTML parse mode
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<(), DeliveryError> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn send_voice(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_voice(ChatId(chat_id), file(file_id));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn send_video_note(&self, chat_id: i64, file_id: &str, keyboard: Option<&Keyboard>) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_video_note(ChatId(chat_id), file(file_id));
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_photo(ChatId(chat_id), file(file_id));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn send_video(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_video(ChatId(chat_id), file(file_id));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn send_document(&self, chat_id: i64, file_id: &str, caption: Option<&str>) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_document(ChatId(chat_id), file(file_id));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        request.await.map(|_| ()).map_err(|e| delivery_error(chat_id, e))
    }

    async fn remove_inline_keyboard(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError> {
        self.bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(|e| delivery_error(chat_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_entities_are_skipped() {
        let entities = vec![
            MessageEntity::new(MessageEntityKind::Bold, 0, 2),
            MessageEntity::new(MessageEntityKind::Mention, 3, 5),
            MessageEntity::new(MessageEntityKind::Pre { language: Some("rust".to_string()) }, 9, 4),
        ];
        let spans = spans_from_entities(Some(&entities));
        assert_eq!(
            spans,
            vec![
                Span::new(0, 2, SpanKind::Bold),
                Span::new(9, 4, SpanKind::Pre(Some("rust".to_string()))),
            ]
        );
        assert!(spans_from_entities(None).is_empty());
    }

    #[test]
    fn test_both_quote_kinds_map_to_quote() {
        let entities = vec![
            MessageEntity::new(MessageEntityKind::Blockquote, 0, 3),
            MessageEntity::new(MessageEntityKind::ExpandableBlockquote, 4, 6),
        ];
        assert_eq!(
            spans_from_entities(Some(&entities)),
            vec![Span::new(0, 3, SpanKind::Quote), Span::new(4, 6, SpanKind::Quote)]
        );
    }

    #[test]
    fn test_blocked_chats_are_reported() {
        let err = delivery_error(7, RequestError::Api(ApiError::BotBlocked));
        assert_eq!(err, DeliveryError::Blocked(7));
    }
}
