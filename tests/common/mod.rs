//! Shared test harness: a recording messenger and a bot context over a temp store
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use menubot::bot::{handle_event, BotContext};
use menubot::config::BotConfig;
use menubot::errors::DeliveryError;
use menubot::event::{InboundEvent, Payload, RichText};
use menubot::outbound::{Keyboard, Messenger};
use menubot::store::MessageContent;

pub const ADMIN: i64 = 100;
pub const BASE_TIME: f64 = 1_700_000_000.0;
pub const ENROLL: &str = "ВХОД В ОТРЯД СВОБОДЫ🗽";

/// One outbound delivery call
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Voice {
        chat_id: i64,
        file_id: String,
        caption: Option<String>,
    },
    VideoNote {
        chat_id: i64,
        file_id: String,
    },
    Photo {
        chat_id: i64,
        file_id: String,
        caption: Option<String>,
        keyboard: Option<Keyboard>,
    },
    Video {
        chat_id: i64,
        file_id: String,
        caption: Option<String>,
    },
    Document {
        chat_id: i64,
        file_id: String,
    },
    KeyboardRemoved {
        chat_id: i64,
        message_id: i32,
    },
}

impl Sent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Sent::Text { chat_id, .. }
            | Sent::Voice { chat_id, .. }
            | Sent::VideoNote { chat_id, .. }
            | Sent::Photo { chat_id, .. }
            | Sent::Video { chat_id, .. }
            | Sent::Document { chat_id, .. }
            | Sent::KeyboardRemoved { chat_id, .. } => *chat_id,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Records every delivery; chats marked as failing get an error and no record
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<i64>>,
    failing_media: Mutex<HashSet<i64>>,
}

impl RecordingMessenger {
    pub fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    /// Fail only file sends to `chat_id`; texts still go through
    pub fn fail_media_for(&self, chat_id: i64) {
        self.failing_media.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.chat_id() == chat_id).collect()
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent_to(chat_id)
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    /// Keyboard attached to the most recent text sent to `chat_id`
    pub fn last_keyboard_to(&self, chat_id: i64) -> Option<Keyboard> {
        self.sent_to(chat_id).into_iter().rev().find_map(|s| match s {
            Sent::Text { keyboard, .. } => keyboard,
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, chat_id: i64, sent: Sent) -> Result<(), DeliveryError> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::Blocked(chat_id));
        }
        let is_text = matches!(sent, Sent::Text { .. } | Sent::KeyboardRemoved { .. });
        if !is_text && self.failing_media.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::Request("file rejected".to_string()));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::Text {
                chat_id,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn send_voice(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        _keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::Voice {
                chat_id,
                file_id: file_id.to_string(),
                caption: caption.map(str::to_string),
            },
        )
    }

    async fn send_video_note(&self, chat_id: i64, file_id: &str, _keyboard: Option<&Keyboard>) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::VideoNote {
                chat_id,
                file_id: file_id.to_string(),
            },
        )
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::Photo {
                chat_id,
                file_id: file_id.to_string(),
                caption: caption.map(str::to_string),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn send_video(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        _keyboard: Option<&Keyboard>,
    ) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::Video {
                chat_id,
                file_id: file_id.to_string(),
                caption: caption.map(str::to_string),
            },
        )
    }

    async fn send_document(&self, chat_id: i64, file_id: &str, _caption: Option<&str>) -> Result<(), DeliveryError> {
        self.record(
            chat_id,
            Sent::Document {
                chat_id,
                file_id: file_id.to_string(),
            },
        )
    }

    async fn remove_inline_keyboard(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError> {
        self.record(chat_id, Sent::KeyboardRemoved { chat_id, message_id })
    }
}

/// A bot context over a temporary data file, with [`ADMIN`] as the only admin
pub struct Harness {
    pub ctx: BotContext,
    pub messenger: Arc<RecordingMessenger>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = BotConfig {
            token: "123:test".to_string(),
            admin_ids: [ADMIN].into_iter().collect(),
            data_file: dir.path().join("data.json"),
            menu_layout_file: dir.path().join("button.json"),
            ..BotConfig::default()
        };
        let messenger = Arc::new(RecordingMessenger::default());
        let ctx = BotContext::new(config, messenger.clone()).unwrap();
        Self {
            ctx,
            messenger,
            _dir: dir,
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.ctx.t(key)
    }

    pub async fn event_at(&self, user_id: i64, payload: Payload, received_at: f64) {
        handle_event(&self.ctx, InboundEvent::new(user_id, received_at, payload)).await;
    }

    pub async fn send(&self, user_id: i64, payload: Payload) {
        self.event_at(user_id, payload, BASE_TIME).await;
    }

    pub async fn text(&self, user_id: i64, text: &str) {
        self.send(user_id, Payload::Text(RichText::plain(text))).await;
    }

    /// Send a localized label as text
    pub async fn press(&self, user_id: i64, key: &str) {
        let label = self.t(key);
        self.text(user_id, &label).await;
    }

    /// Create a button holding plain text messages
    pub fn seed_button(&self, name: &str, texts: &[&str]) {
        self.ctx.store.create_button(name).unwrap();
        for text in texts {
            self.ctx.store.add_message_to_button(name, text_message(text)).unwrap();
        }
    }
}

pub fn text_message(content: &str) -> MessageContent {
    MessageContent::Text {
        content: content.to_string(),
    }
}

pub fn photo(file_id: &str) -> Payload {
    Payload::Photo {
        file_id: file_id.to_string(),
        caption: None,
    }
}

pub fn receipt_callback() -> Payload {
    Payload::Callback {
        data: "send_receipt".to_string(),
        message_id: Some(1),
    }
}
