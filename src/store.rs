//! # Content Store Module
//!
//! A single JSON document holding menu buttons, known users, receipt
//! submissions and per-user receipt history. Every operation is a full
//! read-modify-write of the document; writes go through a temp file and a
//! rename so a crash never leaves a half-written document behind.

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::errors::StoreError;

/// One piece of content played back when a button is pressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        content: String,
    },
    Voice {
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    VideoNote {
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Photo {
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl MessageContent {
    /// Stable lowercase name of the content kind
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Voice { .. } => "voice",
            MessageContent::VideoNote { .. } => "video_note",
            MessageContent::Photo { .. } => "photo",
            MessageContent::Video { .. } => "video",
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            MessageContent::Text { .. } => None,
            MessageContent::Voice { file_id, .. }
            | MessageContent::VideoNote { file_id, .. }
            | MessageContent::Photo { file_id, .. }
            | MessageContent::Video { file_id, .. } => Some(file_id),
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            MessageContent::Text { .. } => None,
            MessageContent::Voice { caption, .. }
            | MessageContent::VideoNote { caption, .. }
            | MessageContent::Photo { caption, .. }
            | MessageContent::Video { caption, .. } => caption.as_deref(),
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, MessageContent::Text { .. })
    }

    /// Replace the caption of a media message; text messages are returned unchanged
    pub fn with_caption(self, new_caption: Option<String>) -> Self {
        let new_caption = new_caption.filter(|c| !c.trim().is_empty());
        match self {
            MessageContent::Text { content } => MessageContent::Text { content },
            MessageContent::Voice { file_id, .. } => MessageContent::Voice { file_id, caption: new_caption },
            MessageContent::VideoNote { file_id, .. } => {
                MessageContent::VideoNote { file_id, caption: new_caption }
            }
            MessageContent::Photo { file_id, .. } => MessageContent::Photo { file_id, caption: new_caption },
            MessageContent::Video { file_id, .. } => MessageContent::Video { file_id, caption: new_caption },
        }
    }
}

fn default_true() -> bool {
    true
}

/// A named menu entry with its ordered content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub messages: Vec<MessageContent>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            active: true,
        }
    }
}

/// A platform user that has interacted with the bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub joined: f64,
    #[serde(default)]
    pub is_admin_panel_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptKind {
    Photo,
    Document,
}

impl ReceiptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptKind::Photo => "photo",
            ReceiptKind::Document => "document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Pending,
    Approved,
    Rejected,
}

/// A payment receipt submitted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub user_id: i64,
    pub file_id: String,
    #[serde(rename = "type")]
    pub kind: ReceiptKind,
    pub status: ReceiptStatus,
    pub timestamp: f64,
}

fn users_map<'de, D>(deserializer: D) -> Result<BTreeMap<i64, UserRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(_) => {
            warn!("'users' is a list, converting to map");
            Ok(BTreeMap::new())
        }
        serde_json::Value::Null => Ok(BTreeMap::new()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// The whole persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub buttons: IndexMap<String, Button>,
    #[serde(default, deserialize_with = "users_map")]
    pub users: BTreeMap<i64, UserRecord>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    #[serde(default)]
    pub receipt_history: BTreeMap<i64, Vec<f64>>,
}

/// File-backed content store
#[derive(Debug)]
pub struct ContentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ContentStore {
    /// Open a store backed by `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using content document at: {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document; a missing or empty file is an empty document
    pub fn load(&self) -> Result<Document, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Document::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Replace the document on disk
    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp_file = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(temp_file.as_file_mut(), document)?;
        temp_file.as_file_mut().flush()?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;
        debug!("Content document saved to {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation under the write lock and persist the result
    fn update<T>(&self, mutate: impl FnOnce(&mut Document) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut document = self.load()?;
        let result = mutate(&mut document)?;
        self.save(&document)?;
        Ok(result)
    }

    pub fn get_buttons(&self) -> Result<IndexMap<String, Button>, StoreError> {
        Ok(self.load()?.buttons)
    }

    pub fn get_button(&self, name: &str) -> Result<Option<Button>, StoreError> {
        Ok(self.load()?.buttons.get(name).cloned())
    }

    pub fn get_users(&self) -> Result<BTreeMap<i64, UserRecord>, StoreError> {
        Ok(self.load()?.users)
    }

    pub fn get_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        Ok(self.load()?.receipts)
    }

    /// Receipts still awaiting a decision, in submission order
    pub fn pending_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        Ok(self
            .get_receipts()?
            .into_iter()
            .filter(|r| r.status == ReceiptStatus::Pending)
            .collect())
    }

    /// Insert or replace a button
    pub fn update_button(&self, name: &str, button: Button) -> Result<(), StoreError> {
        info!("Updating button: {}", name);
        self.update(|doc| {
            doc.buttons.insert(name.to_string(), button);
            Ok(())
        })
    }

    /// Create an empty, enabled button; fails if the name is taken
    pub fn create_button(&self, name: &str) -> Result<(), StoreError> {
        info!("Creating button: {}", name);
        self.update(|doc| {
            if doc.buttons.contains_key(name) {
                return Err(StoreError::ButtonExists(name.to_string()));
            }
            doc.buttons.insert(name.to_string(), Button::default());
            Ok(())
        })
    }

    /// Move a button under a new name, keeping its position and content
    pub fn rename_button(&self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        info!("Renaming button {} to {}", old_name, new_name);
        self.update(|doc| {
            if doc.buttons.contains_key(new_name) {
                return Err(StoreError::ButtonExists(new_name.to_string()));
            }
            let index = doc
                .buttons
                .get_index_of(old_name)
                .ok_or_else(|| StoreError::ButtonNotFound(old_name.to_string()))?;
            let button = doc
                .buttons
                .shift_remove(old_name)
                .ok_or_else(|| StoreError::ButtonNotFound(old_name.to_string()))?;
            doc.buttons.shift_insert(index, new_name.to_string(), button);
            Ok(())
        })
    }

    /// Append a message to a button
    pub fn add_message_to_button(&self, name: &str, message: MessageContent) -> Result<(), StoreError> {
        info!("Adding {} message to button {}", message.kind(), name);
        self.update(|doc| {
            let button = doc
                .buttons
                .get_mut(name)
                .ok_or_else(|| StoreError::ButtonNotFound(name.to_string()))?;
            button.messages.push(message);
            Ok(())
        })
    }

    /// Remove the message at a zero-based index, shifting later messages down
    pub fn remove_message_from_button(&self, name: &str, index: usize) -> Result<MessageContent, StoreError> {
        info!("Removing message {} from button {}", index, name);
        self.update(|doc| {
            let button = doc
                .buttons
                .get_mut(name)
                .ok_or_else(|| StoreError::ButtonNotFound(name.to_string()))?;
            if index >= button.messages.len() {
                return Err(StoreError::IndexOutOfRange {
                    index,
                    len: button.messages.len(),
                });
            }
            Ok(button.messages.remove(index))
        })
    }

    pub fn toggle_button(&self, name: &str, active: bool) -> Result<(), StoreError> {
        info!("Setting button {} active={}", name, active);
        self.update(|doc| {
            let button = doc
                .buttons
                .get_mut(name)
                .ok_or_else(|| StoreError::ButtonNotFound(name.to_string()))?;
            button.active = active;
            Ok(())
        })
    }

    /// Register a user on first contact; returns `true` if the user is new
    pub fn add_user(&self, user_id: i64, joined: f64) -> Result<bool, StoreError> {
        self.update(|doc| {
            if doc.users.contains_key(&user_id) {
                return Ok(false);
            }
            info!("Registering new user: {}", user_id);
            doc.users.insert(
                user_id,
                UserRecord {
                    joined,
                    is_admin_panel_enabled: false,
                },
            );
            Ok(true)
        })
    }

    pub fn set_admin_panel_enabled(&self, user_id: i64, enabled: bool, now: f64) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.users
                .entry(user_id)
                .or_insert(UserRecord {
                    joined: now,
                    is_admin_panel_enabled: false,
                })
                .is_admin_panel_enabled = enabled;
            Ok(())
        })
    }

    pub fn add_receipt(&self, user_id: i64, file_id: &str, kind: ReceiptKind, timestamp: f64) -> Result<(), StoreError> {
        info!("Storing {} receipt from user {}", kind.as_str(), user_id);
        self.update(|doc| {
            doc.receipts.push(Receipt {
                user_id,
                file_id: file_id.to_string(),
                kind,
                status: ReceiptStatus::Pending,
                timestamp,
            });
            Ok(())
        })
    }

    /// Decide a pending receipt; returns `false` if no pending receipt matched
    pub fn update_receipt_status(&self, user_id: i64, file_id: &str, status: ReceiptStatus) -> Result<bool, StoreError> {
        info!("Setting receipt {} of user {} to {:?}", file_id, user_id, status);
        self.update(|doc| {
            let receipt = doc.receipts.iter_mut().find(|r| {
                r.user_id == user_id && r.file_id == file_id && r.status == ReceiptStatus::Pending
            });
            Ok(match receipt {
                Some(receipt) => {
                    receipt.status = status;
                    true
                }
                None => false,
            })
        })
    }

    pub fn add_receipt_history(&self, user_id: i64, timestamp: f64) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.receipt_history.entry(user_id).or_default().push(timestamp);
            Ok(())
        })
    }

    pub fn get_receipt_history(&self, user_id: i64) -> Result<Vec<f64>, StoreError> {
        Ok(self.load()?.receipt_history.get(&user_id).cloned().unwrap_or_default())
    }

    /// Drop history entries that fell out of the window and return the rest
    pub fn prune_receipt_history(&self, user_id: i64, now: f64, window_secs: f64) -> Result<Vec<f64>, StoreError> {
        self.update(|doc| {
            let Some(history) = doc.receipt_history.get_mut(&user_id) else {
                return Ok(Vec::new());
            };
            history.retain(|ts| now - ts < window_secs);
            Ok(history.clone())
        })
    }
}
