//! # Error Types Module
//!
//! Structured errors for the content store and for outbound delivery.
//! Handlers themselves return `anyhow::Result`; these types describe the
//! failures that callers routinely match on.

/// Errors raised by the content store
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the document failed
    Io(std::io::Error),
    /// The document on disk is not valid JSON for the expected layout
    Parse(serde_json::Error),
    /// No button with this name exists
    ButtonNotFound(String),
    /// A button with this name already exists
    ButtonExists(String),
    /// A message index outside the button's message list
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "Store I/O error: {err}"),
            StoreError::Parse(err) => write!(f, "Store parse error: {err}"),
            StoreError::ButtonNotFound(name) => write!(f, "Button not found: {name}"),
            StoreError::ButtonExists(name) => write!(f, "Button already exists: {name}"),
            StoreError::IndexOutOfRange { index, len } => {
                write!(f, "Message index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(err)
    }
}

/// Errors raised while delivering a message to a chat
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// The platform rejected or failed the request
    Request(String),
    /// The recipient blocked the bot or the chat no longer exists
    Blocked(i64),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Request(msg) => write!(f, "Delivery request failed: {msg}"),
            DeliveryError::Blocked(chat_id) => write!(f, "Chat {chat_id} is unreachable"),
        }
    }
}

impl std::error::Error for DeliveryError {}
