//! Inbound events, classified once at the transport boundary.

use crate::markup::{render, Span};
use crate::store::{MessageContent, ReceiptKind};

/// Text together with its platform formatting spans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText {
    pub text: String,
    pub spans: Vec<Span>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn new(text: impl Into<String>, spans: Vec<Span>) -> Self {
        Self {
            text: text.into(),
            spans,
        }
    }

    /// Safe markup for this text; empty for blank text
    pub fn to_markup(&self) -> String {
        render(&self.text, &self.spans)
    }
}

fn caption_markup(caption: &Option<RichText>) -> Option<String> {
    caption
        .as_ref()
        .map(RichText::to_markup)
        .filter(|markup| !markup.is_empty())
}

/// What an inbound event carries
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(RichText),
    Voice { file_id: String, caption: Option<RichText> },
    VideoNote { file_id: String },
    Photo { file_id: String, caption: Option<RichText> },
    Video { file_id: String, caption: Option<RichText> },
    Document { file_id: String, caption: Option<RichText> },
    Callback { data: String, message_id: Option<i32> },
    Unsupported,
}

impl Payload {
    /// Trimmed text of a text payload
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Text(rich) => Some(rich.text.trim()),
            _ => None,
        }
    }

    /// Content suitable for storing on a button or broadcasting.
    ///
    /// Returns `None` for documents, callbacks, unsupported kinds and blank text.
    pub fn to_content(&self) -> Option<MessageContent> {
        match self {
            Payload::Text(rich) => {
                let content = rich.to_markup();
                (!content.is_empty()).then_some(MessageContent::Text { content })
            }
            Payload::Voice { file_id, caption } => Some(MessageContent::Voice {
                file_id: file_id.clone(),
                caption: caption_markup(caption),
            }),
            Payload::VideoNote { file_id } => Some(MessageContent::VideoNote {
                file_id: file_id.clone(),
                caption: None,
            }),
            Payload::Photo { file_id, caption } => Some(MessageContent::Photo {
                file_id: file_id.clone(),
                caption: caption_markup(caption),
            }),
            Payload::Video { file_id, caption } => Some(MessageContent::Video {
                file_id: file_id.clone(),
                caption: caption_markup(caption),
            }),
            Payload::Document { .. } | Payload::Callback { .. } | Payload::Unsupported => None,
        }
    }

    /// File usable as a payment receipt
    pub fn receipt_file(&self) -> Option<(&str, ReceiptKind)> {
        match self {
            Payload::Photo { file_id, .. } => Some((file_id.as_str(), ReceiptKind::Photo)),
            Payload::Document { file_id, .. } => Some((file_id.as_str(), ReceiptKind::Document)),
            _ => None,
        }
    }
}

/// One inbound event from a user
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: i64,
    pub chat_id: i64,
    /// Unix seconds at which the event was received
    pub received_at: f64,
    pub payload: Payload,
}

impl InboundEvent {
    pub fn new(user_id: i64, received_at: f64, payload: Payload) -> Self {
        Self {
            user_id,
            chat_id: user_id,
            received_at,
            payload,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.payload.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::SpanKind;

    #[test]
    fn test_text_payload_renders_markup() {
        let payload = Payload::Text(RichText::new("Hi <you>", vec![Span::new(0, 2, SpanKind::Bold)]));
        assert_eq!(
            payload.to_content(),
            Some(MessageContent::Text {
                content: "<b>Hi</b> &lt;you&gt;".to_string()
            })
        );
    }

    #[test]
    fn test_blank_text_is_not_content() {
        assert_eq!(Payload::Text(RichText::plain("   ")).to_content(), None);
    }

    #[test]
    fn test_media_caption_rendering() {
        let payload = Payload::Photo {
            file_id: "P".to_string(),
            caption: Some(RichText::plain("a & b")),
        };
        assert_eq!(
            payload.to_content(),
            Some(MessageContent::Photo {
                file_id: "P".to_string(),
                caption: Some("a &amp; b".to_string())
            })
        );
    }

    #[test]
    fn test_documents_are_receipts_not_content() {
        let payload = Payload::Document {
            file_id: "D".to_string(),
            caption: None,
        };
        assert_eq!(payload.to_content(), None);
        assert_eq!(payload.receipt_file(), Some(("D", ReceiptKind::Document)));
    }
}
