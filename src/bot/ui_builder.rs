//! UI Builder module for creating keyboards and formatting listings

use indexmap::IndexMap;

use crate::config::MenuLayout;
use crate::localization::Localizer;
use crate::markup::{escape, preview};
use crate::outbound::{InlineAction, Keyboard};
use crate::store::{Button, MessageContent, Receipt};

use super::SEND_RECEIPT_CALLBACK;

/// Characters of message content shown per line in the delete listing
const LISTING_PREVIEW_CHARS: usize = 60;

/// Build the user main menu.
///
/// With a layout, rows keep their order and show only known, enabled
/// buttons; empty rows are dropped. Without one, the enrollment button is
/// pinned first and the remaining enabled buttons follow two per row.
pub fn build_main_menu(
    buttons: &IndexMap<String, Button>,
    layout: &MenuLayout,
    enrollment_button: &str,
    admin_shortcut: Option<&str>,
) -> Keyboard {
    let is_enabled = |name: &str| buttons.get(name).is_some_and(|button| button.active);
    let mut rows: Vec<Vec<String>> = Vec::new();

    if let Some(shortcut) = admin_shortcut {
        rows.push(vec![shortcut.to_string()]);
    }

    if layout.is_empty() {
        if is_enabled(enrollment_button) {
            rows.push(vec![enrollment_button.to_string()]);
        }
        let others: Vec<String> = buttons
            .iter()
            .filter(|(name, button)| button.active && name.as_str() != enrollment_button)
            .map(|(name, _)| name.clone())
            .collect();
        rows.extend(others.chunks(2).map(<[String]>::to_vec));
    } else {
        for row in &layout.menu {
            let row: Vec<String> = row.iter().filter(|name| is_enabled(name.as_str())).cloned().collect();
            if !row.is_empty() {
                rows.push(row);
            }
        }
    }

    Keyboard::Reply(rows)
}

/// Inline action attached to the last message of the enrollment button
pub fn enrollment_keyboard(texts: &Localizer) -> Keyboard {
    Keyboard::Inline(vec![vec![InlineAction::new(
        texts.t("btn-send-receipt"),
        SEND_RECEIPT_CALLBACK,
    )]])
}

pub fn cancel_keyboard(texts: &Localizer) -> Keyboard {
    Keyboard::column([texts.t("btn-cancel")])
}

pub fn back_cancel_keyboard(texts: &Localizer) -> Keyboard {
    Keyboard::Reply(vec![vec![texts.t("btn-back"), texts.t("btn-cancel")]])
}

pub fn admin_main_keyboard(texts: &Localizer) -> Keyboard {
    Keyboard::Reply(vec![
        vec![texts.t("admin-btn-edit")],
        vec![texts.t("admin-btn-create")],
        vec![texts.t("admin-btn-broadcast")],
        vec![texts.t("admin-btn-receipts")],
        vec![texts.t("btn-exit"), texts.t("btn-cancel")],
    ])
}

/// One button name per row, then back and cancel
pub fn button_list_keyboard<'a>(names: impl IntoIterator<Item = &'a String>, texts: &Localizer) -> Keyboard {
    let mut rows: Vec<Vec<String>> = names.into_iter().map(|name| vec![name.clone()]).collect();
    rows.push(vec![texts.t("btn-back"), texts.t("btn-cancel")]);
    Keyboard::Reply(rows)
}

/// Actions for a selected button; only the toggle that applies is offered
pub fn button_actions_keyboard(active: bool, texts: &Localizer) -> Keyboard {
    let toggle = if active {
        texts.t("admin-action-disable")
    } else {
        texts.t("admin-action-enable")
    };
    Keyboard::Reply(vec![
        vec![texts.t("admin-action-rename"), texts.t("admin-action-add")],
        vec![texts.t("admin-action-delete"), toggle],
        vec![texts.t("btn-back"), texts.t("btn-exit")],
        vec![texts.t("btn-cancel")],
    ])
}

/// Confirm / caption / cancel for a draft; captions only apply to media
pub fn preview_keyboard(allow_caption: bool, texts: &Localizer) -> Keyboard {
    let mut rows = vec![vec![texts.t("btn-confirm")]];
    if allow_caption {
        rows.push(vec![texts.t("btn-add-caption")]);
    }
    rows.push(vec![texts.t("btn-cancel")]);
    Keyboard::Reply(rows)
}

pub fn receipt_action_keyboard(texts: &Localizer) -> Keyboard {
    Keyboard::Reply(vec![
        vec![texts.t("admin-btn-approve")],
        vec![texts.t("admin-btn-reject")],
        vec![texts.t("btn-back"), texts.t("btn-cancel")],
    ])
}

/// Localized name of a content kind
pub fn kind_label(kind: &str, texts: &Localizer) -> String {
    texts.t(&format!("kind-{kind}"))
}

/// Numbered listing of a button's messages for deletion
pub fn format_message_list(button_name: &str, messages: &[MessageContent], texts: &Localizer) -> String {
    let name = escape(button_name);
    let mut result = texts.t_args("admin-messages-header", &[("name", name.as_str())]);
    result.push('\n');

    for (i, message) in messages.iter().enumerate() {
        let kind = kind_label(message.kind(), texts);
        let line = match message {
            MessageContent::Text { content } => {
                format!("{}. {}: {}", i + 1, kind, preview(content, LISTING_PREVIEW_CHARS))
            }
            media => format!(
                "{}. {} (ID: {})",
                i + 1,
                kind,
                escape(media.file_id().unwrap_or_default())
            ),
        };
        result.push_str(&line);
        result.push('\n');

        if let Some(caption) = message.caption() {
            result.push_str(&format!(
                "   {}: {}\n",
                texts.t("admin-caption-label"),
                preview(caption, LISTING_PREVIEW_CHARS)
            ));
        }
    }

    result.push('\n');
    result.push_str(&texts.t("admin-delete-prompt"));
    result
}

/// Numbered listing of pending receipts
pub fn format_receipt_list(pending: &[Receipt], texts: &Localizer) -> String {
    let mut result = texts.t("admin-receipts-header");
    result.push('\n');

    for (i, receipt) in pending.iter().enumerate() {
        let index = (i + 1).to_string();
        let user_id = receipt.user_id.to_string();
        result.push_str(&texts.t_args(
            "admin-receipt-line",
            &[
                ("index", index.as_str()),
                ("user_id", user_id.as_str()),
                ("kind", receipt.kind.as_str()),
            ],
        ));
        result.push('\n');
    }

    result.push('\n');
    result.push_str(&texts.t("admin-receipt-select-prompt"));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ReceiptKind, ReceiptStatus};

    const ENROLL: &str = "ВХОД В ОТРЯД СВОБОДЫ🗽";

    fn buttons(entries: &[(&str, bool)]) -> IndexMap<String, Button> {
        entries
            .iter()
            .map(|(name, active)| {
                (
                    name.to_string(),
                    Button {
                        messages: Vec::new(),
                        active: *active,
                    },
                )
            })
            .collect()
    }

    fn rows(keyboard: Keyboard) -> Vec<Vec<String>> {
        match keyboard {
            Keyboard::Reply(rows) => rows,
            other => panic!("expected reply keyboard, got {other:?}"),
        }
    }

    #[test]
    fn test_default_menu_pins_enrollment_and_pairs_the_rest() {
        let buttons = buttons(&[("A", true), (ENROLL, true), ("B", true), ("C", false), ("D", true)]);
        let menu = rows(build_main_menu(&buttons, &MenuLayout::default(), ENROLL, None));
        assert_eq!(
            menu,
            vec![vec![ENROLL.to_string()], vec!["A".to_string(), "B".to_string()], vec!["D".to_string()]]
        );
    }

    #[test]
    fn test_layout_filters_unknown_and_disabled() {
        let buttons = buttons(&[("A", true), ("B", false), ("C", true)]);
        let layout = MenuLayout {
            menu: vec![vec!["A".into(), "X".into()], vec!["B".into()], vec!["C".into(), "A".into()]],
        };
        let menu = rows(build_main_menu(&buttons, &layout, ENROLL, None));
        assert_eq!(
            menu,
            vec![vec!["A".to_string()], vec!["C".to_string(), "A".to_string()]]
        );
    }

    #[test]
    fn test_admin_shortcut_is_prepended() {
        let buttons = buttons(&[("A", true)]);
        let menu = rows(build_main_menu(&buttons, &MenuLayout::default(), ENROLL, Some("Админ Панель")));
        assert_eq!(menu[0], vec!["Админ Панель".to_string()]);
        assert_eq!(menu[1], vec!["A".to_string()]);
    }

    #[test]
    fn test_message_listing() {
        let texts = Localizer::new("ru").unwrap();
        let messages = vec![
            MessageContent::Text {
                content: "<b>Hello</b> &amp; bye".to_string(),
            },
            MessageContent::Photo {
                file_id: "PHOTO1".to_string(),
                caption: Some("<i>cap</i>".to_string()),
            },
        ];
        let listing = format_message_list("Info", &messages, &texts);
        assert!(listing.contains("1. Текст: Hello &amp; bye"));
        assert!(listing.contains("2. Фото (ID: PHOTO1)"));
        assert!(listing.contains("Подпись: cap"));
        assert!(listing.ends_with("Введи номер сообщения для удаления (например, 1):"));
    }

    #[test]
    fn test_receipt_listing() {
        let texts = Localizer::new("ru").unwrap();
        let pending = vec![Receipt {
            user_id: 42,
            file_id: "R".to_string(),
            kind: ReceiptKind::Photo,
            status: ReceiptStatus::Pending,
            timestamp: 1.0,
        }];
        let listing = format_receipt_list(&pending, &texts);
        assert!(listing.contains("1. Пользователь 42 (Тип: photo)"));
    }

    #[test]
    fn test_preview_keyboard_caption_option() {
        let texts = Localizer::new("ru").unwrap();
        assert_eq!(preview_keyboard(true, &texts).labels().len(), 3);
        assert_eq!(preview_keyboard(false, &texts).labels().len(), 2);
    }
}
