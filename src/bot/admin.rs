//! Admin conversation engine
//!
//! Every entry point is gated on the configured admin set. States form a
//! tree rooted at [`AdminState::MainMenu`]; cancel returns to the root from
//! anywhere, exit leaves the panel from the top three states.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::dialogue::{validate_button_name, AdminState};
use crate::errors::StoreError;
use crate::event::{InboundEvent, Payload};
use crate::markup::escape;
use crate::outbound::{deliver_content, Keyboard};
use crate::store::{MessageContent, Receipt, ReceiptKind, ReceiptStatus};

use super::ui_builder::{
    admin_main_keyboard, back_cancel_keyboard, button_actions_keyboard, button_list_keyboard,
    cancel_keyboard, format_message_list, format_receipt_list, kind_label, preview_keyboard,
    receipt_action_keyboard,
};
use super::user::is_cancel;
use super::BotContext;

/// Open the admin panel. Entering by command also enables the menu shortcut.
pub async fn enter(ctx: &BotContext, event: &InboundEvent, via_command: bool) -> Result<()> {
    if !ctx.is_admin(event.user_id) {
        return deny(ctx, event).await;
    }
    if via_command {
        ctx.store
            .set_admin_panel_enabled(event.user_id, true, event.received_at)?;
    }
    info!(user_id = %event.user_id, "Admin panel opened");
    show_main_menu(ctx, event).await
}

/// Handle an event from an admin with an active panel conversation
pub async fn handle(ctx: &BotContext, event: &InboundEvent, state: AdminState) -> Result<()> {
    if !ctx.is_admin(event.user_id) {
        return deny(ctx, event).await;
    }
    debug!(user_id = %event.user_id, state = ?state, "Handling admin event");

    if is_cancel(ctx, event) {
        return cancel(ctx, event, &state).await;
    }

    let at_top = matches!(
        state,
        AdminState::MainMenu | AdminState::ChooseButton | AdminState::ChooseAction { .. }
    );
    if at_top && event.text() == Some(ctx.t("btn-exit").as_str()) {
        return exit(ctx, event).await;
    }

    match state {
        AdminState::MainMenu => on_main_menu(ctx, event).await,
        AdminState::ChooseButton => on_choose_button(ctx, event).await,
        AdminState::ChooseAction { button } => on_choose_action(ctx, event, button).await,
        AdminState::NewName { button } => on_new_name(ctx, event, button).await,
        AdminState::CreateButton => on_create_button(ctx, event).await,
        AdminState::AddMessage { button } => on_add_message(ctx, event, button).await,
        AdminState::PreviewMessage { button, draft } => on_preview_message(ctx, event, button, draft).await,
        AdminState::AddCaption { button, draft } => on_add_caption(ctx, event, button, draft).await,
        AdminState::DeleteMessage { button } => on_delete_message(ctx, event, button).await,
        AdminState::ConfirmBroadcast => on_broadcast_content(ctx, event).await,
        AdminState::PreviewBroadcast { draft } => on_preview_broadcast(ctx, event, draft).await,
        AdminState::SelectReceipt { pending } => on_select_receipt(ctx, event, pending).await,
        AdminState::ProcessReceipt { receipt } => on_process_receipt(ctx, event, receipt).await,
    }
}

async fn deny(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    warn!(user_id = %event.user_id, "Admin access denied");
    ctx.say(event.chat_id, &ctx.t("admin-denied"), None).await;
    Ok(())
}

/// Forget the panel conversation entirely
pub async fn leave(ctx: &BotContext, user_id: i64) -> Result<()> {
    let dialogue = ctx.admin_dialogue(user_id);
    if dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }
    Ok(())
}

async fn show_main_menu(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    ctx.admin_dialogue(event.user_id)
        .update(AdminState::MainMenu)
        .await?;
    ctx.say(
        event.chat_id,
        &ctx.t("admin-panel-title"),
        Some(&admin_main_keyboard(&ctx.texts)),
    )
    .await;
    Ok(())
}

async fn show_button_list(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let buttons = ctx.store.get_buttons()?;
    if buttons.is_empty() {
        ctx.say(event.chat_id, &ctx.t("admin-no-buttons"), Some(&Keyboard::Remove))
            .await;
        return show_main_menu(ctx, event).await;
    }

    ctx.admin_dialogue(event.user_id)
        .update(AdminState::ChooseButton)
        .await?;
    ctx.say(
        event.chat_id,
        &ctx.t("admin-choose-button"),
        Some(&button_list_keyboard(buttons.keys(), &ctx.texts)),
    )
    .await;
    Ok(())
}

/// Recompute the pending list; processed receipts drop out
async fn show_receipts_list(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let pending = ctx.store.pending_receipts()?;
    if pending.is_empty() {
        ctx.say(event.chat_id, &ctx.t("admin-no-receipts"), Some(&Keyboard::Remove))
            .await;
        return show_main_menu(ctx, event).await;
    }

    let listing = format_receipt_list(&pending, &ctx.texts);
    ctx.admin_dialogue(event.user_id)
        .update(AdminState::SelectReceipt { pending })
        .await?;
    ctx.say(event.chat_id, &listing, Some(&back_cancel_keyboard(&ctx.texts)))
        .await;
    Ok(())
}

async fn cancel(ctx: &BotContext, event: &InboundEvent, state: &AdminState) -> Result<()> {
    let notice = match state {
        AdminState::ProcessReceipt { receipt } => {
            let user_id = receipt.user_id.to_string();
            ctx.t_args(
                "admin-receipt-review-cancelled",
                &[("user_id", user_id.as_str()), ("kind", receipt.kind.as_str())],
            )
        }
        _ => ctx.t("admin-cancelled"),
    };
    debug!(user_id = %event.user_id, state = ?state, "Admin flow cancelled");
    ctx.say(event.chat_id, &notice, Some(&Keyboard::Remove)).await;
    show_main_menu(ctx, event).await
}

async fn exit(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    leave(ctx, event.user_id).await?;
    info!(user_id = %event.user_id, "Admin panel closed");
    let menu = ctx.main_menu(event.user_id)?;
    ctx.say(event.chat_id, &ctx.t("admin-exited"), Some(&menu)).await;
    Ok(())
}

async fn on_main_menu(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let dialogue = ctx.admin_dialogue(event.user_id);
    let text = event.text().unwrap_or_default();

    if text == ctx.t("admin-btn-edit") {
        show_button_list(ctx, event).await
    } else if text == ctx.t("admin-btn-create") {
        dialogue.update(AdminState::CreateButton).await?;
        ctx.say(
            event.chat_id,
            &ctx.t("admin-create-prompt"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    } else if text == ctx.t("admin-btn-broadcast") {
        dialogue.update(AdminState::ConfirmBroadcast).await?;
        ctx.say(
            event.chat_id,
            &ctx.t("admin-broadcast-prompt"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    } else if text == ctx.t("admin-btn-receipts") {
        show_receipts_list(ctx, event).await
    } else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-choose-from-menu"),
            Some(&admin_main_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    }
}

async fn on_choose_button(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let Some(text) = event.text() else {
        ctx.say(event.chat_id, &ctx.t("admin-button-missing"), None).await;
        return show_button_list(ctx, event).await;
    };

    if text == ctx.t("btn-back") {
        return show_main_menu(ctx, event).await;
    }

    match ctx.store.get_button(text)? {
        Some(button) => {
            let name = escape(text);
            let status = if button.active {
                ctx.t("admin-status-enabled")
            } else {
                ctx.t("admin-status-disabled")
            };
            let count = button.messages.len().to_string();
            let prompt = ctx.t_args(
                "admin-button-selected",
                &[
                    ("name", name.as_str()),
                    ("status", status.as_str()),
                    ("count", count.as_str()),
                ],
            );
            ctx.admin_dialogue(event.user_id)
                .update(AdminState::ChooseAction {
                    button: text.to_string(),
                })
                .await?;
            ctx.say(
                event.chat_id,
                &prompt,
                Some(&button_actions_keyboard(button.active, &ctx.texts)),
            )
            .await;
            Ok(())
        }
        None => {
            ctx.say(event.chat_id, &ctx.t("admin-button-missing"), Some(&Keyboard::Remove))
                .await;
            show_button_list(ctx, event).await
        }
    }
}

async fn button_gone(ctx: &BotContext, event: &InboundEvent, button: &str) -> Result<()> {
    warn!(user_id = %event.user_id, button = %button, "Selected button no longer exists");
    ctx.say(event.chat_id, &ctx.t("admin-button-gone"), Some(&Keyboard::Remove))
        .await;
    show_button_list(ctx, event).await
}

async fn on_choose_action(ctx: &BotContext, event: &InboundEvent, button: String) -> Result<()> {
    let dialogue = ctx.admin_dialogue(event.user_id);
    let Some(current) = ctx.store.get_button(&button)? else {
        return button_gone(ctx, event, &button).await;
    };
    let text = event.text().unwrap_or_default();

    if text == ctx.t("btn-back") {
        show_button_list(ctx, event).await
    } else if text == ctx.t("admin-action-rename") {
        dialogue.update(AdminState::NewName { button }).await?;
        ctx.say(
            event.chat_id,
            &ctx.t("admin-rename-prompt"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    } else if text == ctx.t("admin-action-add") {
        dialogue.update(AdminState::AddMessage { button }).await?;
        ctx.say(
            event.chat_id,
            &ctx.t("admin-add-message-prompt"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    } else if text == ctx.t("admin-action-delete") {
        if current.messages.is_empty() {
            let name = escape(&button);
            ctx.say(
                event.chat_id,
                &ctx.t_args("admin-no-messages", &[("name", name.as_str())]),
                Some(&Keyboard::Remove),
            )
            .await;
            return show_button_list(ctx, event).await;
        }
        let listing = format_message_list(&button, &current.messages, &ctx.texts);
        dialogue.update(AdminState::DeleteMessage { button }).await?;
        ctx.say(event.chat_id, &listing, Some(&cancel_keyboard(&ctx.texts)))
            .await;
        Ok(())
    } else if text == ctx.t("admin-action-disable") || text == ctx.t("admin-action-enable") {
        let active = text == ctx.t("admin-action-enable");
        ctx.store.toggle_button(&button, active)?;
        let notice = if active {
            "admin-button-enabled"
        } else {
            "admin-button-disabled"
        };
        ctx.say(event.chat_id, &ctx.t(notice), Some(&Keyboard::Remove))
            .await;
        show_button_list(ctx, event).await
    } else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-choose-action"),
            Some(&button_actions_keyboard(current.active, &ctx.texts)),
        )
        .await;
        Ok(())
    }
}

async fn on_new_name(ctx: &BotContext, event: &InboundEvent, button: String) -> Result<()> {
    let Ok(new_name) = validate_button_name(event.text().unwrap_or_default()) else {
        ctx.say(event.chat_id, &ctx.t("admin-name-invalid"), None).await;
        return Ok(());
    };

    match ctx.store.rename_button(&button, &new_name) {
        Ok(()) => {
            info!(user_id = %event.user_id, from = %button, to = %new_name, "Button renamed");
            let name = escape(&new_name);
            ctx.say(
                event.chat_id,
                &ctx.t_args("admin-renamed", &[("name", name.as_str())]),
                Some(&Keyboard::Remove),
            )
            .await;
            show_button_list(ctx, event).await
        }
        Err(StoreError::ButtonExists(_)) => {
            ctx.say(event.chat_id, &ctx.t("admin-name-taken"), None).await;
            Ok(())
        }
        Err(StoreError::ButtonNotFound(_)) => button_gone(ctx, event, &button).await,
        Err(e) => Err(e.into()),
    }
}

async fn on_create_button(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let Ok(name) = validate_button_name(event.text().unwrap_or_default()) else {
        ctx.say(event.chat_id, &ctx.t("admin-name-invalid"), None).await;
        return Ok(());
    };

    match ctx.store.create_button(&name) {
        Ok(()) => {
            info!(user_id = %event.user_id, button = %name, "Button created");
            let escaped = escape(&name);
            let prompt = format!(
                "{}\n{}",
                ctx.t_args("admin-created", &[("name", escaped.as_str())]),
                ctx.t("admin-add-message-prompt")
            );
            ctx.admin_dialogue(event.user_id)
                .update(AdminState::AddMessage { button: name })
                .await?;
            ctx.say(event.chat_id, &prompt, Some(&cancel_keyboard(&ctx.texts)))
                .await;
            Ok(())
        }
        Err(StoreError::ButtonExists(_)) => {
            ctx.say(event.chat_id, &ctx.t("admin-name-taken"), None).await;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Echo a draft back to the admin. Returns `false` after aborting to the root.
async fn preview_draft(ctx: &BotContext, event: &InboundEvent, draft: &MessageContent) -> Result<bool> {
    if let Err(e) = deliver_content(ctx.messenger.as_ref(), event.chat_id, draft, None).await {
        warn!(user_id = %event.user_id, kind = draft.kind(), error = %e, "Failed to show preview");
        ctx.say(event.chat_id, &ctx.t("admin-preview-failed"), Some(&Keyboard::Remove))
            .await;
        show_main_menu(ctx, event).await?;
        return Ok(false);
    }
    Ok(true)
}

async fn show_message_preview(ctx: &BotContext, event: &InboundEvent, button: String, draft: MessageContent) -> Result<()> {
    if !preview_draft(ctx, event, &draft).await? {
        return Ok(());
    }
    let keyboard = preview_keyboard(draft.is_media(), &ctx.texts);
    ctx.admin_dialogue(event.user_id)
        .update(AdminState::PreviewMessage { button, draft })
        .await?;
    ctx.say(event.chat_id, &ctx.t("admin-preview-question"), Some(&keyboard))
        .await;
    Ok(())
}

async fn on_add_message(ctx: &BotContext, event: &InboundEvent, button: String) -> Result<()> {
    match event.payload.to_content() {
        Some(draft) => show_message_preview(ctx, event, button, draft).await,
        None => {
            ctx.say(
                event.chat_id,
                &ctx.t("admin-invalid-message-type"),
                Some(&cancel_keyboard(&ctx.texts)),
            )
            .await;
            Ok(())
        }
    }
}

async fn on_preview_message(ctx: &BotContext, event: &InboundEvent, button: String, draft: MessageContent) -> Result<()> {
    let text = event.text().unwrap_or_default();

    if text == ctx.t("btn-confirm") {
        let kind = kind_label(draft.kind(), &ctx.texts);
        let notice = match &draft {
            MessageContent::Text { .. } => ctx.t("admin-text-added"),
            media if media.caption().is_some() => {
                ctx.t_args("admin-media-added-with-caption", &[("kind", kind.as_str())])
            }
            _ => ctx.t_args("admin-media-added-without-caption", &[("kind", kind.as_str())]),
        };
        match ctx.store.add_message_to_button(&button, draft) {
            Ok(()) => {
                info!(user_id = %event.user_id, button = %button, "Message added to button");
                ctx.say(event.chat_id, &notice, Some(&Keyboard::Remove)).await;
                show_button_list(ctx, event).await
            }
            Err(StoreError::ButtonNotFound(_)) => button_gone(ctx, event, &button).await,
            Err(e) => Err(e.into()),
        }
    } else if text == ctx.t("btn-add-caption") {
        if !draft.is_media() {
            ctx.say(
                event.chat_id,
                &ctx.t("admin-caption-not-supported"),
                Some(&preview_keyboard(false, &ctx.texts)),
            )
            .await;
            return Ok(());
        }
        ctx.admin_dialogue(event.user_id)
            .update(AdminState::AddCaption { button, draft })
            .await?;
        ctx.say(
            event.chat_id,
            &ctx.t("admin-caption-prompt"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        Ok(())
    } else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-preview-use-buttons"),
            Some(&preview_keyboard(draft.is_media(), &ctx.texts)),
        )
        .await;
        Ok(())
    }
}

async fn on_add_caption(ctx: &BotContext, event: &InboundEvent, button: String, draft: MessageContent) -> Result<()> {
    let caption = match &event.payload {
        Payload::Text(rich) => rich.to_markup(),
        _ => String::new(),
    };
    if caption.is_empty() {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-caption-text-only"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    }
    show_message_preview(ctx, event, button, draft.with_caption(Some(caption))).await
}

async fn on_delete_message(ctx: &BotContext, event: &InboundEvent, button: String) -> Result<()> {
    let Some(position) = event.text().and_then(|text| text.parse::<usize>().ok()) else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-enter-number"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    };

    let invalid = || ctx.t("admin-invalid-message-number");
    if position == 0 {
        ctx.say(event.chat_id, &invalid(), Some(&cancel_keyboard(&ctx.texts)))
            .await;
        return Ok(());
    }

    match ctx.store.remove_message_from_button(&button, position - 1) {
        Ok(removed) => {
            info!(
                user_id = %event.user_id,
                button = %button,
                position,
                kind = removed.kind(),
                "Message removed from button"
            );
            let name = escape(&button);
            ctx.say(
                event.chat_id,
                &ctx.t_args("admin-message-deleted", &[("name", name.as_str())]),
                Some(&Keyboard::Remove),
            )
            .await;
            show_button_list(ctx, event).await
        }
        Err(StoreError::IndexOutOfRange { .. }) => {
            ctx.say(event.chat_id, &invalid(), Some(&cancel_keyboard(&ctx.texts)))
                .await;
            Ok(())
        }
        Err(StoreError::ButtonNotFound(_)) => button_gone(ctx, event, &button).await,
        Err(e) => Err(e.into()),
    }
}

async fn on_broadcast_content(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let Some(draft) = event.payload.to_content() else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-invalid-message-type"),
            Some(&cancel_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    };

    if !preview_draft(ctx, event, &draft).await? {
        return Ok(());
    }
    ctx.admin_dialogue(event.user_id)
        .update(AdminState::PreviewBroadcast { draft })
        .await?;
    ctx.say(
        event.chat_id,
        &ctx.t("admin-broadcast-preview-question"),
        Some(&preview_keyboard(false, &ctx.texts)),
    )
    .await;
    Ok(())
}

async fn on_preview_broadcast(ctx: &BotContext, event: &InboundEvent, draft: MessageContent) -> Result<()> {
    if event.text() != Some(ctx.t("btn-confirm").as_str()) {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-preview-use-buttons"),
            Some(&preview_keyboard(false, &ctx.texts)),
        )
        .await;
        return Ok(());
    }

    let delivered = broadcast(ctx, &draft).await?;
    let count = delivered.to_string();
    ctx.say(
        event.chat_id,
        &ctx.t_args("admin-broadcast-done", &[("count", count.as_str())]),
        Some(&Keyboard::Remove),
    )
    .await;
    show_main_menu(ctx, event).await
}

/// Deliver `content` to every known user; returns how many received it in full
pub async fn broadcast(ctx: &BotContext, content: &MessageContent) -> Result<usize> {
    let users = ctx.store.get_users()?;
    let mut delivered = 0;

    for user_id in users.keys() {
        match deliver_content(ctx.messenger.as_ref(), *user_id, content, None).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(user_id = %user_id, error = %e, "Broadcast delivery failed"),
        }
    }

    info!(recipients = users.len(), delivered, kind = content.kind(), "Broadcast finished");
    Ok(delivered)
}

async fn on_select_receipt(ctx: &BotContext, event: &InboundEvent, pending: Vec<Receipt>) -> Result<()> {
    let text = event.text().unwrap_or_default();
    if text == ctx.t("btn-back") {
        return show_main_menu(ctx, event).await;
    }

    let Ok(position) = text.parse::<usize>() else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-enter-number"),
            Some(&back_cancel_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    };

    let Some(receipt) = position.checked_sub(1).and_then(|i| pending.get(i)).cloned() else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-invalid-receipt-number"),
            Some(&back_cancel_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    };

    let user_id = receipt.user_id.to_string();
    ctx.say(
        event.chat_id,
        &ctx.t_args(
            "admin-receipt-details",
            &[("user_id", user_id.as_str()), ("kind", receipt.kind.as_str())],
        ),
        None,
    )
    .await;

    let shown = match receipt.kind {
        ReceiptKind::Photo => {
            ctx.messenger
                .send_photo(event.chat_id, &receipt.file_id, None, None)
                .await
        }
        ReceiptKind::Document => {
            ctx.messenger
                .send_document(event.chat_id, &receipt.file_id, None)
                .await
        }
    };
    if let Err(e) = shown {
        warn!(user_id = %event.user_id, error = %e, "Failed to show receipt file");
        ctx.say(event.chat_id, &ctx.t("admin-receipt-file-failed"), None)
            .await;
    }

    ctx.admin_dialogue(event.user_id)
        .update(AdminState::ProcessReceipt { receipt })
        .await?;
    ctx.say(
        event.chat_id,
        &ctx.t("admin-receipt-action-prompt"),
        Some(&receipt_action_keyboard(&ctx.texts)),
    )
    .await;
    Ok(())
}

async fn on_process_receipt(ctx: &BotContext, event: &InboundEvent, receipt: Receipt) -> Result<()> {
    let text = event.text().unwrap_or_default();

    let status = if text == ctx.t("admin-btn-approve") {
        ReceiptStatus::Approved
    } else if text == ctx.t("admin-btn-reject") {
        ReceiptStatus::Rejected
    } else if text == ctx.t("btn-back") {
        return show_receipts_list(ctx, event).await;
    } else {
        ctx.say(
            event.chat_id,
            &ctx.t("admin-receipt-action-prompt"),
            Some(&receipt_action_keyboard(&ctx.texts)),
        )
        .await;
        return Ok(());
    };

    let updated = ctx
        .store
        .update_receipt_status(receipt.user_id, &receipt.file_id, status)?;
    if !updated {
        ctx.say(event.chat_id, &ctx.t("admin-receipt-already-processed"), None)
            .await;
        return show_receipts_list(ctx, event).await;
    }

    info!(
        user_id = %event.user_id,
        submitter = %receipt.user_id,
        status = ?status,
        "Receipt decided"
    );
    let (admin_key, user_key) = match status {
        ReceiptStatus::Approved => ("admin-receipt-approved", "receipt-approved-notice"),
        _ => ("admin-receipt-rejected", "receipt-rejected-notice"),
    };
    let submitter = receipt.user_id.to_string();
    ctx.say(
        event.chat_id,
        &ctx.t_args(admin_key, &[("user_id", submitter.as_str())]),
        None,
    )
    .await;

    if let Err(e) = ctx
        .messenger
        .send_text(receipt.user_id, &ctx.t(user_key), None)
        .await
    {
        warn!(user_id = %receipt.user_id, error = %e, "Failed to notify receipt submitter");
    }

    show_receipts_list(ctx, event).await
}
