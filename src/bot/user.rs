//! User conversation engine: menu playback and receipt submission

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::dialogue::UserState;
use crate::event::{InboundEvent, Payload};
use crate::outbound::{deliver_content, sanitized};
use crate::rate_limit::RateDecision;
use crate::store::{Button, ReceiptKind};

use super::ui_builder::{cancel_keyboard, enrollment_keyboard};
use super::{command_name, BotContext, SEND_RECEIPT_CALLBACK};

/// Whether the event asks to abandon the current flow
pub fn is_cancel(ctx: &BotContext, event: &InboundEvent) -> bool {
    event
        .text()
        .is_some_and(|text| text == ctx.t("btn-cancel") || command_name(text) == Some("cancel"))
}

/// Record the user on first contact; later calls are no-ops
fn register(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    if ctx.store.add_user(event.user_id, event.received_at)? {
        info!(user_id = %event.user_id, "New user registered");
    }
    Ok(())
}

/// `/start`: forget any conversation, register the user and greet them
pub async fn start(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    ctx.user_dialogue(event.user_id).update(UserState::Idle).await?;
    register(ctx, event)?;
    let menu = ctx.main_menu(event.user_id)?;
    ctx.say(event.chat_id, &ctx.t("user-greeting"), Some(&menu)).await;
    Ok(())
}

/// Handle an event that no admin flow claimed
pub async fn handle(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    register(ctx, event)?;
    let dialogue = ctx.user_dialogue(event.user_id);
    let state = dialogue.get_or_default().await?;
    debug!(user_id = %event.user_id, state = ?state, "Handling user event");

    if state != UserState::Idle && is_cancel(ctx, event) {
        dialogue.update(UserState::Idle).await?;
        let menu = ctx.main_menu(event.user_id)?;
        ctx.say(event.chat_id, &ctx.t("user-cancelled"), Some(&menu)).await;
        return Ok(());
    }

    if let Some(text) = event.text() {
        if let Some(button) = ctx.store.get_button(text)? {
            return handle_button(ctx, event, text, button).await;
        }
    }

    if state == UserState::AwaitingReceipt {
        if let Some((file_id, kind)) = event.payload.receipt_file() {
            return handle_receipt(ctx, event, file_id, kind).await;
        }
    }

    let menu = ctx.main_menu(event.user_id)?;
    ctx.say(event.chat_id, &ctx.t("user-unknown-command"), Some(&menu))
        .await;
    Ok(())
}

/// Play back a button's messages in order
async fn handle_button(ctx: &BotContext, event: &InboundEvent, name: &str, button: Button) -> Result<()> {
    let dialogue = ctx.user_dialogue(event.user_id);

    if !button.active || button.messages.is_empty() {
        let notice = if button.active {
            "user-button-empty"
        } else {
            "user-button-unavailable"
        };
        dialogue.update(UserState::Idle).await?;
        let menu = ctx.main_menu(event.user_id)?;
        ctx.say(event.chat_id, &ctx.t(notice), Some(&menu)).await;
        return Ok(());
    }

    let is_enrollment = name == ctx.config.enrollment_button;
    let inline = is_enrollment.then(|| enrollment_keyboard(&ctx.texts));
    let last = button.messages.len() - 1;

    for (i, message) in button.messages.iter().enumerate() {
        let keyboard = if i == last { inline.as_ref() } else { None };
        let content = sanitized(message);
        if let Err(e) = deliver_content(ctx.messenger.as_ref(), event.chat_id, &content, keyboard).await {
            warn!(
                user_id = %event.user_id,
                button = %name,
                position = i,
                error = %e,
                "Failed to play back button message"
            );
            ctx.say(event.chat_id, &ctx.t("user-playback-failed"), None).await;
        }
    }

    if is_enrollment {
        dialogue.update(UserState::AwaitingReceipt).await?;
    } else {
        dialogue.update(UserState::Idle).await?;
        let menu = ctx.main_menu(event.user_id)?;
        ctx.say(event.chat_id, &ctx.t("user-choose-action"), Some(&menu))
            .await;
    }
    Ok(())
}

/// Inline callback queries
pub async fn handle_callback(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    let Payload::Callback { data, message_id } = &event.payload else {
        return Ok(());
    };

    if data != SEND_RECEIPT_CALLBACK {
        debug!(user_id = %event.user_id, data = %data, "Ignoring unknown callback");
        return Ok(());
    }
    register(ctx, event)?;

    if let Some(message_id) = message_id {
        if let Err(e) = ctx
            .messenger
            .remove_inline_keyboard(event.chat_id, *message_id)
            .await
        {
            warn!(user_id = %event.user_id, error = %e, "Failed to remove inline keyboard");
        }
    }

    ctx.user_dialogue(event.user_id)
        .update(UserState::AwaitingReceipt)
        .await?;
    ctx.say(
        event.chat_id,
        &ctx.t("user-receipt-prompt"),
        Some(&cancel_keyboard(&ctx.texts)),
    )
    .await;
    Ok(())
}

/// Rate-limit, store and forward a receipt
async fn handle_receipt(ctx: &BotContext, event: &InboundEvent, file_id: &str, kind: ReceiptKind) -> Result<()> {
    let dialogue = ctx.user_dialogue(event.user_id);
    let now = event.received_at;
    let history = ctx
        .store
        .prune_receipt_history(event.user_id, now, ctx.rate_limiter.window_secs())?;

    if let RateDecision::Limited { wait_minutes } = ctx.rate_limiter.check(&history, now) {
        info!(user_id = %event.user_id, wait_minutes, "Receipt rejected by rate limit");
        let limits = ctx.rate_limiter.limits();
        let max = limits.max_receipts.to_string();
        let hours = limits.window_secs.div_ceil(3600).to_string();
        let minutes = wait_minutes.to_string();
        let notice = ctx.t_args(
            "user-receipt-limit",
            &[
                ("max", max.as_str()),
                ("hours", hours.as_str()),
                ("minutes", minutes.as_str()),
            ],
        );
        dialogue.update(UserState::Idle).await?;
        let menu = ctx.main_menu(event.user_id)?;
        ctx.say(event.chat_id, &notice, Some(&menu)).await;
        return Ok(());
    }

    ctx.store.add_receipt(event.user_id, file_id, kind, now)?;
    ctx.store.add_receipt_history(event.user_id, now)?;
    info!(user_id = %event.user_id, kind = kind.as_str(), "Receipt submitted");

    let user_id = event.user_id.to_string();
    let notice = ctx.t_args(
        "admin-new-receipt",
        &[("user_id", user_id.as_str()), ("kind", kind.as_str())],
    );
    let mut admins: Vec<i64> = ctx.config.admin_ids.iter().copied().collect();
    admins.sort_unstable();

    for admin_id in admins {
        let forwarded = match ctx.messenger.send_text(admin_id, &notice, None).await {
            Ok(()) => match kind {
                ReceiptKind::Photo => ctx.messenger.send_photo(admin_id, file_id, None, None).await,
                ReceiptKind::Document => ctx.messenger.send_document(admin_id, file_id, None).await,
            },
            Err(e) => Err(e),
        };
        if let Err(e) = forwarded {
            warn!(admin_id = admin_id, error = %e, "Failed to forward receipt to admin");
        }
    }

    dialogue.update(UserState::Idle).await?;
    let menu = ctx.main_menu(event.user_id)?;
    ctx.say(event.chat_id, &ctx.t("user-receipt-sent"), Some(&menu))
        .await;
    Ok(())
}
