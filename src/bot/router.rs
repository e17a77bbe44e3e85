//! Routes each inbound event to exactly one engine
//!
//! Order: callback queries, `/start`, admin entry points, an active admin
//! conversation, and finally the user engine. Handler errors stop here: they
//! are logged, the engine's state is reset and a generic notice is sent.

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::dialogue::{AdminState, UserState};
use crate::event::{InboundEvent, Payload};

use super::ui_builder::admin_main_keyboard;
use super::{admin, command_name, user, BotContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    User,
    Admin,
}

/// Handle one inbound event end to end. Never fails.
pub async fn handle_event(ctx: &BotContext, event: InboundEvent) {
    let (engine, outcome) = dispatch(ctx, &event).await;
    if let Err(e) = outcome {
        error!(user_id = %event.user_id, engine = ?engine, error = %e, "Handler failed, resetting conversation");
        recover(ctx, &event, engine).await;
    }
}

async fn dispatch(ctx: &BotContext, event: &InboundEvent) -> (Engine, Result<()>) {
    if matches!(event.payload, Payload::Callback { .. }) {
        return (Engine::User, user::handle_callback(ctx, event).await);
    }

    if let Some(text) = event.text() {
        match command_name(text) {
            Some("start") => return (Engine::User, start(ctx, event).await),
            Some("admin" | "Admin") => return (Engine::Admin, admin::enter(ctx, event, true).await),
            _ => {}
        }
        if text == ctx.t("btn-admin-panel") {
            return (Engine::Admin, admin::enter(ctx, event, false).await);
        }
    }

    match ctx.admin_dialogue(event.user_id).get().await {
        Ok(Some(state)) => (Engine::Admin, admin::handle(ctx, event, state).await),
        Ok(None) => (Engine::User, user::handle(ctx, event).await),
        Err(e) => (Engine::Admin, Err(e.into())),
    }
}

/// `/start` resets both engines before greeting
async fn start(ctx: &BotContext, event: &InboundEvent) -> Result<()> {
    debug!(user_id = %event.user_id, "Start command");
    admin::leave(ctx, event.user_id).await?;
    user::start(ctx, event).await
}

async fn recover(ctx: &BotContext, event: &InboundEvent, engine: Engine) {
    match engine {
        Engine::User => {
            if let Err(e) = ctx.user_dialogue(event.user_id).update(UserState::Idle).await {
                warn!(user_id = %event.user_id, error = %e, "Failed to reset user state");
            }
            ctx.say(event.chat_id, &ctx.t("user-error"), None).await;
        }
        Engine::Admin => {
            if ctx.is_admin(event.user_id) {
                if let Err(e) = ctx.admin_dialogue(event.user_id).update(AdminState::MainMenu).await {
                    warn!(user_id = %event.user_id, error = %e, "Failed to reset admin state");
                }
                ctx.say(
                    event.chat_id,
                    &ctx.t("admin-error"),
                    Some(&admin_main_keyboard(&ctx.texts)),
                )
                .await;
            } else {
                ctx.say(event.chat_id, &ctx.t("user-error"), None).await;
            }
        }
    }
}
