//! Bot module wiring the conversation engines to a messenger
//!
//! This module is split into several submodules:
//! - `router`: Classifies each inbound event and hands it to one engine
//! - `user`: Main menu, button playback and receipt submission
//! - `admin`: The admin panel state machine
//! - `ui_builder`: Creates keyboards and formats listings
//! - `telegram`: Converts Telegram updates into events and delivers replies

pub mod admin;
pub mod router;
pub mod telegram;
pub mod ui_builder;
pub mod user;

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;
use tracing::warn;

use crate::config::{is_admin, BotConfig, MenuLayout};
use crate::dialogue::{AdminDialogue, AdminState, UserDialogue, UserState};
use crate::localization::Localizer;
use crate::outbound::{Keyboard, Messenger};
use crate::rate_limit::ReceiptRateLimiter;
use crate::store::ContentStore;

pub use router::handle_event;
pub use telegram::{event_from_callback, event_from_message, TelegramMessenger};

/// Callback data of the inline "submit receipt" action
pub const SEND_RECEIPT_CALLBACK: &str = "send_receipt";

/// Everything a handler needs: configuration, storage, delivery and per-user state
pub struct BotContext {
    pub config: BotConfig,
    pub store: ContentStore,
    pub messenger: Arc<dyn Messenger>,
    pub texts: Localizer,
    pub rate_limiter: ReceiptRateLimiter,
    user_states: Arc<InMemStorage<UserState>>,
    admin_states: Arc<InMemStorage<AdminState>>,
}

impl BotContext {
    pub fn new(config: BotConfig, messenger: Arc<dyn Messenger>) -> Result<Self> {
        let texts = Localizer::new(&config.locale)?;
        let store = ContentStore::open(config.data_file.clone());
        let rate_limiter = ReceiptRateLimiter::new(config.receipt_limits.clone());
        Ok(Self {
            config,
            store,
            messenger,
            texts,
            rate_limiter,
            user_states: InMemStorage::new(),
            admin_states: InMemStorage::new(),
        })
    }

    pub fn user_dialogue(&self, user_id: i64) -> UserDialogue {
        UserDialogue::new(self.user_states.clone(), ChatId(user_id))
    }

    pub fn admin_dialogue(&self, user_id: i64) -> AdminDialogue {
        AdminDialogue::new(self.admin_states.clone(), ChatId(user_id))
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        is_admin(&self.config.admin_ids, user_id)
    }

    pub fn t(&self, key: &str) -> String {
        self.texts.t(key)
    }

    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.texts.t_args(key, args)
    }

    /// The user-facing main menu, with the admin shortcut for admins who opted in
    pub fn main_menu(&self, user_id: i64) -> Result<Keyboard> {
        let document = self.store.load()?;
        let shows_shortcut = self.is_admin(user_id)
            && document
                .users
                .get(&user_id)
                .is_some_and(|user| user.is_admin_panel_enabled);
        let shortcut = shows_shortcut.then(|| self.t("btn-admin-panel"));
        let layout = MenuLayout::load(&self.config.menu_layout_file);

        Ok(ui_builder::build_main_menu(
            &document.buttons,
            &layout,
            &self.config.enrollment_button,
            shortcut.as_deref(),
        ))
    }

    /// Best-effort text delivery; failures are logged and swallowed
    pub async fn say(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) {
        if let Err(e) = self.messenger.send_text(chat_id, text, keyboard).await {
            warn!(chat_id = chat_id, error = %e, "Failed to deliver message");
        }
    }
}

/// Current wall-clock time as fractional Unix seconds
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Name of a slash command, without the leading slash or a `@botname` suffix
pub fn command_name(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next()?;
    (!name.is_empty()).then_some(name)
}
