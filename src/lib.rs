//! # Menu Telegram Bot
//!
//! A Telegram bot that serves admin-editable menu content, collects payment
//! receipts with rate limiting, and gives admins a panel to edit buttons,
//! broadcast messages and review receipts.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod event;
pub mod localization;
pub mod markup;
pub mod outbound;
pub mod rate_limit;
pub mod store;
