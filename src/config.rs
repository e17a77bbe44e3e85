//! # Bot Configuration Module
//!
//! This module defines configuration structures for the bot, including the
//! admin id set, storage locations, receipt rate limits and the optional
//! main-menu layout file.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

// Constants for bot configuration
pub const DEFAULT_DATA_FILE: &str = "data.json";
pub const DEFAULT_MENU_LAYOUT_FILE: &str = "button.json";
pub const DEFAULT_ENROLLMENT_BUTTON: &str = "ВХОД В ОТРЯД СВОБОДЫ🗽";
pub const DEFAULT_LOCALE: &str = "ru";
pub const MAX_RECEIPTS_PER_WINDOW: usize = 3;
pub const RECEIPT_WINDOW_SECS: u64 = 7200; // 2 hours
pub const MAX_BUTTON_NAME_CHARS: usize = 50;

/// Receipt submission rate limits
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLimits {
    /// Submissions allowed inside one window
    pub max_receipts: usize,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for ReceiptLimits {
    fn default() -> Self {
        Self {
            max_receipts: MAX_RECEIPTS_PER_WINDOW,
            window_secs: RECEIPT_WINDOW_SECS,
        }
    }
}

/// Configuration structure for the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Platform bot token
    pub token: String,
    /// Users allowed into the admin panel
    pub admin_ids: HashSet<i64>,
    /// Location of the content document
    pub data_file: PathBuf,
    /// Location of the optional main-menu layout
    pub menu_layout_file: PathBuf,
    /// Button whose playback offers receipt submission
    pub enrollment_button: String,
    /// Locale for every bot text
    pub locale: String,
    /// Receipt rate limiting
    pub receipt_limits: ReceiptLimits,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            admin_ids: HashSet::new(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            menu_layout_file: PathBuf::from(DEFAULT_MENU_LAYOUT_FILE),
            enrollment_button: DEFAULT_ENROLLMENT_BUTTON.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            receipt_limits: ReceiptLimits::default(),
        }
    }
}

impl BotConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let admins = env::var("ADMIN_IDS").context("ADMIN_IDS must be set")?;
        let defaults = Self::default();

        let config = Self {
            token,
            admin_ids: parse_admin_ids(&admins)?,
            data_file: env::var("DATA_FILE").map(PathBuf::from).unwrap_or(defaults.data_file),
            menu_layout_file: env::var("MENU_LAYOUT_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.menu_layout_file),
            enrollment_button: env::var("ENROLLMENT_BUTTON").unwrap_or(defaults.enrollment_button),
            locale: env::var("BOT_LOCALE").unwrap_or(defaults.locale),
            receipt_limits: ReceiptLimits {
                max_receipts: parse_env_or("RECEIPT_MAX", defaults.receipt_limits.max_receipts)?,
                window_secs: parse_env_or("RECEIPT_WINDOW_SECS", defaults.receipt_limits.window_secs)?,
            },
        };
        config.validate()?;
        info!("Loaded configuration with {} admin(s)", config.admin_ids.len());
        Ok(config)
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            bail!("TELEGRAM_BOT_TOKEN must be a non-empty string");
        }
        if self.admin_ids.is_empty() {
            bail!("ADMIN_IDS must list at least one user id");
        }
        if self.receipt_limits.max_receipts == 0 || self.receipt_limits.window_secs == 0 {
            bail!("Receipt limits must be positive");
        }
        Ok(())
    }
}

/// Parse a comma-separated list of user ids
pub fn parse_admin_ids(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .with_context(|| format!("ADMIN_IDS must be a list of integers, got '{part}'"))
        })
        .collect()
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Whether `user_id` belongs to the configured admin set
pub fn is_admin(admin_ids: &HashSet<i64>, user_id: i64) -> bool {
    admin_ids.contains(&user_id)
}

/// Externally maintained main-menu layout: rows of button names
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MenuLayout {
    #[serde(default)]
    pub menu: Vec<Vec<String>>,
}

impl MenuLayout {
    /// Load the layout file; absence or a broken file means "no layout"
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Error loading menu layout {}: {}", path.display(), e);
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Error parsing menu layout {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.menu.iter().all(|row| row.is_empty())
    }
}
