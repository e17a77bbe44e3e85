use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use log::warn;
use unic_langid::LanguageIdentifier;

use crate::config::DEFAULT_LOCALE;

const RU_RESOURCE: &str = include_str!("../locales/ru/main.ftl");
const EN_RESOURCE: &str = include_str!("../locales/en/main.ftl");

fn resource_for(locale: &str) -> Option<&'static str> {
    match locale {
        "ru" => Some(RU_RESOURCE),
        "en" => Some(EN_RESOURCE),
        _ => None,
    }
}

/// Localization manager for every text and keyboard label the bot shows
pub struct Localizer {
    locale: String,
    bundle: FluentBundle<FluentResource>,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer").field("locale", &self.locale).finish()
    }
}

impl Localizer {
    /// Create a localizer; unknown locales fall back to the default one
    pub fn new(locale: &str) -> Result<Self> {
        let (locale, source) = match resource_for(locale) {
            Some(source) => (locale, source),
            None => {
                warn!("Unsupported locale '{}', falling back to '{}'", locale, DEFAULT_LOCALE);
                (DEFAULT_LOCALE, RU_RESOURCE)
            }
        };

        let langid: LanguageIdentifier = locale.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Labels are compared byte-for-byte with inbound text
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for '{locale}': {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for '{locale}': {errors:?}"))?;

        Ok(Self {
            locale: locale.to_string(),
            bundle,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn format(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let Some(msg) = self.bundle.get_message(key) else {
            return format!("Missing translation: {key}");
        };
        let Some(pattern) = msg.value() else {
            return format!("Missing value for key: {key}");
        };

        let mut errors = vec![];
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!("Formatting '{}' reported errors: {:?}", key, errors);
        }
        value.into_owned()
    }

    /// Get a localized message
    pub fn t(&self, key: &str) -> String {
        self.format(key, None)
    }

    /// Get a localized message with simple string arguments
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.format(key, Some(&fluent_args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_messages() {
        let texts = Localizer::new("ru").unwrap();
        assert_eq!(texts.t("btn-cancel"), "❌ Отменить");
        assert_eq!(texts.t("admin-denied"), "Нет доступа.");
    }

    #[test]
    fn test_arguments_are_not_isolated() {
        let texts = Localizer::new("ru").unwrap();
        let msg = texts.t_args("admin-broadcast-done", &[("count", "4")]);
        assert_eq!(msg, "✅ Рассылка завершена. Отправлено: 4 сообщений.");
    }

    #[test]
    fn test_multiline_message() {
        let texts = Localizer::new("ru").unwrap();
        assert_eq!(texts.t("admin-panel-title"), "👑 <b>Админ-панель</b>\nВыбери действие:");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let texts = Localizer::new("xx").unwrap();
        assert_eq!(texts.locale(), "ru");
    }

    #[test]
    fn test_missing_key() {
        let texts = Localizer::new("en").unwrap();
        assert_eq!(texts.t("no-such-key"), "Missing translation: no-such-key");
        assert_eq!(texts.t("btn-cancel"), "❌ Cancel");
    }
}
