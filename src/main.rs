use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use menubot::bot::{event_from_callback, event_from_message, handle_event, BotContext, TelegramMessenger};
use menubot::config::BotConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging; `log` records from the store layer are captured too
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting menu bot");

    let config = BotConfig::from_env()?;
    let bot = Bot::new(config.token.clone());
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let ctx = Arc::new(BotContext::new(config, messenger)?);

    info!(
        data_file = %ctx.config.data_file.display(),
        locale = %ctx.texts.locale(),
        "Bot initialized, starting dispatcher"
    );

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let ctx = Arc::clone(&ctx);
            move |msg: Message| {
                let ctx = Arc::clone(&ctx);
                async move {
                    if let Some(event) = event_from_message(&msg) {
                        handle_event(&ctx, event).await;
                    }
                    Ok::<(), anyhow::Error>(())
                }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let ctx = Arc::clone(&ctx);
            move |bot: Bot, q: CallbackQuery| {
                let ctx = Arc::clone(&ctx);
                async move {
                    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
                    }
                    if let Some(event) = event_from_callback(&q) {
                        handle_event(&ctx, event).await;
                    }
                    Ok::<(), anyhow::Error>(())
                }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
