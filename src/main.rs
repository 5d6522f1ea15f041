use dotenvy::dotenv;
use keep2download::bot::{setup_handler, TelegramClient, TelegramDispatcher};
use keep2download::config::Settings;
use keep2download::logging::{init_logging, RedactionPatterns};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Redaction must exist before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting Keep2Download bot...");

    let settings = init_settings();
    settings.ensure_directories_exist()?;

    let bot = Bot::new(settings.telegram_token.clone());
    match bot.get_me().await {
        Ok(me) => info!("Bot logged in as: @{}", me.username()),
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            std::process::exit(1);
        }
    }

    let relay = Arc::new(TelegramDispatcher::new(
        Arc::new(TelegramClient::new(bot.clone())),
        settings.transient_dir(),
        settings.debounce(),
    ));
    info!(
        debounce_ms = settings.album_debounce_ms,
        temp_dir = %settings.transient_dir().display(),
        "Start listening for updates..."
    );

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![settings, relay.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    relay.shutdown().await;
    info!("Stopped.");
    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
