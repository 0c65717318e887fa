use std::sync::Arc;

use anyhow::Context;

use adpost::bot::{Bot, Dispatcher};
use adpost::channels::{Channel, ChannelManager, CliChannel, TelegramChannel};
use adpost::config::BotConfig;
use adpost::store::{InMemorySessionStore, LibSqlAdStore};
use adpost::wizard::{Validators, Wizard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    eprintln!("📋 adpost v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────────────
    let ads = LibSqlAdStore::new_local(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;
    eprintln!("   Database: {}", config.db_path.display());

    // ── Sessions ─────────────────────────────────────────────────────────
    let sessions = InMemorySessionStore::new();
    eprintln!("   Session TTL: {}s", config.session_ttl.as_secs());
    eprintln!(
        "   Phone region: {}",
        config
            .default_region
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "none (international only)".to_string())
    );

    // ── Channels ─────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();

    if let Some(token) = config.telegram_token.clone() {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if config.allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else {
                config.allowed_users.join(", ")
            }
        );
        let telegram = TelegramChannel::new(token, config.allowed_users.clone());
        if let Err(e) = telegram.health_check().await {
            tracing::warn!("Telegram health check failed: {e}");
        }
        channels.add(Arc::new(telegram));
    }

    if config.cli_enabled {
        channels.add(Arc::new(CliChannel::new()));
    }

    eprintln!("   Channels: {}\n", channels.names().join(", "));

    // ── Bot ──────────────────────────────────────────────────────────────
    let wizard = Wizard::new(Validators::new(config.default_region));
    let bot = Bot::new(wizard, sessions, Arc::new(ads));

    Dispatcher::new(bot, channels, config.session_ttl)
        .run()
        .await?;

    Ok(())
}
