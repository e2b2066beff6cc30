use std::{sync::Arc, time::Duration};

use teloxide::{dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use modbot_core::{
    config::Config, domain::ChatId, pipeline::ModerationPipeline, ports::ChatPlatform,
    sync::KeyedLocks,
};

use crate::handlers;
use crate::TelegramPlatform;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ModerationPipeline>,
    pub chat_locks: Arc<KeyedLocks<ChatId>>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!(username = %me.username(), "modbot started");
    }
    tracing::info!(
        banned_words = cfg.banned_words.len(),
        granted_ttl_secs = cfg.permission_ttl_granted.as_secs(),
        denied_ttl_secs = cfg.permission_ttl_denied.as_secs(),
        "moderation config loaded"
    );

    let platform: Arc<dyn ChatPlatform> = Arc::new(TelegramPlatform::new(bot.clone()));
    let pipeline = Arc::new(ModerationPipeline::from_config(&cfg, platform));

    let state = Arc::new(AppState {
        pipeline,
        chat_locks: Arc::new(KeyedLocks::new()),
    });

    let shutdown = CancellationToken::new();
    let sweeper = cfg
        .cache_sweep_interval
        .map(|every| spawn_cache_sweeper(state.clone(), every, shutdown.clone()));

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_upd| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "error while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    shutdown.cancel();
    if let Some(task) = sweeper {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "cache sweeper ended abnormally");
        }
    }
    tracing::info!("modbot stopped");

    Ok(())
}

/// Periodically reclaim expired permission entries, idle resolver locks and
/// idle per-chat ordering locks.
///
/// Expiry is already enforced on read; this only bounds memory.
pub fn spawn_cache_sweeper(
    state: Arc<AppState>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = ticker.tick() => {
                let (entries, locks) = state.pipeline.resolver().sweep().await;
                let chat_locks = state.chat_locks.prune().await;
                if entries > 0 || locks > 0 || chat_locks > 0 {
                    tracing::debug!(entries, locks, chat_locks, "permission cache swept");
                }
              }
            }
        }
    })
}
