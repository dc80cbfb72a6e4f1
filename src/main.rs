// Logkeeper - Rust Edition
// A per-guild configurable Discord server logging bot

mod commands;
mod features;
mod models;
mod store;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

use crate::features::message_cache::MessageTracker;
use crate::store::ConfigStore;
use crate::utils::config::{Settings, DEFAULT_PREFIX};

/// User data shared across all commands and event handlers
pub struct Data {
    pub store: Arc<ConfigStore>,
    pub messages: MessageTracker,
    pub backup_dir: PathBuf,
    pub log_dir: PathBuf,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Per-guild prefix, `!` in DMs
async fn dynamic_prefix(ctx: poise::PartialContext<'_, Data, Error>) -> Result<Option<String>, Error> {
    let prefix = match ctx.guild_id {
        Some(guild_id) => ctx.data.store.get_config(guild_id).await.prefix,
        None => DEFAULT_PREFIX.to_string(),
    };
    Ok(Some(prefix))
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            commands::log_invocation(ctx, false);
            error!("Command {} failed: {:?}", ctx.command().qualified_name, error);
            let _ = ctx
                .say("❌ An error occurred while processing the command.")
                .await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            commands::log_invocation(ctx, false);
            let _ = ctx
                .say("❌ You don't have permission to use this command.")
                .await;
        }
        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
            commands::log_invocation(ctx, false);
            let reply = match input {
                None => format!(
                    "❌ Missing required argument. Usage: `{}`",
                    ctx.command().qualified_name
                ),
                Some(_) => "❌ Invalid argument provided.".to_string(),
            };
            warn!("Argument error in {}: {}", ctx.command().qualified_name, error);
            let _ = ctx.say(reply).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {}
        error => {
            if let Some(ctx) = error.ctx() {
                commands::log_invocation(ctx, false);
            }
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    // Initialize logging; the guards flush the files on exit
    let _log_guards = utils::logging::init(&settings.logging)?;

    info!("Starting Logkeeper (Rust Edition)...");

    let store = ConfigStore::open(&settings.config_dir)
        .await
        .with_context(|| format!("failed to open {}", settings.config_dir.display()))?;
    let store = Arc::new(store);
    let guild_count = store.list_all_configs().await.len();
    info!(
        "Config store ready at {} ({} guild configs)",
        store.config_dir().display(),
        guild_count
    );

    let data = Data {
        store,
        messages: MessageTracker::new(settings.message_cache_size),
        backup_dir: settings.backup_dir.clone(),
        log_dir: settings.logging.directory.clone(),
    };

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                dynamic_prefix: Some(|ctx| Box::pin(dynamic_prefix(ctx))),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(features::handle_event(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    debug!("Running {} for {}", ctx.command().qualified_name, ctx.author().tag());
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    commands::log_invocation(ctx, true);
                })
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(data)
            })
        })
        .build();

    // MESSAGE_CONTENT and GUILD_MEMBERS are privileged; enable them in the Developer Portal
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MODERATION;

    let mut client = serenity::ClientBuilder::new(&settings.token, intents)
        .framework(framework)
        .await
        .context("failed to create client")?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register Ctrl+C handler: {}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    info!("Goodbye!");
    Ok(())
}
