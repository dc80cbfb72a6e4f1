// Bot commands
pub mod admin;
pub mod info;
pub mod log;

use tracing::info;

use crate::utils::logging::COMMAND_TARGET;
use crate::{Context, Data, Error};

/// Every command the framework registers
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        log::log(),
        admin::backup(),
        admin::restore(),
        admin::logstats(),
        admin::template(),
        info::ping(),
        info::info(),
    ]
}

fn location(ctx: Context<'_>) -> String {
    match ctx.guild_id() {
        Some(guild_id) => format!("guild {} channel {}", guild_id, ctx.channel_id()),
        None => format!("DM {}", ctx.channel_id()),
    }
}

/// Record a command invocation in the commands log
pub fn log_invocation(ctx: Context<'_>, success: bool) {
    let status = if success { "SUCCESS" } else { "FAILED" };
    info!(
        target: COMMAND_TARGET,
        "{} | {} ({}) | {} | {}",
        status,
        ctx.author().tag(),
        ctx.author().id,
        location(ctx),
        ctx.command().qualified_name
    );
}
