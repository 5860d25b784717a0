use std::sync::Arc;

use esquie_core::{BotIdentity, CompletionBackend, EsquieConfig, Responder};
use serenity::Client;
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use tracing::info;

use crate::error::{DiscordError, Result};
use crate::handler::EsquieHandler;

/// Message and reaction events in guilds and DMs, plus message content
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGE_REACTIONS
}

/// Look up the bot's own account so handlers know who "me" is.
pub async fn fetch_identity(config: &EsquieConfig) -> Result<BotIdentity> {
    let token = &config.discord.token;
    let me = Http::new(token)
        .get_current_user()
        .await
        .map_err(|cause| DiscordError::auth_failed(cause, token))?;

    let name = config
        .discord
        .display_name
        .clone()
        .unwrap_or_else(|| me.name.clone());
    Ok(BotIdentity::new(me.id.get(), name))
}

/// Create the Discord client (without starting it)
pub async fn create_client(
    config: &EsquieConfig,
    ai: Arc<dyn CompletionBackend>,
) -> Result<Client> {
    let identity = fetch_identity(config).await?;
    info!(id = %identity.id, name = %identity.name, "authenticated with Discord");

    let responder = Responder::new(identity, config.behavior.clone(), ai);
    let handler = EsquieHandler::new(responder, config.discord.status.clone());

    Client::builder(&config.discord.token, intents())
        .event_handler(handler)
        .await
        .map_err(|cause| DiscordError::ClientBuild { cause })
}

/// Create and run the Discord bot until the gateway shuts down
pub async fn run_bot(config: &EsquieConfig, ai: Arc<dyn CompletionBackend>) -> Result<()> {
    let mut client = create_client(config, ai).await?;

    info!("Starting Discord bot...");
    client
        .start()
        .await
        .map_err(|cause| DiscordError::Gateway { cause })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intents_cover_messages_and_reactions() {
        let intents = intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGE_REACTIONS));
        assert!(intents.contains(GatewayIntents::DIRECT_MESSAGE_REACTIONS));
        assert!(!intents.contains(GatewayIntents::GUILD_PRESENCES));
    }
}
