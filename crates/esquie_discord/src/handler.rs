use std::sync::Arc;

use esquie_core::{DeliveryOutcome, ReactionOutcome, Responder};
use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use tracing::{debug, info, warn};

use crate::convert;
use crate::platform::SerenityPlatform;

/// Gateway event handler
///
/// Holds only immutable shared state; serenity runs each event on its own task.
pub struct EsquieHandler {
    responder: Arc<Responder>,
    status: Option<String>,
}

impl EsquieHandler {
    pub fn new(responder: Responder, status: Option<String>) -> Self {
        Self {
            responder: Arc::new(responder),
            status,
        }
    }
}

#[async_trait]
impl EventHandler for EsquieHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            id = %ready.user.id,
            guilds = ready.guilds.len(),
            "{} is connected!",
            self.responder.bot().name
        );

        if let Some(status) = &self.status {
            ctx.set_activity(Some(ActivityData::custom(status.clone())));
            debug!(status = %status, "set custom status");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Cheap filter before any conversion
        if msg.author.bot {
            return;
        }

        let platform = SerenityPlatform::new(ctx.http.clone());
        let message = convert::chat_message(&msg);
        let referenced = msg.referenced_message.as_deref().map(convert::chat_message);

        match self
            .responder
            .handle_message(&platform, &message, referenced)
            .await
        {
            Some(DeliveryOutcome::Failed(e)) => {
                warn!(message_id = %message.id, error = %e, "answer could not be delivered");
            }
            Some(outcome) => debug!(message_id = %message.id, ?outcome, "answer delivered"),
            None => {}
        }
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        let platform = SerenityPlatform::new(ctx.http.clone());
        let event = convert::reaction_event(&add_reaction);

        if self.responder.handle_reaction(&platform, &event).await == ReactionOutcome::Deleted {
            debug!(message_id = %event.message_id, "answer removed by reaction");
        }
    }
}
