use futures::StreamExt;
use huddle_ai::OllamaGenerator;
use huddle_bot::{
    config::BotConfig,
    dispatch::Dispatcher,
    error::StartupError,
    handler::{Collaborators, HandlerSettings, MessageHandler},
};
use huddle_conversation::{ConversationStore, ResponseDecider};
use huddle_platform::{ConsoleConfig, ConsoleTransport};
use rootcause::Report;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Report<StartupError>> {
    // Logs go to stderr so they never interleave with the console's replies.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = BotConfig::from_env().map_err(|e| StartupError::Config {
        reason: e.to_string(),
    })?;
    tracing::info!(
        model = %config.generation.model,
        "Loaded configuration"
    );

    let console = Arc::new(ConsoleTransport::new(ConsoleConfig {
        bot_id: config.bot.id(),
        bot_name: config.bot.name.clone(),
        ..ConsoleConfig::default()
    }));

    let generator =
        OllamaGenerator::new(config.generation.ollama()).map_err(|report| {
            StartupError::Generator {
                reason: report.to_string(),
            }
        })?;

    config
        .conversation
        .backfill_query()
        .map_err(|e| StartupError::Config {
            reason: e.to_string(),
        })?;

    let store = ConversationStore::new(config.conversation.timeout());
    tracing::info!(
        timeout_seconds = store.timeout().as_secs(),
        "Conversation store ready"
    );

    let handler = Arc::new(MessageHandler::new(
        config.bot.id(),
        store,
        ResponseDecider::new(config.conversation.followup_window()),
        Collaborators {
            backfill: console.clone(),
            generator: Arc::new(generator),
            sink: console.clone(),
        },
        HandlerSettings {
            backfill_hours: config.conversation.backfill_hours,
            backfill_limit: config.conversation.backfill_limit,
            context_message_limit: config.conversation.context_message_limit,
            max_response_length: config.delivery.max_response_length,
            debug_channel_name: config.delivery.debug_channel_name.clone(),
        },
    ));

    tracing::info!(
        channel = %console.config().channel_name,
        "Listening on the console; mention @{} to start a conversation",
        console.config().bot_name
    );

    let mut events = console.events(tokio::io::BufReader::new(tokio::io::stdin()));
    let mut dispatcher = Dispatcher::new(handler);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => dispatcher.dispatch(event),
                None => {
                    // Input is closed; let queued turns finish.
                    dispatcher.shutdown().await;
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                dispatcher.abort().await;
                break;
            }
        }
    }

    Ok(())
}
