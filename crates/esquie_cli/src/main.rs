use std::sync::Arc;

use clap::Parser;
use esquie_core::{EsquieConfig, PollinationsClient};
use miette::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Default log filter when RUST_LOG is unset
const DEFAULT_FILTER: &str =
    "esquie_core=info,esquie_discord=info,esquie_cli=info,serenity=warn,warn";

#[derive(Parser)]
#[command(name = "esquie-bot")]
#[command(about = "Discord bot that answers mentions and replies with a hosted AI model")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let _cli = Cli::parse();

    let _log_guard = init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "starting esquie-bot");

    let config = EsquieConfig::load()?;
    info!(
        model = %config.ai.model,
        endpoint = %config.ai.endpoint,
        history_depth = config.behavior.history_max_depth,
        "loaded configuration"
    );

    let ai = PollinationsClient::new(&config.ai, config.discord.display_name.as_deref())?;

    esquie_discord::run_bot(&config, Arc::new(ai)).await?;

    Ok(())
}

/// Console logging, plus a daily rolling file when `ESQUIE_LOG_DIR` is set.
///
/// The returned guard flushes the file writer on drop.
fn init_logging() -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let (file_layer, guard) = match std::env::var("ESQUIE_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let file_appender = tracing_appender::rolling::daily(dir, "esquie-bot.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(
            // Console output
            fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_timer(fmt::time::LocalTime::rfc_3339())
                .compact(),
        )
        .with(file_layer)
        .init();

    guard
}
