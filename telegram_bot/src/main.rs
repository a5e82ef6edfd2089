mod bot;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InlineQuery;
use tracing_subscriber::EnvFilter;

use bot::{InlineBot, InlineQueryEvent};
use net_runner::HttpRunner;

#[derive(Parser, Debug)]
#[clap(version, about = "Telegram inline bot for https://porfirevich.ru/")]
struct Args {
    /// Text-generation service endpoint.
    #[clap(short, long, env = "GENERATE_ENDPOINT", default_value = net_runner::DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Bot token; falls back to TELOXIDE_TOKEN when omitted.
    #[clap(short, long, env = "TG_TOKEN")]
    tg_token: Option<String>,
    #[clap(long, default_value_t = bot::DEFAULT_MIN_LENGTH)]
    min_length: u32,
    #[clap(long, default_value_t = bot::DEFAULT_MAX_LENGTH)]
    max_length: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(
        "Starting TG bot connected to generation service at [{}]",
        args.endpoint
    );

    let tg = match args.tg_token {
        Some(token) => Bot::new(token),
        None => {
            tracing::warn!("Telegram token is not provided, creating from env");
            Bot::from_env()
        }
    };
    let me = tg.get_me().send().await?;
    tracing::info!("Started bot: {:?}", me.user);

    let inline_bot = Arc::new(
        InlineBot::new(HttpRunner::new(args.endpoint.clone()))
            .with_bounds(args.min_length, args.max_length),
    );

    let handler = Update::filter_inline_query().endpoint(
        |bot: Bot, query: InlineQuery, inline_bot: Arc<InlineBot<HttpRunner>>| async move {
            let event = InlineQueryEvent {
                query_id: query.id,
                user_id: query.from.id.0,
                text: query.query,
            };
            if let Err(e) = inline_bot.handle(&bot, event).await {
                tracing::error!("Error answering inline query: {:?}", e);
            }
            respond(())
        },
    );

    Dispatcher::builder(tg, handler)
        .dependencies(dptree::deps![inline_bot])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
