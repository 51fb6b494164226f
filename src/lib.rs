pub mod cli;
pub mod config;
pub mod context;
pub mod conversation;
mod http_errors;
pub mod logging;
pub mod openai;
pub mod repl;
pub mod sanitize;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use cli::Cli;
use config::Config;
use context::ContextSource;
use conversation::Conversation;
use openai::ChatClient;
use repl::{ReplOptions, run_repl};

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Cli::parse();
    let cfg = Config::from_env()?;

    let mut builder = Client::builder();
    if let Some(secs) = cfg.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().context("Failed to initialize HTTP client")?;

    let sources: Vec<ContextSource> = args
        .contexts
        .iter()
        .map(|raw| ContextSource::parse(raw))
        .collect();
    let message = context::assemble(&args.joined_message(), &sources)?;

    let chat_client = ChatClient::new(&client, &cfg, args.model.as_str(), args.extra_params());
    let mut conversation = Conversation::new(&cfg.system_prompt);
    debug!(
        model = %args.model,
        interactive = args.interactive(),
        context_count = sources.len(),
        "starting session"
    );

    if args.interactive() {
        let initial = (!message.is_empty()).then_some(message.as_str());
        let opts = ReplOptions {
            sanitize: args.sanitize,
            resilient: args.resilient,
        };
        run_repl(&chat_client, &mut conversation, initial, &opts).await
    } else {
        conversation.push_user(&message);
        let answer = chat_client.chat(conversation.messages()).await?;
        println!("{}", sanitize::for_display(&answer, args.sanitize));
        Ok(())
    }
}
