use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::warn;

use crate::conversation::Conversation;
use crate::openai::ChatClient;
use crate::sanitize;

pub struct ReplOptions {
    pub sanitize: bool,
    /// Keep prompting after a failed call instead of aborting the process.
    pub resilient: bool,
}

/// Interactive chat loop. Every turn resends the whole conversation; an
/// empty line (or EOF) ends the session with a farewell.
pub async fn run_repl(
    client: &ChatClient<'_>,
    conversation: &mut Conversation,
    initial_message: Option<&str>,
    opts: &ReplOptions,
) -> Result<()> {
    if let Some(message) = initial_message {
        exchange(client, conversation, message, opts).await?;
    }

    loop {
        print!("You: ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        let prompt = input.trim_end_matches(['\r', '\n']);
        if read == 0 || prompt.is_empty() {
            println!("Exiting chat mode.");
            return Ok(());
        }

        exchange(client, conversation, prompt, opts).await?;
    }
}

async fn exchange(
    client: &ChatClient<'_>,
    conversation: &mut Conversation,
    prompt: &str,
    opts: &ReplOptions,
) -> Result<()> {
    conversation.push_user(prompt);

    match client.chat(conversation.messages()).await {
        Ok(answer) => {
            conversation.push_assistant(&answer);
            println!("Assistant: {}", sanitize::for_display(&answer, opts.sanitize));
            Ok(())
        }
        Err(err) if opts.resilient => {
            conversation.pop_unanswered_user();
            warn!(error = %err, "chat turn failed; re-prompting");
            eprintln!("Error talking to the model: {err:#}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
