use clap::Parser;
use serde_json::{Map, Value};

/// Ask an OpenAI-compatible model from the command line.
///
/// Positional words are joined with spaces, so `gepetto list open ports`
/// works without quoting. With no positional message the tool starts an
/// interactive chat session.
#[derive(Debug, Parser)]
#[command(name = "gepetto", version, about)]
pub struct Cli {
    /// The prompt; words are joined with single spaces
    pub message: Vec<String>,

    /// Model identifier sent with every request
    #[arg(long, default_value = "gpt-5")]
    pub model: String,

    /// Context source: a file path (leading ~ expands to $HOME) or `-` (or
    /// `--`) to read stdin. May be repeated; sources are injected in order.
    #[arg(long = "context", value_name = "PATH", allow_hyphen_values = true)]
    pub contexts: Vec<String>,

    /// Start an interactive chat session even when a message is given
    #[arg(long)]
    pub chat: bool,

    /// Verbosity hint forwarded verbatim to the model (low, medium, high)
    #[arg(long)]
    pub verbosity: Option<String>,

    /// Reasoning effort forwarded verbatim to the model (minimal, low,
    /// medium, high)
    #[arg(long)]
    pub reasoning_effort: Option<String>,

    /// Strip characters outside printable ASCII from displayed replies
    #[arg(long)]
    pub sanitize: bool,

    /// In chat mode, keep prompting after a failed request instead of exiting
    #[arg(long)]
    pub resilient: bool,
}

impl Cli {
    pub fn joined_message(&self) -> String {
        self.message.join(" ")
    }

    /// No positional message means chat mode, matching `--chat`.
    pub fn interactive(&self) -> bool {
        self.chat || self.message.is_empty()
    }

    /// Generation-control knobs the remote service understands but this
    /// tool does not: forwarded as opaque top-level request fields.
    pub fn extra_params(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        if let Some(verbosity) = &self.verbosity {
            extra.insert("verbosity".to_string(), Value::String(verbosity.clone()));
        }
        if let Some(effort) = &self.reasoning_effort {
            extra.insert(
                "reasoning_effort".to_string(),
                Value::String(effort.clone()),
            );
        }
        extra
    }
}
