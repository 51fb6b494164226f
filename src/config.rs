use anyhow::{Result, bail};
use std::env;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. If you are asked for a script or cli command - output just the script or command - no other output";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub system_prompt: String,
    /// None means no client-side timeout: a hung connection blocks the turn.
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let api_key = match get_var("OPENAI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!("OPENAI_API_KEY is not set. Export it or add it to a .env file."),
        };

        Ok(Self {
            api_key,
            base_url: get_var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: parse_timeout_secs(get_var("REQUEST_TIMEOUT_SECS").as_deref()),
        })
    }
}

fn parse_timeout_secs(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}
