use anyhow::{Context as _, Result};
use std::fs;
use std::io::{self, BufRead};
use tracing::debug;

/// Hard cap on the outgoing user message, applied after all context blocks
/// are appended. Excess trailing characters are dropped with no attempt at
/// word or line boundaries.
pub const MAX_MESSAGE_CHARS: usize = 12_000;

const STDIN_LABEL: &str = "STDIN";

/// One named context source injected into the outgoing user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    Stdin,
    File(String),
}

impl ContextSource {
    /// `-` (or the historical `--`) selects stdin; anything else is a path
    /// with leading-tilde expansion.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" || raw == "--" {
            Self::Stdin
        } else {
            Self::File(expand_home(raw))
        }
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{}", home.display(), rest),
        _ => path.to_string(),
    }
}

/// Builds the outgoing user message: the base message plus one fenced block
/// per source, in order, then the hard length cutoff. Any unreadable source
/// fails the whole invocation.
pub fn assemble(base_message: &str, sources: &[ContextSource]) -> Result<String> {
    let mut parts = Vec::with_capacity(sources.len());
    for source in sources {
        parts.push(read_source(source)?);
    }
    let message = assemble_from_parts(base_message, &parts);
    debug!(
        source_count = sources.len(),
        message_len = message.len(),
        "assembled outgoing message"
    );
    Ok(message)
}

fn read_source(source: &ContextSource) -> Result<(String, String)> {
    match source {
        ContextSource::Stdin => Ok((STDIN_LABEL.to_string(), read_stdin()?)),
        ContextSource::File(path) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file '{path}'"))?;
            Ok((path.clone(), body))
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut body = String::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read context from stdin")?;
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

fn assemble_from_parts(base_message: &str, parts: &[(String, String)]) -> String {
    let mut message = base_message.to_string();
    for (label, body) in parts {
        message.push_str(&format!(" -- context: {label} -- ```{body}```"));
    }
    truncate_chars(&mut message, MAX_MESSAGE_CHARS);
    message
}

fn truncate_chars(message: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = message.char_indices().nth(max_chars) {
        message.truncate(byte_idx);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{
        ContextSource, MAX_MESSAGE_CHARS, assemble, assemble_from_parts, truncate_chars,
    };

    fn unique_temp_file(content: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "gepetto-context-{stamp}-{}.txt",
            std::process::id()
        ));
        fs::write(&path, content).expect("failed to write temp file");
        path
    }

    #[test]
    fn parse_recognizes_stdin_sentinels() {
        assert_eq!(ContextSource::parse("-"), ContextSource::Stdin);
        assert_eq!(ContextSource::parse("--"), ContextSource::Stdin);
        assert_eq!(
            ContextSource::parse("notes.txt"),
            ContextSource::File("notes.txt".to_string())
        );
    }

    #[test]
    fn parse_expands_leading_tilde() {
        let home = dirs::home_dir().expect("test host should have a home dir");
        let ContextSource::File(path) = ContextSource::parse("~/notes.txt") else {
            panic!("expected a file source");
        };
        assert_eq!(path, format!("{}/notes.txt", home.display()));
    }

    #[test]
    fn blocks_are_appended_in_order_with_fenced_labels() {
        let parts = vec![
            ("a.txt".to_string(), "alpha".to_string()),
            ("STDIN".to_string(), "beta\n".to_string()),
        ];
        let message = assemble_from_parts("question", &parts);
        assert_eq!(
            message,
            "question -- context: a.txt -- ```alpha``` -- context: STDIN -- ```beta\n```"
        );
    }

    #[test]
    fn no_sources_leaves_the_message_untouched() {
        assert_eq!(
            assemble_from_parts("just a question", &[]),
            "just a question"
        );
    }

    #[test]
    fn oversized_message_is_cut_to_exactly_the_limit() {
        let parts = vec![("big.txt".to_string(), "x".repeat(2 * MAX_MESSAGE_CHARS))];
        let untruncated = format!(
            "q -- context: big.txt -- ```{}```",
            "x".repeat(2 * MAX_MESSAGE_CHARS)
        );
        let message = assemble_from_parts("q", &parts);

        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS);
        let prefix: String = untruncated.chars().take(MAX_MESSAGE_CHARS).collect();
        assert_eq!(message, prefix);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let mut message = "héllo wörld".to_string();
        truncate_chars(&mut message, 4);
        assert_eq!(message, "héll");

        let mut short = "hi".to_string();
        truncate_chars(&mut short, 10);
        assert_eq!(short, "hi");
    }

    #[test]
    fn assemble_reads_file_sources() {
        let path = unique_temp_file("file body");
        let source = ContextSource::File(path.display().to_string());

        let message = assemble("q", &[source]).expect("assemble should succeed");
        assert_eq!(
            message,
            format!("q -- context: {} -- ```file body```", path.display())
        );

        fs::remove_file(&path).expect("failed to remove temp file");
    }

    #[test]
    fn unreadable_file_fails_the_whole_assembly() {
        let sources = vec![ContextSource::File(
            "/nonexistent/gepetto-missing.txt".to_string(),
        )];
        let err = assemble("q", &sources).expect_err("missing file should fail");
        let msg = format!("{err:#}");
        assert!(
            msg.contains("context file '/nonexistent/gepetto-missing.txt'"),
            "unexpected message: {msg}"
        );
    }
}
