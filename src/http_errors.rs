use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_matches(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn is_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::TimedOut, "timed out")
}

/// Maps a failed POST into an actionable message. Transport failures are
/// fatal for the call; there is no retry path anywhere.
pub(crate) fn chat_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: Option<u64>,
) -> anyhow::Error {
    if err.is_timeout() || is_timeout(&err) {
        return match timeout_secs {
            Some(secs) => anyhow!(
                "Request timed out after {}s while calling '{}'. \
                 Raise REQUEST_TIMEOUT_SECS or check the endpoint.",
                secs,
                api_url
            ),
            None => anyhow!("Request timed out while calling '{}'.", api_url),
        };
    }

    if err.is_connect() {
        if is_connection_refused(&err) {
            return anyhow!(
                "Connection refused by '{}'. \
                 Ensure the endpoint is reachable and OPENAI_BASE_URL is correct.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to '{}'. \
             Check OPENAI_BASE_URL and network connectivity.",
            api_url
        );
    }

    anyhow!("Failed to call '{}': {}", api_url, err)
}

#[cfg(test)]
mod tests {
    use super::{chat_request_error, is_timeout};
    use reqwest::Client;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_to_an_actionable_message() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/v1/chat/completions", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let msg = format!("{:#}", chat_request_error(req_err, &api_url, None));

        assert!(
            msg.contains("Connection refused by"),
            "unexpected message: {msg}"
        );
        assert!(msg.contains("OPENAI_BASE_URL"), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn maps_timeouts_to_an_actionable_message() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/v1/chat/completions", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let msg = format!("{:#}", chat_request_error(req_err, &api_url, Some(2)));

        assert!(
            msg.contains("Request timed out after 2s"),
            "unexpected message: {msg}"
        );
        assert!(
            msg.contains("REQUEST_TIMEOUT_SECS"),
            "unexpected message: {msg}"
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_io_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(is_timeout(&err));
    }
}
