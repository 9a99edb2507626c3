use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::ChatError;

fn error_chain_has_io_kind(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    fallback_text: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains(fallback_text)
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_io_kind(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_io_kind(err, ErrorKind::TimedOut, "timed out")
}

/// Folds a network-level reqwest failure into a `Transport` error whose text
/// tells the user which setting to look at.
pub(crate) fn transport_error(err: &reqwest::Error, api_url: &str, timeout_secs: u64) -> ChatError {
    let message = if err.is_timeout() || error_chain_has_timeout(err) {
        format!(
            "request timed out after {timeout_secs}s while calling '{api_url}'; \
             increase REQUEST_TIMEOUT_SECS or try again later"
        )
    } else if err.is_connect() && error_chain_has_connection_refused(err) {
        format!(
            "connection refused by '{api_url}'; check CHAT_API_URL and that the endpoint is reachable"
        )
    } else if err.is_connect() {
        format!("failed to connect to '{api_url}'; check CHAT_API_URL and network connectivity")
    } else {
        format!("request to '{api_url}' failed: {err}")
    };
    ChatError::Transport(message)
}
