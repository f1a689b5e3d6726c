//! Map curl errors onto `RemoteError` kinds.

use super::RemoteError;

/// Network-level failures become `Network` (retryable by the next poll
/// cycle); everything else is a `Transport` error.
pub fn classify_curl_error(e: &curl::Error) -> RemoteError {
    if e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return RemoteError::Network(e.to_string());
    }
    RemoteError::Transport(e.to_string())
}

impl From<curl::Error> for RemoteError {
    fn from(e: curl::Error) -> Self {
        classify_curl_error(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_timeout_are_network() {
        // CURLE_COULDNT_CONNECT = 7, CURLE_OPERATION_TIMEDOUT = 28
        assert!(matches!(classify_curl_error(&curl::Error::new(7)), RemoteError::Network(_)));
        assert!(matches!(classify_curl_error(&curl::Error::new(28)), RemoteError::Network(_)));
    }

    #[test]
    fn malformed_url_is_transport() {
        // CURLE_URL_MALFORMAT = 3
        assert!(matches!(classify_curl_error(&curl::Error::new(3)), RemoteError::Transport(_)));
    }
}
