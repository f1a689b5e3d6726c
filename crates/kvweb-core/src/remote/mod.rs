//! The KVFinder-web server as seen by the client.
//!
//! [`RemoteService`] is the seam between the lifecycle engine and the
//! network: [`HttpRemote`] talks to a real server over libcurl, tests plug
//! in scripted implementations. Both calls are blocking; async callers go
//! through `spawn_blocking`.

mod classify;
mod http;
mod reply;
#[cfg(test)]
pub(crate) mod scripted;

pub use classify::classify_curl_error;
pub use http::{HttpOptions, HttpRemote};
pub use reply::{parse_create_reply, parse_status_reply, CreateReply, RemoteOutput, RemoteStatus, StatusReply};

use serde::Serialize;

use crate::job::JobInput;
use crate::settings::Settings;

/// Body of `POST /create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest<'a> {
    #[serde(flatten)]
    pub input: &'a JobInput,
    pub settings: &'a Settings,
}

pub trait RemoteService: Send + Sync {
    /// `POST /create`.
    fn create(&self, request: &CreateRequest<'_>) -> Result<CreateReply, RemoteError>;

    /// `GET /{id}`. Returns `RemoteError::NotFound` when the server does not know the id.
    fn status(&self, id: &str) -> Result<StatusReply, RemoteError>;
}

/// Failure talking to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Connection refused, DNS failure, timeout, reset. Worth trying again later.
    #[error("network error: {0}")]
    Network(String),

    /// Any other transport failure (bad URL, TLS setup, internal curl error).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server does not know this job id (expired or never existed).
    #[error("job not found on server")]
    NotFound,

    /// Non-success HTTP status.
    #[error("HTTP {code}: {body}")]
    Http { code: u32, body: String },

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl RemoteError {
    /// True for failures that a later attempt may not hit (network, 5xx, 429).
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Http { code, .. } => *code == 429 || (500..=599).contains(code),
            _ => false,
        }
    }
}
