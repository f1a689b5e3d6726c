//! libcurl-backed client for the KVFinder-web HTTP API.

use std::time::Duration;
use url::Url;

use super::reply::{parse_create_reply, parse_status_reply};
use super::{CreateReply, CreateRequest, RemoteError, RemoteService, StatusReply};

/// Longest slice of an error body kept in `RemoteError::Http`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, including the response body.
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking HTTP client. Each call uses a fresh curl handle, so the client
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base: Url,
    options: HttpOptions,
}

impl HttpRemote {
    /// `server_url` is the API root, e.g. `http://localhost:8081`.
    pub fn new(server_url: &str, options: HttpOptions) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(server_url)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, options })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/<segment>`, with the segment percent-encoded.
    fn endpoint(&self, segment: &str) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("cannot build URL from {}", self.base)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Perform a GET (or a JSON POST when `body` is set). Returns status code and body.
    fn perform(&self, url: &Url, body: Option<&[u8]>) -> Result<(u32, Vec<u8>), RemoteError> {
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.timeout(self.options.timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Accept: application/json")?;
        if let Some(body) = body {
            easy.post(true)?;
            easy.post_fields_copy(body)?;
            list.append("Content-Type: application/json")?;
            // Large payloads would otherwise wait on `100 Continue`.
            list.append("Expect:")?;
        }
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        tracing::debug!(url = %url, code, bytes = response.len(), "request finished");
        Ok((code, response))
    }
}

fn http_error(code: u32, body: &[u8]) -> RemoteError {
    let text = String::from_utf8_lossy(body);
    let mut body: String = text.chars().take(MAX_ERROR_BODY).collect();
    if text.chars().count() > MAX_ERROR_BODY {
        body.push('…');
    }
    RemoteError::Http { code, body }
}

impl RemoteService for HttpRemote {
    fn create(&self, request: &CreateRequest<'_>) -> Result<CreateReply, RemoteError> {
        let url = self.endpoint("create")?;
        let payload = serde_json::to_vec(request)
            .map_err(|e| RemoteError::Transport(format!("serialize request: {}", e)))?;
        let (code, body) = self.perform(&url, Some(&payload))?;
        if !(200..300).contains(&code) {
            return Err(http_error(code, &body));
        }
        parse_create_reply(&body)
    }

    fn status(&self, id: &str) -> Result<StatusReply, RemoteError> {
        let url = self.endpoint(id)?;
        let (code, body) = self.perform(&url, None)?;
        match code {
            200..=299 => parse_status_reply(&body),
            404 => Err(RemoteError::NotFound),
            _ => Err(http_error(code, &body)),
        }
    }
}
