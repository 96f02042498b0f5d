//! HTTPS retrieval of published tokens.
//!
//! One attempt per call: the caller decides whether to retry. Redirects are
//! followed only to HTTPS locations (unless insecure HTTP is enabled) and the
//! body is capped at the configured token size.

use crate::config::{PinsealConfig, check_url};
use crate::error::{TransportError, TransportResult};
use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::debug;

const MAX_REDIRECTS: usize = 5;

/// HTTP client for fetching sealed pin documents.
pub struct TokenFetcher {
    client: Client,
    max_token_bytes: u64,
    allow_insecure_http: bool,
}

impl TokenFetcher {
    pub fn new(config: &PinsealConfig) -> TransportResult<Self> {
        let allow_http = config.allow_insecure_http;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pinseal/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::custom(move |attempt| {
                let refusal =
                    redirect_refusal(attempt.previous().len(), attempt.url().scheme(), allow_http);
                match refusal {
                    Some(reason) => attempt.error(reason),
                    None => attempt.follow(),
                }
            }))
            .build()?;

        Ok(Self {
            client,
            max_token_bytes: config.max_token_bytes,
            allow_insecure_http: config.allow_insecure_http,
        })
    }

    /// GETs `url` and returns the body with surrounding whitespace removed.
    pub async fn fetch(&self, url: &str) -> TransportResult<Vec<u8>> {
        let url = check_url(url, self.allow_insecure_http)?;
        debug!(%url, "fetching sealed pin document");

        let mut resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let limit = self.max_token_bytes;
        if let Some(len) = resp.content_length() {
            if len > limit {
                return Err(TransportError::TooLarge { what: "remote token", size: len, limit });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > limit {
                return Err(TransportError::TooLarge { what: "remote token", size, limit });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(len = body.len(), "fetched sealed pin document");
        Ok(body.trim_ascii().to_vec())
    }
}

/// Why a redirect to a `scheme` location after `hops` earlier requests must
/// not be followed, if it must not.
fn redirect_refusal(hops: usize, scheme: &str, allow_http: bool) -> Option<&'static str> {
    if hops >= MAX_REDIRECTS {
        Some("too many redirects")
    } else if scheme != "https" && !(scheme == "http" && allow_http) {
        Some("redirect to non-HTTPS location refused")
    } else {
        None
    }
}
