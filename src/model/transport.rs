use tracing::debug;

use crate::error::{Result, ViewerError};

#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network boundary. Everything above it is synchronous and pure.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;

    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EhttpTransport;

impl EhttpTransport {
    fn execute(request: ehttp::Request) -> Result<HttpResponse> {
        let url = request.url.clone();
        debug!(method = %request.method, %url, "sending request");

        let response =
            ehttp::fetch_blocking(&request).map_err(|reason| ViewerError::fetch(&url, reason))?;

        debug!(%url, status = response.status, bytes = response.bytes.len(), "response received");
        Ok(HttpResponse {
            status: response.status,
            status_text: response.status_text,
            body: response.bytes,
        })
    }
}

impl Transport for EhttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        Self::execute(ehttp::Request::get(url))
    }

    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse> {
        let mut request = ehttp::Request::post(url, body);
        request.headers = ehttp::Headers::new(&[
            ("Accept", "*/*"),
            ("Content-Type", "application/json"),
        ]);
        Self::execute(request)
    }
}

/// Joins `base` and `path` and appends percent-encoded query pairs.
pub fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    for (position, (key, value)) in query.iter().enumerate() {
        url.push(if position == 0 { '?' } else { '&' });
        url.push_str(&urlencoding::encode(key));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }

    url
}
