use crate::config::Config;
use crate::error::TransportError;
use crate::protocol::Params;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// One request/response exchange with the work server. Implementations never retry.
pub trait Transport {
    fn fetch(&self, params: &Params) -> Result<Vec<u8>, TransportError>;
    fn post(&self, params: &Params, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, params: &Params) -> Result<Vec<u8>, TransportError> {
        (**self).fetch(params)
    }

    fn post(&self, params: &Params, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        (**self).post(params, body)
    }
}

/// Blocking HTTP transport. Any non-2xx status is an error.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            reason: format!("{base_url}: {e}"),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Other {
                reason: format!("building http client: {e}"),
            })?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(cfg: &Config, host: &str, port: u16) -> Result<Self, TransportError> {
        Self::new(
            &cfg.server.base_url(host, port),
            cfg.server.timeout(),
            &cfg.server.user_agent,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_url(&self, params: &Params) -> Result<Url, TransportError> {
        Url::parse_with_params(self.base_url.as_str(), params.pairs()).map_err(|e| {
            TransportError::InvalidUrl {
                reason: e.to_string(),
            }
        })
    }

    fn send(&self, req: RequestBuilder, url: &Url) -> Result<Vec<u8>, TransportError> {
        let resp = req.send().map_err(|source| {
            if source.is_timeout() {
                TransportError::Timeout {
                    url: url.to_string(),
                }
            } else {
                TransportError::Connect {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })?;
        debug!("{} bytes from {url}", body.len());
        Ok(body.to_vec())
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, params: &Params) -> Result<Vec<u8>, TransportError> {
        let url = self.request_url(params)?;
        info!("Fetching '{url}'");
        self.send(self.client.get(url.clone()), &url)
    }

    fn post(&self, params: &Params, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = self.request_url(params)?;
        info!("Posting {} bytes to '{url}'", body.len());
        let req = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/xml")
            .body(body);
        self.send(req, &url)
    }
}
