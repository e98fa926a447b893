/// Failure of a single HTTP call against the work server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request url: {reason}")]
    InvalidUrl { reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("reading response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Raised by non-HTTP transports (tests, alternative backends).
    #[error("{reason}")]
    Other { reason: String },
}

/// The poll response could not be turned into a work batch.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response body is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed domain list document: {0}")]
    Xml(#[from] quick_xml::de::DeError),
}

/// The report document could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{verdicts} verdicts for {items} domains")]
    LengthMismatch { items: usize, verdicts: usize },

    #[error("serializing report: {0}")]
    Xml(#[from] quick_xml::se::SeError),
}

/// Everything that can end a protocol cycle.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("classifier failed on {domain}: {source:#}")]
    Classifier {
        domain: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
