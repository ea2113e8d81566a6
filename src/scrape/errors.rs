//! Error types for page fetching and scraping.

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("professor not found")]
    ProfessorNotFound,
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ScrapeError {
    /// Whether this error came from talking to a remote site, as opposed to a
    /// lookup that completed and matched nothing.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::Status { .. })
    }
}
