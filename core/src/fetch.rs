use std::future::Future;

use thiserror::Error;

/// Transport-level failure while talking to the metrics backend.
///
/// HTTP status codes are not represented here. A non-2xx response still
/// carries a body, which the loader validates like any other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// GET-style access to the metrics API.
///
/// `path_and_query` is relative to the fetcher's base URL, for example
/// `top10countryguarddutydata?accounts=prod`. Implementations resolve with the
/// raw body text regardless of the response status.
pub trait DataFetcher {
    type Fetch: Future<Output = Result<String, FetchError>>;

    fn fetch(&self, path_and_query: &str) -> Self::Fetch;
}
