use futures::future::BoxFuture;
use futures::FutureExt;
use guardwatch_core::{DataFetcher, FetchError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::sync::Arc;

use crate::config::AppConfig;

pub type FetchFuture = BoxFuture<'static, Result<String, FetchError>>;

/// Thread-safe fetcher handle shared by every load task.
pub type SharedFetcher = Arc<dyn DataFetcher<Fetch = FetchFuture> + Send + Sync>;

/// GETs metric endpoints relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Arc<str>,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        if let Some(cookie) = &config.session_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(COOKIE, value);
                }
                Err(error) => tracing::warn!(%error, "ignoring session cookie with invalid characters"),
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.as_str()),
        })
    }

    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }

    pub fn shared(self) -> SharedFetcher {
        Arc::new(self)
    }
}

impl DataFetcher for HttpFetcher {
    type Fetch = FetchFuture;

    fn fetch(&self, path_and_query: &str) -> Self::Fetch {
        let client = self.client.clone();
        let url = self.url_for(path_and_query);

        async move {
            let response = client.get(&url).send().await.map_err(classify)?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!(%url, %status, "non-success status, passing body to parser");
            }
            response.text().await.map_err(classify)
        }
        .boxed()
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_body() || error.is_decode() {
        FetchError::Body(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}
