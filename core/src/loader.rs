use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::fetch::{DataFetcher, FetchError};
use crate::metric::{CountryCount, GeoEvent, Metric, MonthCount, SeverityCounts, TechnologyShare};
use crate::widget::WidgetId;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("response is not JSON: {snippet:?}")]
    NotJson { snippet: String },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unexpected dataset for {0:?}")]
    Mismatch(WidgetId),
}

/// One load issued by the filter controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub widget: WidgetId,
    pub query: String,
    pub seq: u64,
}

impl LoadRequest {
    pub const fn metric(&self) -> Metric {
        self.widget.metric()
    }

    pub fn path_and_query(&self) -> String {
        self.metric().path(&self.query)
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub widget: WidgetId,
    pub seq: u64,
    pub result: Result<Dataset, LoadError>,
}

/// Parsed items of one metric response, in server order.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Severity(Vec<SeverityCounts>),
    Technologies(Vec<TechnologyShare>),
    Countries(Vec<CountryCount>),
    Events(Vec<GeoEvent>),
    Months(Vec<MonthCount>),
}

impl Dataset {
    pub fn parse(metric: Metric, body: &str) -> Result<Self, LoadError> {
        Ok(match metric {
            Metric::VulnBySeverity => Self::Severity(parse_items(body)?),
            Metric::VulnByTech => Self::Technologies(parse_items(body)?),
            Metric::TopCountries => Self::Countries(parse_items(body)?),
            Metric::WorldMap => Self::Events(parse_items(body)?),
            Metric::IssuesByMonth => Self::Months(parse_items(body)?),
        })
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Severity(items) => items.len(),
            Self::Technologies(items) => items.len(),
            Self::Countries(items) => items.len(),
            Self::Events(items) => items.len(),
            Self::Months(items) => items.len(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    items: Vec<T>,
}

const SNIPPET_LEN: usize = 40;

/// Extracts `items` from a metric response body.
///
/// Bodies that do not start with a JSON object (error pages, login redirects)
/// are rejected before reaching the JSON parser.
pub fn parse_items<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, LoadError> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return Err(LoadError::NotJson {
            snippet: trimmed.chars().take(SNIPPET_LEN).collect(),
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(trimmed)?;
    Ok(envelope.items)
}

pub async fn load<F>(fetcher: &F, metric: Metric, query: &str) -> Result<Dataset, LoadError>
where
    F: DataFetcher + ?Sized,
{
    let body = fetcher.fetch(&metric.path(query)).await?;
    Dataset::parse(metric, &body)
}

/// Runs one request to completion. Failures are captured in the outcome so a
/// broken metric never affects the other widgets.
pub async fn execute<F>(fetcher: &F, request: LoadRequest) -> LoadOutcome
where
    F: DataFetcher + ?Sized,
{
    let metric = request.metric();
    tracing::debug!(
        widget = ?request.widget,
        seq = request.seq,
        path = %request.path_and_query(),
        "loading metric"
    );

    let result = load(fetcher, metric, &request.query).await;

    match &result {
        Ok(dataset) => tracing::debug!(
            endpoint = metric.endpoint(),
            seq = request.seq,
            items = dataset.len(),
            "metric loaded"
        ),
        Err(error) => tracing::warn!(
            endpoint = metric.endpoint(),
            seq = request.seq,
            %error,
            "metric load failed"
        ),
    }

    LoadOutcome {
        widget: request.widget,
        seq: request.seq,
        result,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::future::{ready, Ready};

    /// Serves canned bodies keyed by path and records every request.
    #[derive(Default)]
    pub struct CannedFetcher {
        responses: HashMap<String, Result<String, FetchError>>,
        pub requested: RefCell<Vec<String>>,
    }

    impl CannedFetcher {
        pub fn with(mut self, path: &str, body: &str) -> Self {
            self.responses.insert(path.to_string(), Ok(body.to_string()));
            self
        }

        pub fn failing(mut self, path: &str, error: FetchError) -> Self {
            self.responses.insert(path.to_string(), Err(error));
            self
        }
    }

    impl DataFetcher for CannedFetcher {
        type Fetch = Ready<Result<String, FetchError>>;

        fn fetch(&self, path_and_query: &str) -> Self::Fetch {
            self.requested.borrow_mut().push(path_and_query.to_string());
            ready(
                self.responses
                    .get(path_and_query)
                    .cloned()
                    .unwrap_or_else(|| Err(FetchError::Transport("connection refused".into()))),
            )
        }
    }

    #[test]
    fn html_body_is_not_parsed() {
        let result = parse_items::<CountryCount>("<!DOCTYPE html><html>login</html>");
        assert!(matches!(result, Err(LoadError::NotJson { snippet }) if snippet.starts_with("<!DOCTYPE")));
    }

    #[test]
    fn missing_items_is_malformed() {
        let result = parse_items::<CountryCount>(r#"{"message": "unauthorized"}"#);
        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn truncated_json_is_malformed() {
        let result = parse_items::<CountryCount>(r#"{"items": [{"countryName": "Chi"#);
        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn items_keep_server_order() -> Result<(), LoadError> {
        let items = parse_items::<CountryCount>(
            r#"{"items":[{"countryName":"China","count":5},{"countryName":"Russia","count":4}],"total":2}"#,
        )?;
        let names: Vec<&str> = items.iter().map(|c| c.country_name.as_str()).collect();
        assert_eq!(names, ["China", "Russia"]);
        Ok(())
    }

    #[tokio::test]
    async fn execute_builds_path_from_request() {
        let fetcher = CannedFetcher::default()
            .with("vulnbytech?accounts=prod&sev=high", r#"{"items": []}"#);
        let request = LoadRequest {
            widget: WidgetId::TechnologyPie,
            query: "accounts=prod&sev=high".to_string(),
            seq: 3,
        };

        let outcome = execute(&fetcher, request).await;

        assert_eq!(outcome.seq, 3);
        assert_eq!(outcome.widget, WidgetId::TechnologyPie);
        assert!(matches!(outcome.result, Ok(Dataset::Technologies(ref items)) if items.is_empty()));
        assert_eq!(
            fetcher.requested.borrow().as_slice(),
            ["vulnbytech?accounts=prod&sev=high"]
        );
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_raised() {
        let fetcher = CannedFetcher::default().failing("issuescountbymonth", FetchError::Timeout);
        let request = LoadRequest {
            widget: WidgetId::TimeBar,
            query: String::new(),
            seq: 1,
        };

        let outcome = execute(&fetcher, request).await;
        assert!(matches!(
            outcome.result,
            Err(LoadError::Fetch(FetchError::Timeout))
        ));
    }
}
