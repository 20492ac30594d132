use futures::future::join_all;
use guardwatch_core::loader::execute;
use guardwatch_core::{LoadOutcome, ReloadPlan};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use guardwatch_tui::http::SharedFetcher;

/// Runs load requests off the UI loop. Outcomes come back over a channel and
/// are applied by the event loop in arrival order.
pub struct AppActions {
    fetcher: SharedFetcher,
    outcomes: UnboundedSender<LoadOutcome>,
}

impl AppActions {
    pub fn new(fetcher: SharedFetcher) -> (Self, UnboundedReceiver<LoadOutcome>) {
        let (outcomes, receiver) = unbounded_channel();
        (Self { fetcher, outcomes }, receiver)
    }

    /// Spawns one task per request. Superseded tasks are not cancelled; the
    /// dashboard drops their outcomes when they arrive.
    pub fn dispatch(&self, plan: ReloadPlan) {
        for request in plan {
            let fetcher = self.fetcher.clone();
            let outcomes = self.outcomes.clone();
            tokio::spawn(async move {
                let outcome = execute(fetcher.as_ref(), request).await;
                if outcomes.send(outcome).is_err() {
                    tracing::debug!("event loop gone, dropping load outcome");
                }
            });
        }
    }

    /// Runs every request concurrently and waits for all of them.
    pub async fn run_to_completion(&self, plan: ReloadPlan) -> Vec<LoadOutcome> {
        let fetcher = self.fetcher.as_ref();
        join_all(plan.into_iter().map(|request| execute(fetcher, request))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use guardwatch_core::{DataFetcher, Dashboard, FetchError, WidgetId, WidgetState};
    use guardwatch_tui::http::FetchFuture;
    use std::sync::Arc;

    struct StaticFetcher;

    impl DataFetcher for StaticFetcher {
        type Fetch = FetchFuture;

        fn fetch(&self, path_and_query: &str) -> Self::Fetch {
            let body = match path_and_query {
                "vulnbyseverity" => Ok(r#"{"items":[{"high":1,"medium":2,"low":3}]}"#.to_string()),
                "top10countryguarddutydata" => {
                    Ok(r#"{"items":[{"countryName":"Brazil","count":9}]}"#.to_string())
                }
                "worldmapguarddutydata" => Ok(r#"{"items":[]}"#.to_string()),
                "vulnbytech" => Err(FetchError::Timeout),
                _ => Ok("<html>not found</html>".to_string()),
            };
            async move { body }.boxed()
        }
    }

    #[tokio::test]
    async fn dispatched_outcomes_arrive_on_channel() {
        let (actions, mut receiver) = AppActions::new(Arc::new(StaticFetcher));
        let mut dashboard = Dashboard::new();

        let plan = dashboard.initial_load();
        let expected = plan.len();
        actions.dispatch(plan);

        for _ in 0..expected {
            let Some(outcome) = receiver.recv().await else {
                panic!("channel closed early");
            };
            dashboard.apply(outcome);
        }

        assert_eq!(dashboard.state_of(WidgetId::CountryBar), &WidgetState::Populated);
        assert_eq!(dashboard.state_of(WidgetId::Map), &WidgetState::Empty);
        assert!(matches!(
            dashboard.state_of(WidgetId::TechnologyPie),
            WidgetState::Error(message) if message.contains("timed out")
        ));
        assert!(matches!(dashboard.state_of(WidgetId::TimeBar), WidgetState::Error(_)));
    }

    #[tokio::test]
    async fn run_to_completion_keeps_plan_order() {
        let (actions, _receiver) = AppActions::new(Arc::new(StaticFetcher));
        let mut dashboard = Dashboard::new();
        let plan = dashboard.initial_load();
        let widgets: Vec<WidgetId> = plan.widgets().collect();

        let outcomes = actions.run_to_completion(plan).await;

        let returned: Vec<WidgetId> = outcomes.iter().map(|outcome| outcome.widget).collect();
        assert_eq!(returned, widgets);
    }
}
