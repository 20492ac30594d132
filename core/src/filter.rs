use crate::loader::LoadRequest;
use crate::widget::WidgetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::High),
            1 => Some(Self::Medium),
            2 => Some(Self::Low),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Which filter fields a widget's query honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Account only. Geographic widgets reflect the whole account.
    Account,
    /// Account, severity and technology.
    Full,
}

/// Currently selected filters. An empty field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    account: String,
    severity: Option<Severity>,
    technology: String,
}

impl FilterState {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub const fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn technology(&self) -> &str {
        &self.technology
    }

    pub fn is_empty(&self) -> bool {
        self.account.is_empty() && self.severity.is_none() && self.technology.is_empty()
    }

    /// `key=value` pairs for the non-empty fields within `scope`, joined by `&`.
    pub fn query_string(&self, scope: FilterScope) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(3);

        if !self.account.is_empty() {
            pairs.push(("accounts", self.account.as_str()));
        }

        if scope == FilterScope::Full {
            if let Some(severity) = self.severity {
                pairs.push(("sev", severity.as_str()));
            }
            if !self.technology.is_empty() {
                pairs.push(("tech", self.technology.as_str()));
            }
        }

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Ordered loads triggered by one filter change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadPlan {
    requests: Vec<LoadRequest>,
}

impl ReloadPlan {
    pub fn requests(&self) -> &[LoadRequest] {
        &self.requests
    }

    pub fn widgets(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.requests.iter().map(|request| request.widget)
    }

    pub fn contains(&self, widget: WidgetId) -> bool {
        self.widgets().any(|candidate| candidate == widget)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

impl IntoIterator for ReloadPlan {
    type Item = LoadRequest;
    type IntoIter = std::vec::IntoIter<LoadRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

const FULLY_SCOPED: [WidgetId; 2] = [WidgetId::TechnologyPie, WidgetId::TimeBar];

/// Sole writer of the filter state. Each operation mutates the filters and
/// returns the loads the change requires; it never performs I/O itself.
#[derive(Debug, Default)]
pub struct FilterController {
    state: FilterState,
    next_seq: u64,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the session with an account already selected.
    pub fn with_account(account: &str) -> Self {
        Self {
            state: FilterState {
                account: account.trim().to_string(),
                ..FilterState::default()
            },
            next_seq: 0,
        }
    }

    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn initial_load(&mut self) -> ReloadPlan {
        self.plan(&WidgetId::ALL)
    }

    /// Re-issues every widget's load with the filters unchanged.
    pub fn refresh(&mut self) -> ReloadPlan {
        self.plan(&WidgetId::ALL)
    }

    pub fn select_account(&mut self, id: &str) -> ReloadPlan {
        self.state.account = id.trim().to_string();
        self.state.severity = None;
        self.state.technology.clear();
        tracing::info!(account = %self.state.account, "account filter selected");
        self.plan(&WidgetId::ALL)
    }

    pub fn select_severity(&mut self, severity: Severity) -> ReloadPlan {
        self.state.severity = Some(severity);
        tracing::info!(severity = severity.as_str(), "severity filter selected");
        self.plan(&FULLY_SCOPED)
    }

    pub fn select_technology(&mut self, technology: &str) -> ReloadPlan {
        self.state.technology = technology.trim().to_string();
        tracing::info!(technology = %self.state.technology, "technology filter selected");
        self.plan(&FULLY_SCOPED)
    }

    pub fn clear_filters(&mut self) -> ReloadPlan {
        self.state = FilterState::default();
        tracing::info!("filters cleared");
        self.plan(&WidgetId::ALL)
    }

    fn plan(&mut self, widgets: &[WidgetId]) -> ReloadPlan {
        let requests = widgets
            .iter()
            .map(|&widget| {
                self.next_seq += 1;
                LoadRequest {
                    widget,
                    query: self.state.query_string(widget.scope()),
                    seq: self.next_seq,
                }
            })
            .collect();

        ReloadPlan { requests }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(account: &str, severity: Option<Severity>, technology: &str) -> FilterState {
        FilterState {
            account: account.to_string(),
            severity,
            technology: technology.to_string(),
        }
    }

    #[test]
    fn query_only_contains_non_empty_fields() {
        let cases = [
            (state("", None, ""), ""),
            (state("prod", None, ""), "accounts=prod"),
            (state("", Some(Severity::High), ""), "sev=high"),
            (state("", None, "s3"), "tech=s3"),
            (state("prod", Some(Severity::Low), "iam"), "accounts=prod&sev=low&tech=iam"),
            (state("", Some(Severity::Medium), "ec2"), "sev=medium&tech=ec2"),
        ];

        for (filters, expected) in cases {
            assert_eq!(filters.query_string(FilterScope::Full), expected);
        }
    }

    #[test]
    fn account_scope_ignores_severity_and_technology() {
        let filters = state("prod", Some(Severity::High), "s3");
        assert_eq!(filters.query_string(FilterScope::Account), "accounts=prod");
        assert_eq!(state("", Some(Severity::High), "s3").query_string(FilterScope::Account), "");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let filters = state("prod east", None, "a&b");
        assert_eq!(
            filters.query_string(FilterScope::Full),
            "accounts=prod%20east&tech=a%26b"
        );
    }

    #[test]
    fn severity_and_technology_never_reload_geographic_widgets() {
        let mut controller = FilterController::new();

        for plan in [
            controller.select_severity(Severity::High),
            controller.select_technology("elb"),
        ] {
            assert!(!plan.contains(WidgetId::CountryBar));
            assert!(!plan.contains(WidgetId::Map));
            assert!(plan.contains(WidgetId::TechnologyPie));
            assert!(plan.contains(WidgetId::TimeBar));
        }
    }

    #[test]
    fn account_and_clear_reload_all_four_widgets() {
        let mut controller = FilterController::new();

        for plan in [controller.select_account("prod"), controller.clear_filters()] {
            for widget in [
                WidgetId::CountryBar,
                WidgetId::Map,
                WidgetId::TechnologyPie,
                WidgetId::TimeBar,
            ] {
                assert!(plan.contains(widget), "{widget:?} missing from plan");
            }
        }
    }

    #[test]
    fn select_account_resets_other_filters() {
        let mut controller = FilterController::new();
        controller.select_severity(Severity::Medium);
        controller.select_technology("rds");

        let plan = controller.select_account(" staging ");

        assert_eq!(controller.state(), &state("staging", None, ""));
        assert!(plan.requests().iter().all(|r| r.query == "accounts=staging"));
    }

    #[test]
    fn severity_keeps_account_and_technology() {
        let mut controller = FilterController::with_account("prod");
        controller.select_technology("s3");

        let plan = controller.select_severity(Severity::Low);

        assert_eq!(controller.state(), &state("prod", Some(Severity::Low), "s3"));
        for request in plan.requests() {
            assert_eq!(request.query, "accounts=prod&sev=low&tech=s3");
        }
    }

    #[test]
    fn sequence_numbers_increase_across_plans() {
        let mut controller = FilterController::new();
        let first = controller.initial_load();
        let second = controller.select_severity(Severity::High);

        let seqs: Vec<u64> = first
            .requests()
            .iter()
            .chain(second.requests())
            .map(|request| request.seq)
            .collect();

        assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
