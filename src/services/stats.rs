//! Dashboard statistics aggregation.
//!
//! [`StatsAggregator`] fans five count queries out to the [`CountStore`] and
//! joins them into one [`DashboardStatistics`]. [`StatsPanel`] is the view-side
//! holder of that record: it runs the aggregator once per mount, keeps the
//! previous record when the batch fails, and drops results that arrive after
//! the view went away.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::statistics::{DashboardStatistics, StatField};
use crate::store::{Collection, CountQuery, CountStore, StoreError};

/// The batch failed. Which sub-query failed is deliberately not reported.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("Dashboard statistics aggregation failed: {0}")]
    Failed(#[from] StoreError),
}

/// One successful batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub statistics: DashboardStatistics,
    /// Fields whose count the backend did not report; they read as 0.
    pub missing: Vec<StatField>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The count query behind each statistics field.
pub fn count_query(field: StatField) -> CountQuery {
    match field {
        StatField::TotalUsers => CountQuery::all(Collection::Profiles),
        StatField::ProfileCompletions => {
            CountQuery::all(Collection::Profiles).eq("profile_completed", true)
        }
        StatField::ChatbotLeads => CountQuery::all(Collection::Leads).eq("source", "chatbot"),
        StatField::FormSubmissions => CountQuery::all(Collection::Leads).eq("source", "form"),
        StatField::ActiveWorkflows => {
            CountQuery::all(Collection::WorkflowSteps).eq("status", "pending")
        }
    }
}

#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn CountStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn CountStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CountStore {
        self.store.as_ref()
    }

    /// Run the five count queries concurrently and merge the results.
    ///
    /// Read-only and idempotent: exactly five store calls per invocation, no
    /// retries. Absent counts become 0 and are listed in
    /// [`Aggregation::missing`]; negative counts are clamped to 0.
    pub async fn fetch_statistics(&self) -> Result<Aggregation, AggregationError> {
        let [users, completions, chatbot, forms, workflows] = StatField::ALL.map(count_query);

        let (total_users, profile_completions, chatbot_leads, form_submissions, active_workflows) = tokio::try_join!(
            self.store.count(&users),
            self.store.count(&completions),
            self.store.count(&chatbot),
            self.store.count(&forms),
            self.store.count(&workflows),
        )?;

        let mut missing = Vec::new();
        let mut settle = |field: StatField, raw: Option<i64>| match raw {
            Some(n) => u64::try_from(n).unwrap_or(0),
            None => {
                missing.push(field);
                0
            }
        };

        let statistics = DashboardStatistics {
            total_users: settle(StatField::TotalUsers, total_users),
            profile_completions: settle(StatField::ProfileCompletions, profile_completions),
            chatbot_leads: settle(StatField::ChatbotLeads, chatbot_leads),
            form_submissions: settle(StatField::FormSubmissions, form_submissions),
            active_workflows: settle(StatField::ActiveWorkflows, active_workflows),
        };

        tracing::debug!(
            backend = self.store.backend(),
            ?statistics,
            missing = missing.len(),
            "Dashboard statistics aggregated"
        );

        Ok(Aggregation {
            statistics,
            missing,
        })
    }
}

/// Reason reported for a failed batch. The underlying store error is only logged.
pub const AGGREGATION_FAILED: &str = "aggregation_failed";

/// What a panel load ended as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsOutcome {
    Complete,
    Partial { missing: Vec<StatField> },
    Failed { reason: &'static str },
    /// The view unmounted before the batch settled; nothing was applied.
    Discarded,
}

/// Statistics as the view sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub statistics: DashboardStatistics,
    pub loading: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            statistics: DashboardStatistics::default(),
            loading: true,
        }
    }
}

/// View-side statistics holder with a loading flag.
///
/// Only [`StatsPanel::load`] writes the state. A view mounts by holding a
/// receiver from [`StatsPanel::mount`]; once every receiver is dropped the
/// view counts as unmounted and late results are discarded.
#[derive(Debug)]
pub struct StatsPanel {
    state: watch::Sender<PanelState>,
}

impl Default for StatsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsPanel {
    /// Starts loading, with all counts at zero.
    pub fn new() -> Self {
        let (state, _) = watch::channel(PanelState::default());
        Self { state }
    }

    pub fn mount(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        !self.state.is_closed()
    }

    pub fn snapshot(&self) -> PanelState {
        self.state.borrow().clone()
    }

    /// Run one aggregation and apply it.
    ///
    /// Failures are logged and leave the previous statistics in place. The
    /// loading flag only ever goes from true to false.
    pub async fn load(&self, aggregator: &StatsAggregator) -> StatsOutcome {
        let result = aggregator.fetch_statistics().await;

        if !self.is_mounted() {
            tracing::debug!("Dashboard view unmounted before statistics settled; discarding");
            return StatsOutcome::Discarded;
        }

        match result {
            Ok(aggregation) => {
                let outcome = if aggregation.is_complete() {
                    StatsOutcome::Complete
                } else {
                    tracing::warn!(missing = ?aggregation.missing, "Backend omitted some dashboard counts");
                    StatsOutcome::Partial {
                        missing: aggregation.missing.clone(),
                    }
                };
                self.state.send_modify(|state| {
                    state.statistics = aggregation.statistics;
                    state.loading = false;
                });
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching dashboard stats");
                self.state.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
                StatsOutcome::Failed {
                    reason: AGGREGATION_FAILED,
                }
            }
        }
    }
}

/// Mount a fresh panel, load it once and return the settled state.
pub async fn load_once(aggregator: &StatsAggregator) -> (PanelState, StatsOutcome) {
    let panel = StatsPanel::new();
    let view = panel.mount();
    let outcome = panel.load(aggregator).await;
    let state = view.borrow().clone();
    (state, outcome)
}
