//! Entry point used by the gRPC and HTTP layers.

use crate::error::CycleError;
use crate::models::{CycleInfo, DailyUsageReport, LineInfo, SubscriberKey};
use crate::services::cycle_history::CycleHistoryBuilder;
use crate::services::metrics::record_cycle_lookup;
use crate::services::resolver::CycleResolver;
use crate::services::store::{CycleStore, UsageStore};
use crate::services::usage_report::UsageReportBuilder;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

/// Stateless facade over the report and history builders. Built once at
/// startup and shared across requests.
#[derive(Clone)]
pub struct CycleService {
    reports: UsageReportBuilder,
    history: CycleHistoryBuilder,
}

impl CycleService {
    pub fn new(cycles: Arc<dyn CycleStore>, usage: Arc<dyn UsageStore>) -> Self {
        Self {
            reports: UsageReportBuilder::new(CycleResolver::new(cycles.clone()), usage),
            history: CycleHistoryBuilder::new(cycles),
        }
    }

    /// Daily usage of the cycle active right now.
    pub async fn get_current_cycle_report(
        &self,
        line: &LineInfo,
    ) -> Result<Vec<DailyUsageReport>, CycleError> {
        self.get_current_cycle_report_at(line, Utc::now().timestamp_millis())
            .await
    }

    /// Daily usage of the cycle active at `reference_instant` (epoch millis).
    pub async fn get_current_cycle_report_at(
        &self,
        line: &LineInfo,
        reference_instant: i64,
    ) -> Result<Vec<DailyUsageReport>, CycleError> {
        let result = async {
            let subscriber = validated(line)?;
            self.reports
                .build_current_cycle_report(&subscriber, reference_instant)
                .await
        }
        .await;

        record_outcome("current_cycle_report", &result);
        result
    }

    /// Every cycle of the line, newest first.
    pub async fn get_cycle_history(&self, line: &LineInfo) -> Result<Vec<CycleInfo>, CycleError> {
        let result = async {
            let subscriber = validated(line)?;
            self.history.build_cycle_history(&subscriber).await
        }
        .await;

        record_outcome("cycle_history", &result);
        result
    }
}

fn validated(line: &LineInfo) -> Result<SubscriberKey, CycleError> {
    line.validate()?;
    Ok(SubscriberKey::from(line))
}

fn record_outcome<T>(operation: &str, result: &Result<T, CycleError>) {
    match result {
        Ok(_) => record_cycle_lookup(operation, "found"),
        Err(err) => {
            if let CycleError::Store(e) = err {
                tracing::error!(operation, error = %e, "Cycle lookup failed");
            } else {
                tracing::info!(operation, outcome = err.outcome(), error = %err, "Cycle lookup rejected");
            }
            record_cycle_lookup(operation, err.outcome());
        }
    }
}
