use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tqm_lifecycle::error::AppError;
use tqm_lifecycle::lifecycle::{ApproverDirectory, PortfolioSnapshot, UserId};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fixed set of users allowed to sign closure exceptions.
#[derive(Debug, Default, Clone)]
pub(crate) struct StaticApproverDirectory {
    approvers: BTreeSet<UserId>,
}

impl StaticApproverDirectory {
    pub(crate) fn new<I, S>(approvers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            approvers: approvers.into_iter().map(UserId::new).collect(),
        }
    }
}

impl ApproverDirectory for StaticApproverDirectory {
    fn is_authorized_approver(&self, user: &UserId) -> bool {
        self.approvers.contains(user)
    }
}

pub(crate) fn load_snapshot(path: &Path) -> Result<PortfolioSnapshot, AppError> {
    let raw = fs::read_to_string(path)?;
    let snapshot: PortfolioSnapshot = serde_json::from_str(&raw)?;
    debug!(
        path = %path.display(),
        projects = snapshot.projects.len(),
        risks = snapshot.risks.len(),
        documents = snapshot.documents.len(),
        "loaded portfolio snapshot"
    );
    Ok(snapshot)
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
