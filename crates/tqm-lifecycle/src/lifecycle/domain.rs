use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Store keys this model does not name; carried through untouched so a
/// written-back artifact keeps them.
pub type ExtraFields = Map<String, Value>;

/// Deserializes `T`, or falls back to `T::default()` when the stored value has
/// the wrong shape.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Booleans as the store writes them: `true`, `"true"`, `"yes"`, `1`.
/// Anything else reads as `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        ),
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        _ => false,
    };
    Ok(flag)
}

/// Identifier wrapper for users acting on lifecycle artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stages of the continuous-improvement lifecycle shared by CAPA reports and PDCA cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PdcaStage {
    Plan,
    Do,
    Check,
    Act,
    Completed,
}

/// Every permitted move. Anything absent from this table (skips, re-entry,
/// regress, leaving `Completed`) is not a transition.
const TRANSITIONS: [(PdcaStage, PdcaStage); 4] = [
    (PdcaStage::Plan, PdcaStage::Do),
    (PdcaStage::Do, PdcaStage::Check),
    (PdcaStage::Check, PdcaStage::Act),
    (PdcaStage::Act, PdcaStage::Completed),
];

impl PdcaStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Plan,
            Self::Do,
            Self::Check,
            Self::Act,
            Self::Completed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Plan => "Plan",
            Self::Do => "Do",
            Self::Check => "Check",
            Self::Act => "Act",
            Self::Completed => "Completed",
        }
    }

    pub fn next(self) -> Option<Self> {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for PdcaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable record appended for every completed stage.
///
/// Timestamps are kept as the store wrote them; read them with
/// [`FieldValue::as_instant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    pub stage: PdcaStage,
    #[serde(default)]
    pub entered_at: FieldValue,
    #[serde(default)]
    pub completed_at: FieldValue,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_by: Option<UserId>,
    #[serde(default, deserialize_with = "or_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "or_default")]
    pub attachments: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Loosely typed evidence value as handed over by the store.
///
/// Store snapshots are not guaranteed to be well formed: a due date may arrive
/// as an ISO string, an epoch number, or garbage. Every accessor degrades to
/// "not present" instead of failing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Absent,
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Non-empty text after trimming, or a finite number.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(value) => !value.trim().is_empty(),
            Self::Number(value) => value.is_finite(),
            Self::Absent | Self::Other(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) if !value.trim().is_empty() => Some(value.trim()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Interprets the value as a point in time: RFC 3339, a bare `YYYY-MM-DD`
    /// date (midnight UTC), or epoch milliseconds.
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Text(raw) => {
                let raw = raw.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                    return Some(parsed.with_timezone(&Utc));
                }
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
            Self::Number(millis) if millis.is_finite() => {
                DateTime::from_timestamp_millis(*millis as i64)
            }
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Text(value.to_rfc3339())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub en: FieldValue,
    #[serde(default)]
    pub ar: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivenessCheck {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub required: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub completed: bool,
    #[serde(default)]
    pub results: FieldValue,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Approved override permitting closure despite incomplete evidence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureException {
    #[serde(default)]
    pub reason: FieldValue,
    #[serde(default)]
    pub approved_by: FieldValue,
    #[serde(default)]
    pub approved_at: FieldValue,
}

impl ClosureException {
    pub fn new(
        reason: impl Into<FieldValue>,
        approved_by: impl Into<FieldValue>,
        approved_at: impl Into<FieldValue>,
    ) -> Self {
        Self {
            reason: reason.into(),
            approved_by: approved_by.into(),
            approved_at: approved_at.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.reason, &self.approved_by, &self.approved_at]
            .iter()
            .all(|value| value.is_present())
    }

    /// Signer as a user id; a numeric or malformed signer has none.
    pub fn approver(&self) -> Option<UserId> {
        self.approved_by.as_text().map(UserId::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapaStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
    #[serde(other)]
    Other,
}

/// Corrective and preventive action report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapaReport {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(default)]
    pub root_cause: FieldValue,
    #[serde(default)]
    pub corrective_action: FieldValue,
    #[serde(default)]
    pub preventive_action: FieldValue,
    #[serde(default)]
    pub assigned_to: FieldValue,
    #[serde(default)]
    pub due_date: FieldValue,
    #[serde(default)]
    pub status: CapaStatus,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub pdca_stage: Option<PdcaStage>,
    #[serde(default, deserialize_with = "or_default")]
    pub pdca_history: Vec<StageHistoryEntry>,
    #[serde(default)]
    pub created_at: FieldValue,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub effectiveness_check: Option<EffectivenessCheck>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub closure_exception: Option<ClosureException>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CapaReport {
    pub fn requires_effectiveness_check(&self) -> bool {
        self.effectiveness_check
            .as_ref()
            .is_some_and(|check| check.required)
    }
}

/// Standalone improvement initiative tracked through the PDCA stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdcaCycle {
    pub id: String,
    #[serde(default)]
    pub title: FieldValue,
    #[serde(default, deserialize_with = "or_default")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<String>,
    #[serde(default)]
    pub owner: FieldValue,
    #[serde(default, deserialize_with = "or_default")]
    pub team: Vec<UserId>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_stage: Option<PdcaStage>,
    #[serde(default, deserialize_with = "or_default")]
    pub stage_history: Vec<StageHistoryEntry>,
    #[serde(default)]
    pub created_at: FieldValue,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Controlled-document metadata; only `is_controlled` documents count towards readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDocument {
    pub id: String,
    #[serde(default)]
    pub name: LocalizedName,
    #[serde(default)]
    pub status: FieldValue,
    #[serde(default)]
    pub uploaded_at: FieldValue,
    #[serde(default)]
    pub current_version: FieldValue,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_controlled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskStatus {
    Open,
    Mitigated,
    Closed,
    #[default]
    #[serde(other)]
    Other,
}

const CRITICAL_IMPACT: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub title: String,
    #[serde(default)]
    pub status: RiskStatus,
    #[serde(default)]
    pub impact: FieldValue,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<UserId>,
}

impl Risk {
    /// Impact of 4 or more; a non-numeric impact is never critical.
    pub fn is_critical(&self) -> bool {
        self.impact
            .as_number()
            .is_some_and(|impact| impact >= CRITICAL_IMPACT)
    }

    pub fn is_critical_open_finding(&self) -> bool {
        self.status == RiskStatus::Open && self.is_critical()
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.status, RiskStatus::Mitigated | RiskStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Finalized,
    #[default]
    #[serde(other)]
    Other,
}

impl ProjectStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
            Self::Finalized => "Finalized",
            Self::Other => "Other",
        }
    }

    /// Projects that count as delivering for the portfolio score.
    pub const fn is_delivering(self) -> bool {
        matches!(self, Self::Completed | Self::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Compliant,
    #[serde(rename = "Partially Compliant")]
    PartiallyCompliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
    #[default]
    #[serde(other)]
    Other,
}

impl ComplianceStatus {
    /// Credit towards the compliance rate: full, half, or none.
    pub const fn credit(self) -> f64 {
        match self {
            Self::Compliant => 1.0,
            Self::PartiallyCompliant => 0.5,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub status: ComplianceStatus,
    #[serde(default)]
    pub due_date: FieldValue,
}

/// Project snapshot aggregating the artifacts it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub capa_reports: Vec<CapaReport>,
    #[serde(default)]
    pub pdca_cycles: Vec<PdcaCycle>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

/// Capability shared by every artifact that moves through the PDCA stages.
pub trait StagedArtifact: Clone {
    fn current_stage(&self) -> PdcaStage;
    fn stage_history(&self) -> &[StageHistoryEntry];
    fn created_at(&self) -> &FieldValue;
    /// Copy of `self` with `entry` appended and the stage moved to `next`.
    fn with_transition(&self, next: PdcaStage, entry: StageHistoryEntry) -> Self;
}

impl StagedArtifact for CapaReport {
    /// Reports created before stage tracking default to `Plan`.
    fn current_stage(&self) -> PdcaStage {
        self.pdca_stage.unwrap_or(PdcaStage::Plan)
    }

    fn stage_history(&self) -> &[StageHistoryEntry] {
        &self.pdca_history
    }

    fn created_at(&self) -> &FieldValue {
        &self.created_at
    }

    fn with_transition(&self, next: PdcaStage, entry: StageHistoryEntry) -> Self {
        let mut updated = self.clone();
        updated.pdca_history.push(entry);
        updated.pdca_stage = Some(next);
        updated
    }
}

impl StagedArtifact for PdcaCycle {
    fn current_stage(&self) -> PdcaStage {
        self.current_stage.unwrap_or(PdcaStage::Plan)
    }

    fn stage_history(&self) -> &[StageHistoryEntry] {
        &self.stage_history
    }

    fn created_at(&self) -> &FieldValue {
        &self.created_at
    }

    fn with_transition(&self, next: PdcaStage, entry: StageHistoryEntry) -> Self {
        let mut updated = self.clone();
        updated.stage_history.push(entry);
        updated.current_stage = Some(next);
        updated
    }
}

/// Either kind of staged artifact, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleArtifact {
    Capa(CapaReport),
    Cycle(PdcaCycle),
}

impl StagedArtifact for LifecycleArtifact {
    fn current_stage(&self) -> PdcaStage {
        match self {
            Self::Capa(capa) => capa.current_stage(),
            Self::Cycle(cycle) => cycle.current_stage(),
        }
    }

    fn stage_history(&self) -> &[StageHistoryEntry] {
        match self {
            Self::Capa(capa) => capa.stage_history(),
            Self::Cycle(cycle) => cycle.stage_history(),
        }
    }

    fn created_at(&self) -> &FieldValue {
        match self {
            Self::Capa(capa) => &capa.created_at,
            Self::Cycle(cycle) => &cycle.created_at,
        }
    }

    fn with_transition(&self, next: PdcaStage, entry: StageHistoryEntry) -> Self {
        match self {
            Self::Capa(capa) => Self::Capa(capa.with_transition(next, entry)),
            Self::Cycle(cycle) => Self::Cycle(cycle.with_transition(next, entry)),
        }
    }
}
