use serde::Serialize;

use super::blend::{round_percentage, share_percentage};
use super::domain::{AppDocument, CapaReport, PdcaCycle};

/// Single required-field check in an artifact's evidence rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCheck {
    pub field: &'static str,
    pub present: bool,
}

impl FieldCheck {
    pub const fn new(field: &'static str, present: bool) -> Self {
        Self { field, present }
    }
}

/// Artifacts with a fixed, ordered list of required fields.
pub trait Evaluable {
    fn required_checks(&self) -> Vec<FieldCheck>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub completeness_score: u8,
    pub missing_fields: Vec<&'static str>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

/// CAPA completeness plus the closure-readiness verdict that also needs the
/// effectiveness gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapaCompleteness {
    #[serde(flatten)]
    pub report: CompletenessReport,
    pub effectiveness_gate_passed: bool,
    pub is_closure_ready: bool,
}

/// Borrowed view over any artifact kind that carries an evidence rubric.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactRef<'a> {
    Capa(&'a CapaReport),
    Cycle(&'a PdcaCycle),
    Document(&'a AppDocument),
}

impl Evaluable for CapaReport {
    fn required_checks(&self) -> Vec<FieldCheck> {
        vec![
            FieldCheck::new("rootCause", self.root_cause.is_present()),
            FieldCheck::new("correctiveAction", self.corrective_action.is_present()),
            FieldCheck::new("preventiveAction", self.preventive_action.is_present()),
            FieldCheck::new("assignedTo", self.assigned_to.is_present()),
            FieldCheck::new("dueDate", self.due_date.as_instant().is_some()),
        ]
    }
}

impl Evaluable for PdcaCycle {
    fn required_checks(&self) -> Vec<FieldCheck> {
        vec![
            FieldCheck::new("title", self.title.is_present()),
            FieldCheck::new("owner", self.owner.is_present()),
            FieldCheck::new("currentStage", self.current_stage.is_some()),
            FieldCheck::new("stageHistory", !self.stage_history.is_empty()),
        ]
    }
}

impl Evaluable for AppDocument {
    fn required_checks(&self) -> Vec<FieldCheck> {
        vec![
            FieldCheck::new("name.en", self.name.en.is_present()),
            FieldCheck::new("name.ar", self.name.ar.is_present()),
            FieldCheck::new("status", self.status.is_present()),
            FieldCheck::new("uploadedAt", self.uploaded_at.as_instant().is_some()),
            FieldCheck::new(
                "currentVersion",
                self.current_version
                    .as_number()
                    .is_some_and(|version| version > 0.0),
            ),
        ]
    }
}

impl Evaluable for ArtifactRef<'_> {
    fn required_checks(&self) -> Vec<FieldCheck> {
        match self {
            ArtifactRef::Capa(capa) => capa.required_checks(),
            ArtifactRef::Cycle(cycle) => cycle.required_checks(),
            ArtifactRef::Document(document) => document.required_checks(),
        }
    }
}

pub fn evaluate<T>(artifact: &T) -> CompletenessReport
where
    T: Evaluable + ?Sized,
{
    let checks = artifact.required_checks();
    let missing_fields: Vec<&'static str> = checks
        .iter()
        .filter(|check| !check.present)
        .map(|check| check.field)
        .collect();
    let present = checks.len() - missing_fields.len();

    CompletenessReport {
        completeness_score: round_percentage(share_percentage(present, checks.len())),
        missing_fields,
    }
}

pub fn evaluate_completeness(artifact: ArtifactRef<'_>) -> CompletenessReport {
    evaluate(&artifact)
}

/// Passes when no check is required, or when it was completed with results on file.
pub fn effectiveness_gate_passed(capa: &CapaReport) -> bool {
    match &capa.effectiveness_check {
        Some(check) if check.required => check.completed && check.results.is_present(),
        _ => true,
    }
}

pub fn evaluate_capa(capa: &CapaReport) -> CapaCompleteness {
    let report = evaluate(capa);
    let gate = effectiveness_gate_passed(capa);
    let is_closure_ready = report.is_complete() && gate;

    CapaCompleteness {
        report,
        effectiveness_gate_passed: gate,
        is_closure_ready,
    }
}
