use chrono::{DateTime, TimeZone, Utc};

use crate::lifecycle::domain::{
    AppDocument, CapaReport, CapaStatus, ChecklistItem, ClosureException, ComplianceStatus,
    EffectivenessCheck, ExtraFields, FieldValue, LocalizedName, PdcaCycle, PdcaStage, Project,
    ProjectStatus, Risk, RiskStatus, StageHistoryEntry, UserId,
};
use crate::lifecycle::transition::TransitionRequest;

pub(super) fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid creation timestamp")
}

pub(super) fn at_day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn quality_lead() -> UserId {
    UserId::new("user-quality-lead")
}

pub(super) fn request(notes: &str) -> TransitionRequest {
    TransitionRequest::new(notes, quality_lead())
}

pub(super) fn complete_capa(id: &str) -> CapaReport {
    CapaReport {
        id: id.to_string(),
        title: Some("Medication labelling gap".to_string()),
        root_cause: FieldValue::text("Look-alike packaging stored side by side"),
        corrective_action: FieldValue::text("Segregate look-alike stock"),
        preventive_action: FieldValue::text("Tall-man lettering on shelf labels"),
        assigned_to: FieldValue::text("user-pharmacy"),
        due_date: FieldValue::text("2025-04-30T00:00:00Z"),
        status: CapaStatus::Open,
        pdca_stage: None,
        pdca_history: Vec::new(),
        created_at: FieldValue::from(created_at()),
        effectiveness_check: Some(EffectivenessCheck::default()),
        closure_exception: None,
        extra: ExtraFields::new(),
    }
}

pub(super) fn capa_missing_due_date(id: &str) -> CapaReport {
    CapaReport {
        due_date: FieldValue::Absent,
        ..complete_capa(id)
    }
}

pub(super) fn capa_with_effectiveness(id: &str, required: bool, completed: bool) -> CapaReport {
    CapaReport {
        effectiveness_check: Some(EffectivenessCheck {
            required,
            completed,
            results: if completed {
                FieldValue::text("No recurrence in 90 days")
            } else {
                FieldValue::Absent
            },
            extra: ExtraFields::new(),
        }),
        ..complete_capa(id)
    }
}

pub(super) fn approved_exception() -> ClosureException {
    ClosureException::new(
        "Emergency audit timeline exception",
        "qa-director",
        "2025-03-20T08:00:00Z",
    )
}

pub(super) fn plan_cycle(id: &str) -> PdcaCycle {
    PdcaCycle {
        id: id.to_string(),
        title: FieldValue::text("Reduce triage wait time"),
        description: "Emergency department triage flow".to_string(),
        category: Some("Process".to_string()),
        priority: Some("High".to_string()),
        owner: FieldValue::text("user-ed-lead"),
        team: vec![UserId::new("user-nurse-1")],
        current_stage: Some(PdcaStage::Plan),
        stage_history: Vec::new(),
        created_at: FieldValue::from(created_at()),
        extra: ExtraFields::new(),
    }
}

pub(super) fn tracked_cycle(id: &str) -> PdcaCycle {
    PdcaCycle {
        stage_history: vec![StageHistoryEntry {
            stage: PdcaStage::Plan,
            entered_at: FieldValue::from(created_at()),
            completed_at: FieldValue::from(at_day(5)),
            completed_by: Some(quality_lead()),
            notes: "Baseline captured".to_string(),
            attachments: Vec::new(),
            extra: ExtraFields::new(),
        }],
        current_stage: Some(PdcaStage::Do),
        ..plan_cycle(id)
    }
}

pub(super) fn controlled_document(id: &str) -> AppDocument {
    AppDocument {
        id: id.to_string(),
        name: LocalizedName {
            en: FieldValue::text("Hand Hygiene Policy"),
            ar: FieldValue::text("سياسة نظافة اليدين"),
        },
        status: FieldValue::text("Approved"),
        uploaded_at: FieldValue::text("2025-02-10T10:00:00Z"),
        current_version: FieldValue::Number(2.0),
        is_controlled: true,
    }
}

pub(super) fn project(id: &str, status: ProjectStatus) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {id}"),
        status,
        capa_reports: Vec::new(),
        pdca_cycles: Vec::new(),
        checklist: Vec::new(),
    }
}

pub(super) fn risk(id: &str, status: RiskStatus, impact: f64) -> Risk {
    Risk {
        id: id.to_string(),
        title: format!("Risk {id}"),
        status,
        impact: FieldValue::Number(impact),
        owner_id: Some(UserId::new("user-risk-owner")),
    }
}

pub(super) fn checklist_item(
    id: &str,
    assignee: &str,
    status: ComplianceStatus,
    due_date: &str,
) -> ChecklistItem {
    ChecklistItem {
        id: id.to_string(),
        assigned_to: Some(UserId::new(assignee)),
        status,
        due_date: FieldValue::text(due_date),
    }
}
