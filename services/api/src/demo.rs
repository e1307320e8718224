use crate::infra::{load_snapshot, StaticApproverDirectory};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tqm_lifecycle::error::AppError;
use tqm_lifecycle::lifecycle::{
    advance_stage, calculate_department_readiness, evaluate_capa, CapaReport, CapaStatus,
    ChecklistItem, ClosureException, ClosureGate, ComplianceStatus, DepartmentReadiness,
    EffectivenessCheck, FieldValue, PdcaCycle, PdcaStage, PortfolioReadiness, Project,
    ProjectStatus, ReadinessScorer, Risk, RiskStatus, StageBoard, TransitionRequest, UserId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference time for the walkthrough (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Evaluate closures with strict validation turned off.
    #[arg(long)]
    pub(crate) lenient: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReadinessArgs {
    /// Path to a JSON portfolio snapshot with `projects`, `risks`, and `documents`
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Department member ids; when given, department readiness is printed too
    #[arg(long = "member")]
    pub(crate) members: Vec<String>,
    /// Reference time for overdue checks (defaults to now)
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_readiness_report(args: ReadinessArgs) -> Result<(), AppError> {
    let ReadinessArgs {
        snapshot,
        members,
        now,
    } = args;

    let snapshot = load_snapshot(&snapshot)?;
    let readiness = ReadinessScorer::default().score_snapshot(&snapshot);
    render_portfolio(&readiness);

    if !members.is_empty() {
        let members: BTreeSet<UserId> = members.into_iter().map(UserId::new).collect();
        let now = now.unwrap_or_else(Utc::now);
        let department =
            calculate_department_readiness(&snapshot.projects, &snapshot.risks, &members, now);
        render_department(&department);
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { now, lenient } = args;
    let now = now.unwrap_or_else(Utc::now);
    let opened = now - Duration::days(42);
    let quality_lead = UserId::new("user-quality-lead");

    println!("Continuous-improvement lifecycle demo");

    let mut cycle = demo_cycle(opened);
    let stage_notes = [
        "Baseline door-to-triage time measured",
        "Fast-track nurse piloted on day shift",
        "Median wait down from 38 to 21 minutes",
    ];
    for (week, note) in (1..).zip(stage_notes) {
        let request = TransitionRequest::new(note, quality_lead.clone());
        cycle = advance_stage(&cycle, &request, opened + Duration::weeks(week))?;
    }
    println!(
        "\nPDCA cycle {} now in {} ({} stages recorded)",
        cycle.id,
        cycle.current_stage.unwrap_or(PdcaStage::Plan),
        cycle.stage_history.len()
    );
    for entry in &cycle.stage_history {
        println!(
            "  - {}: {} -> {} | {}",
            entry.stage,
            day_label(&entry.entered_at),
            day_label(&entry.completed_at),
            entry.notes
        );
    }

    let blank = TransitionRequest::new("  ", quality_lead.clone());
    if let Err(err) = advance_stage(&cycle, &blank, now) {
        println!("  Advance without notes refused: {err}");
    }

    let directory = Arc::new(StaticApproverDirectory::new(["user-cmo"]));
    let gate = ClosureGate::new(!lenient).with_approver_directory(directory);
    println!(
        "\nCAPA closure review (strict validation {})",
        if gate.strict_validation() { "on" } else { "off" }
    );
    let capas = demo_capas(opened);
    for capa in &capas {
        let completeness = evaluate_capa(capa);
        let decision = gate.evaluate(capa);
        println!(
            "- {} | completeness {}% | missing [{}] | closure {}",
            capa.id,
            completeness.report.completeness_score,
            completeness.report.missing_fields.join(", "),
            if decision.allowed { "allowed" } else { "blocked" }
        );
        if let Some(reason) = &decision.reason {
            println!("  {reason}");
        }
    }

    let project = Project {
        id: "proj-ed-accreditation".to_string(),
        name: "Emergency department accreditation".to_string(),
        status: ProjectStatus::InProgress,
        capa_reports: capas,
        pdca_cycles: vec![cycle],
        checklist: demo_checklist(opened),
    };
    let board = StageBoard::from_project(&project);
    println!("\nStage board ({} active)", board.active_count());
    for column in board.columns() {
        let ids: Vec<&str> = column.cards.iter().map(|card| card.id.as_str()).collect();
        println!("  {:<9} {}", column.stage_label, ids.join(", "));
    }

    let projects = vec![
        project,
        Project {
            id: "proj-lab-iso".to_string(),
            name: "Laboratory ISO 15189".to_string(),
            status: ProjectStatus::OnHold,
            capa_reports: Vec::new(),
            pdca_cycles: Vec::new(),
            checklist: Vec::new(),
        },
    ];
    let risks = demo_risks();

    println!();
    render_portfolio(&ReadinessScorer::default().score(&projects, &risks, &[]));

    let members: BTreeSet<UserId> = ["user-ed-lead", "user-ed-nurse"]
        .into_iter()
        .map(UserId::new)
        .collect();
    render_department(&calculate_department_readiness(
        &projects, &risks, &members, now,
    ));

    Ok(())
}

fn day_label(value: &FieldValue) -> String {
    value
        .as_instant()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn render_portfolio(readiness: &PortfolioReadiness) {
    println!("Portfolio readiness: {}%", readiness.readiness_score);
    println!(
        "- delivery {}% | risk control {}% | evidence integrity {}% | CAPA effectiveness {}%",
        readiness.project_delivery_score,
        readiness.risk_control_score,
        readiness.evidence_integrity_index,
        readiness.capa_effectiveness_rate
    );
    println!(
        "- {} critical open finding(s)",
        readiness.critical_open_findings
    );
}

fn render_department(readiness: &DepartmentReadiness) {
    println!("Department readiness: {}%", readiness.readiness_score);
    println!(
        "- compliance {}% | on time {}% | CAPA control {}% | critical risk control {}%",
        readiness.compliance,
        readiness.on_time_rate,
        readiness.capa_control_rate,
        readiness.critical_risk_control_rate
    );
    println!(
        "- {} task(s), {} overdue | {} open CAPA(s) | {} open critical risk(s)",
        readiness.assigned_tasks,
        readiness.overdue_actions,
        readiness.open_capas,
        readiness.open_critical_risks
    );
}

fn demo_cycle(opened: DateTime<Utc>) -> PdcaCycle {
    PdcaCycle {
        id: "pdca-triage-wait".to_string(),
        title: FieldValue::text("Reduce triage wait time"),
        description: "Door-to-triage interval in the emergency department".to_string(),
        category: Some("Patient flow".to_string()),
        priority: Some("High".to_string()),
        owner: FieldValue::text("user-ed-lead"),
        team: vec![UserId::new("user-ed-nurse")],
        current_stage: Some(PdcaStage::Plan),
        stage_history: Vec::new(),
        created_at: FieldValue::from(opened),
        extra: Default::default(),
    }
}

fn demo_capas(opened: DateTime<Utc>) -> Vec<CapaReport> {
    let verified = CapaReport {
        id: "capa-hand-hygiene".to_string(),
        title: Some("Hand hygiene compliance below target".to_string()),
        root_cause: FieldValue::text("Dispensers missing at bay entrances"),
        corrective_action: FieldValue::text("Install dispensers at every bay"),
        preventive_action: FieldValue::text("Monthly observation audits"),
        assigned_to: FieldValue::text("user-ed-nurse"),
        due_date: FieldValue::from(opened + Duration::days(30)),
        status: CapaStatus::InProgress,
        pdca_stage: Some(PdcaStage::Act),
        pdca_history: Vec::new(),
        created_at: FieldValue::from(opened),
        effectiveness_check: Some(EffectivenessCheck {
            required: true,
            completed: true,
            results: FieldValue::text("Compliance at 92% for two consecutive months"),
            extra: Default::default(),
        }),
        closure_exception: None,
        extra: Default::default(),
    };

    let excepted = CapaReport {
        id: "capa-crash-cart".to_string(),
        title: Some("Crash cart checks skipped".to_string()),
        due_date: FieldValue::Absent,
        status: CapaStatus::Open,
        pdca_stage: Some(PdcaStage::Check),
        effectiveness_check: None,
        closure_exception: Some(ClosureException::new(
            "Accreditation survey scheduled before due date",
            "user-cmo",
            opened,
        )),
        ..verified.clone()
    };

    let pending = CapaReport {
        id: "capa-sharps".to_string(),
        title: Some("Sharps disposal incidents".to_string()),
        preventive_action: FieldValue::Absent,
        assigned_to: FieldValue::text("user-ed-lead"),
        status: CapaStatus::Open,
        pdca_stage: None,
        effectiveness_check: Some(EffectivenessCheck {
            required: true,
            ..Default::default()
        }),
        closure_exception: Some(ClosureException::new(
            "Requested by ward clerk",
            "user-ward-clerk",
            opened,
        )),
        ..verified.clone()
    };

    vec![verified, excepted, pending]
}

fn demo_checklist(opened: DateTime<Utc>) -> Vec<ChecklistItem> {
    let item = |id: &str, assignee: &str, status: ComplianceStatus, due_in_days: i64| {
        ChecklistItem {
            id: id.to_string(),
            assigned_to: Some(UserId::new(assignee)),
            status,
            due_date: FieldValue::from(opened + Duration::days(due_in_days)),
        }
    };

    vec![
        item("chk-triage-policy", "user-ed-lead", ComplianceStatus::Compliant, 14),
        item(
            "chk-sepsis-bundle",
            "user-ed-nurse",
            ComplianceStatus::PartiallyCompliant,
            21,
        ),
        item("chk-restraint-log", "user-ed-nurse", ComplianceStatus::NonCompliant, 60),
        item("chk-helipad", "user-ed-lead", ComplianceStatus::NotApplicable, 7),
    ]
}

fn demo_risks() -> Vec<Risk> {
    let risk = |id: &str, title: &str, status: RiskStatus, impact: f64| Risk {
        id: id.to_string(),
        title: title.to_string(),
        status,
        impact: FieldValue::Number(impact),
        owner_id: Some(UserId::new("user-ed-lead")),
    };

    vec![
        risk("risk-overcrowding", "Waiting room overcrowding", RiskStatus::Open, 5.0),
        risk("risk-sharps", "Needlestick injuries", RiskStatus::Mitigated, 4.0),
        risk("risk-signage", "Unclear wayfinding", RiskStatus::Open, 2.0),
    ]
}
