use std::collections::BTreeSet;

use super::common::*;
use crate::lifecycle::department::calculate_department_readiness;
use crate::lifecycle::domain::{
    CapaStatus, ComplianceStatus, FieldValue, Project, ProjectStatus, Risk, RiskStatus, UserId,
};

fn ward_members() -> BTreeSet<UserId> {
    ["user-ward-a", "user-ward-b"]
        .into_iter()
        .map(UserId::new)
        .collect()
}

fn owned_risk(id: &str, owner: &str, status: RiskStatus, impact: f64) -> Risk {
    Risk {
        owner_id: Some(UserId::new(owner)),
        ..risk(id, status, impact)
    }
}

fn ward_project() -> Project {
    let mut ward = project("p-ward", ProjectStatus::InProgress);
    ward.checklist = vec![
        checklist_item("t1", "user-ward-a", ComplianceStatus::Compliant, "2025-03-10"),
        checklist_item(
            "t2",
            "user-ward-a",
            ComplianceStatus::PartiallyCompliant,
            "2025-03-10",
        ),
        checklist_item("t3", "user-ward-b", ComplianceStatus::NonCompliant, "2025-04-10"),
        checklist_item("t4", "user-ward-b", ComplianceStatus::NotApplicable, "2025-03-01"),
        checklist_item("t5", "user-outsider", ComplianceStatus::Compliant, "2025-03-01"),
    ];

    let mut open_capa = complete_capa("capa-open");
    open_capa.assigned_to = FieldValue::text("user-ward-a");
    let mut closed_capa = complete_capa("capa-closed");
    closed_capa.assigned_to = FieldValue::text("user-ward-b");
    closed_capa.status = CapaStatus::Closed;
    let foreign_capa = complete_capa("capa-foreign");
    ward.capa_reports = vec![open_capa, closed_capa, foreign_capa];
    ward
}

fn ward_risks() -> Vec<Risk> {
    vec![
        owned_risk("r1", "user-ward-a", RiskStatus::Open, 5.0),
        owned_risk("r2", "user-ward-a", RiskStatus::Mitigated, 4.0),
        owned_risk("r3", "user-ward-a", RiskStatus::Open, 2.0),
        owned_risk("r4", "user-outsider", RiskStatus::Open, 5.0),
    ]
}

#[test]
fn department_without_assignments_is_fully_ready() {
    let readiness =
        calculate_department_readiness(&[ward_project()], &ward_risks(), &BTreeSet::new(), at_day(20));

    assert_eq!(readiness.readiness_score, 100);
    assert_eq!(readiness.compliance, 100);
    assert_eq!(readiness.on_time_rate, 100);
    assert_eq!(readiness.capa_control_rate, 100);
    assert_eq!(readiness.critical_risk_control_rate, 100);
    assert_eq!(readiness.assigned_tasks, 0);
}

#[test]
fn scores_only_work_owned_by_members() {
    let readiness =
        calculate_department_readiness(&[ward_project()], &ward_risks(), &ward_members(), at_day(20));

    assert_eq!(readiness.assigned_tasks, 3);
    assert_eq!(readiness.compliance, 50);
    assert_eq!(readiness.overdue_actions, 1);
    assert_eq!(readiness.on_time_rate, 67);
    assert_eq!(readiness.open_capas, 1);
    assert_eq!(readiness.capa_control_rate, 50);
    assert_eq!(readiness.open_critical_risks, 1);
    assert_eq!(readiness.critical_risk_control_rate, 50);
    // 0.4*50 + 0.25*67 + 0.2*50 + 0.15*50
    assert_eq!(readiness.readiness_score, 54);
}

#[test]
fn unparseable_due_dates_never_count_as_overdue() {
    let mut ward = project("p-dates", ProjectStatus::InProgress);
    ward.checklist = vec![
        checklist_item("t1", "user-ward-a", ComplianceStatus::NonCompliant, "soon"),
        checklist_item("t2", "user-ward-b", ComplianceStatus::NonCompliant, "2025-03-01"),
    ];

    let readiness = calculate_department_readiness(&[ward], &[], &ward_members(), at_day(20));

    assert_eq!(readiness.overdue_actions, 1);
    assert_eq!(readiness.on_time_rate, 50);
    assert_eq!(readiness.compliance, 0);
}
