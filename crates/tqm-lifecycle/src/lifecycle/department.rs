use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::blend::{round_percentage, share_percentage, DEPARTMENT_PROFILE};
use super::domain::{CapaStatus, ChecklistItem, ComplianceStatus, Project, Risk, RiskStatus, UserId};

/// Department-scoped readiness and the counts behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReadiness {
    pub readiness_score: u8,
    pub compliance: u8,
    pub on_time_rate: u8,
    pub capa_control_rate: u8,
    pub critical_risk_control_rate: u8,
    pub assigned_tasks: usize,
    pub overdue_actions: usize,
    pub open_capas: usize,
    pub open_critical_risks: usize,
}

fn is_member(members: &BTreeSet<UserId>, user: Option<&UserId>) -> bool {
    user.is_some_and(|user| members.contains(user))
}

fn is_overdue(item: &ChecklistItem, now: DateTime<Utc>) -> bool {
    if item.status == ComplianceStatus::Compliant {
        return false;
    }
    item.due_date.as_instant().is_some_and(|due| due < now)
}

/// Scores the work owned by `members` across the portfolio.
///
/// Checklist items marked not applicable are ignored. Every rate defaults to
/// 100 when the department owns nothing of that kind.
pub fn calculate_department_readiness(
    projects: &[Project],
    risks: &[Risk],
    members: &BTreeSet<UserId>,
    now: DateTime<Utc>,
) -> DepartmentReadiness {
    let tasks: Vec<&ChecklistItem> = projects
        .iter()
        .flat_map(|project| project.checklist.iter())
        .filter(|item| is_member(members, item.assigned_to.as_ref()))
        .filter(|item| item.status != ComplianceStatus::NotApplicable)
        .collect();

    let credit: f64 = tasks.iter().map(|item| item.status.credit()).sum();
    let compliance = if tasks.is_empty() {
        100
    } else {
        round_percentage(credit / tasks.len() as f64 * 100.0)
    };

    let overdue_actions = tasks.iter().filter(|item| is_overdue(item, now)).count();
    let on_time_rate = round_percentage(share_percentage(
        tasks.len() - overdue_actions,
        tasks.len(),
    ));

    let capas: Vec<_> = projects
        .iter()
        .flat_map(|project| project.capa_reports.iter())
        .filter(|capa| {
            capa.assigned_to
                .as_text()
                .is_some_and(|assignee| members.contains(&UserId::new(assignee)))
        })
        .collect();
    let open_capas = capas
        .iter()
        .filter(|capa| capa.status == CapaStatus::Open)
        .count();
    let capa_control_rate =
        round_percentage(share_percentage(capas.len() - open_capas, capas.len()));

    let critical_risks: Vec<&Risk> = risks
        .iter()
        .filter(|risk| is_member(members, risk.owner_id.as_ref()) && risk.is_critical())
        .collect();
    let open_critical_risks = critical_risks
        .iter()
        .filter(|risk| risk.status == RiskStatus::Open)
        .count();
    let critical_risk_control_rate = round_percentage(share_percentage(
        critical_risks.len() - open_critical_risks,
        critical_risks.len(),
    ));

    let readiness_score = DEPARTMENT_PROFILE.blend([
        f64::from(compliance),
        f64::from(on_time_rate),
        f64::from(capa_control_rate),
        f64::from(critical_risk_control_rate),
    ]);

    DepartmentReadiness {
        readiness_score,
        compliance,
        on_time_rate,
        capa_control_rate,
        critical_risk_control_rate,
        assigned_tasks: tasks.len(),
        overdue_actions,
        open_capas,
        open_critical_risks,
    }
}
