use serde::{Deserialize, Serialize};
use tracing::debug;

use super::blend::{round_percentage, share_percentage, BlendProfile, PORTFOLIO_PROFILE};
use super::completeness::evaluate;
use super::domain::{AppDocument, CapaReport, Project, Risk};

/// Store snapshot consumed by the portfolio scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub documents: Vec<AppDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReadiness {
    pub readiness_score: u8,
    pub evidence_integrity_index: u8,
    pub capa_effectiveness_rate: u8,
    pub critical_open_findings: usize,
    pub project_delivery_score: u8,
    pub risk_control_score: u8,
}

/// Portfolio-level readiness scorer.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessScorer {
    profile: BlendProfile<4>,
}

impl Default for ReadinessScorer {
    fn default() -> Self {
        Self::with_profile(PORTFOLIO_PROFILE)
    }
}

impl ReadinessScorer {
    /// Profile components are read in order as delivery, risk control,
    /// evidence integrity, CAPA effectiveness.
    pub fn with_profile(profile: BlendProfile<4>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &BlendProfile<4> {
        &self.profile
    }

    pub fn score(
        &self,
        projects: &[Project],
        risks: &[Risk],
        documents: &[AppDocument],
    ) -> PortfolioReadiness {
        let delivery = project_delivery_score(projects);
        let risk_control = risk_control_score(risks);
        let evidence = evidence_integrity_index(projects, documents);
        let effectiveness = capa_effectiveness_rate(projects);

        let readiness_score = self.profile.blend([
            delivery,
            risk_control,
            f64::from(evidence),
            f64::from(effectiveness),
        ]);

        let readiness = PortfolioReadiness {
            readiness_score,
            evidence_integrity_index: evidence,
            capa_effectiveness_rate: effectiveness,
            critical_open_findings: critical_open_findings(risks),
            project_delivery_score: round_percentage(delivery),
            risk_control_score: round_percentage(risk_control),
        };

        debug!(
            profile = self.profile.name,
            projects = projects.len(),
            risks = risks.len(),
            documents = documents.len(),
            readiness = readiness.readiness_score,
            "scored portfolio readiness"
        );

        readiness
    }

    pub fn score_snapshot(&self, snapshot: &PortfolioSnapshot) -> PortfolioReadiness {
        self.score(&snapshot.projects, &snapshot.risks, &snapshot.documents)
    }
}

pub fn calculate_readiness(
    projects: &[Project],
    risks: &[Risk],
    documents: &[AppDocument],
) -> PortfolioReadiness {
    ReadinessScorer::default().score(projects, risks, documents)
}

fn all_capas(projects: &[Project]) -> impl Iterator<Item = &CapaReport> {
    projects.iter().flat_map(|project| project.capa_reports.iter())
}

/// Share of projects that are completed or in progress.
pub fn project_delivery_score(projects: &[Project]) -> f64 {
    let delivering = projects
        .iter()
        .filter(|project| project.status.is_delivering())
        .count();
    share_percentage(delivering, projects.len())
}

/// Share of risks that are mitigated or closed.
pub fn risk_control_score(risks: &[Risk]) -> f64 {
    let controlled = risks.iter().filter(|risk| risk.is_controlled()).count();
    share_percentage(controlled, risks.len())
}

/// Mean completeness over every CAPA, every PDCA cycle, and every controlled
/// document. No artifacts means nothing is missing: 100.
pub fn evidence_integrity_index(projects: &[Project], documents: &[AppDocument]) -> u8 {
    let capa_scores = all_capas(projects).map(|capa| evaluate(capa).completeness_score);
    let cycle_scores = projects
        .iter()
        .flat_map(|project| project.pdca_cycles.iter())
        .map(|cycle| evaluate(cycle).completeness_score);
    let document_scores = documents
        .iter()
        .filter(|document| document.is_controlled)
        .map(|document| evaluate(document).completeness_score);

    let (total, count) = capa_scores
        .chain(cycle_scores)
        .chain(document_scores)
        .fold((0u64, 0usize), |(total, count), score| {
            (total + u64::from(score), count + 1)
        });

    if count == 0 {
        return 100;
    }
    round_percentage(total as f64 / count as f64)
}

/// Among CAPA reports that require an effectiveness check, the share completed.
pub fn capa_effectiveness_rate(projects: &[Project]) -> u8 {
    let (required, completed) = all_capas(projects)
        .filter_map(|capa| capa.effectiveness_check.as_ref())
        .filter(|check| check.required)
        .fold((0usize, 0usize), |(required, completed), check| {
            (required + 1, completed + usize::from(check.completed))
        });

    round_percentage(share_percentage(completed, required))
}

pub fn critical_open_findings(risks: &[Risk]) -> usize {
    risks
        .iter()
        .filter(|risk| risk.is_critical_open_finding())
        .count()
}
