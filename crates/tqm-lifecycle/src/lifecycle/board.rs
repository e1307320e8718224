use serde::Serialize;

use super::domain::{PdcaStage, Project, StagedArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Capa,
    Cycle,
}

impl ArtifactKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Capa => "CAPA",
            Self::Cycle => "PDCA Cycle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
    pub id: String,
    pub kind: ArtifactKind,
    pub title: String,
    pub history_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageColumn {
    pub stage: PdcaStage,
    pub stage_label: &'static str,
    pub cards: Vec<BoardCard>,
}

/// Project artifacts grouped into one column per lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageBoard {
    columns: Vec<StageColumn>,
}

impl StageBoard {
    pub fn from_project(project: &Project) -> Self {
        let mut columns: Vec<StageColumn> = PdcaStage::ordered()
            .into_iter()
            .map(|stage| StageColumn {
                stage,
                stage_label: stage.label(),
                cards: Vec::new(),
            })
            .collect();

        let capa_cards = project.capa_reports.iter().map(|capa| {
            let title = capa.title.clone().unwrap_or_else(|| capa.id.clone());
            let card = BoardCard {
                id: capa.id.clone(),
                kind: ArtifactKind::Capa,
                title,
                history_len: capa.stage_history().len(),
            };
            (capa.current_stage(), card)
        });

        let cycle_cards = project.pdca_cycles.iter().map(|cycle| {
            let title = cycle
                .title
                .as_text()
                .map(str::to_string)
                .unwrap_or_else(|| cycle.id.clone());
            let card = BoardCard {
                id: cycle.id.clone(),
                kind: ArtifactKind::Cycle,
                title,
                history_len: cycle.stage_history().len(),
            };
            (cycle.current_stage(), card)
        });

        for (stage, card) in capa_cards.chain(cycle_cards) {
            if let Some(column) = columns.iter_mut().find(|column| column.stage == stage) {
                column.cards.push(card);
            }
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[StageColumn] {
        &self.columns
    }

    pub fn column(&self, stage: PdcaStage) -> Option<&StageColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Cards still moving through the cycle.
    pub fn active_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|column| !column.stage.is_terminal())
            .map(|column| column.cards.len())
            .sum()
    }
}
