use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    ExtraFields, FieldValue, PdcaStage, StageHistoryEntry, StagedArtifact, UserId,
};

/// User-supplied input for a single stage advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub notes: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub actor: UserId,
}

impl TransitionRequest {
    pub fn new(notes: impl Into<String>, actor: UserId) -> Self {
        Self {
            notes: notes.into(),
            attachments: Vec::new(),
            actor,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Reported conditions for an advance that did not happen. The caller's
/// artifact is untouched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("notes are required to advance a lifecycle stage")]
    NotesRequired,
    #[error("artifact has already completed its lifecycle")]
    AlreadyCompleted,
}

impl TransitionError {
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotesRequired => "notesRequired",
            Self::AlreadyCompleted => "alreadyCompleted",
        }
    }
}

/// Moves `artifact` one stage forward and returns the advanced copy.
///
/// The history entry records the stage being left: it was entered when the
/// previous entry completed (or when the artifact was created) and completes
/// at `now`. Both earlier timestamps are copied as stored. Not idempotent:
/// every successful call appends an entry.
pub fn advance_stage<A>(
    artifact: &A,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<A, TransitionError>
where
    A: StagedArtifact,
{
    let current = artifact.current_stage();
    let next = current.next().ok_or(TransitionError::AlreadyCompleted)?;

    if request.notes.trim().is_empty() {
        return Err(TransitionError::NotesRequired);
    }

    let entered_at = artifact
        .stage_history()
        .last()
        .map(|entry| &entry.completed_at)
        .filter(|completed_at| completed_at.is_present())
        .unwrap_or_else(|| artifact.created_at())
        .clone();

    let entry = StageHistoryEntry {
        stage: current,
        entered_at,
        completed_at: FieldValue::from(now),
        completed_by: Some(request.actor.clone()),
        notes: request.notes.clone(),
        attachments: request.attachments.clone(),
        extra: ExtraFields::new(),
    };

    debug!(
        from = current.label(),
        to = next.label(),
        actor = %request.actor,
        "advanced lifecycle stage"
    );

    Ok(artifact.with_transition(next, entry))
}

/// Stage that `advance_stage` would move to, if any.
pub fn next_stage(stage: PdcaStage) -> Option<PdcaStage> {
    stage.next()
}
