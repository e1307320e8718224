//! Continuous-improvement lifecycle engine.
//!
//! Every operation here is a pure function over in-memory snapshots handed in
//! by the caller: stage transitions return a new artifact, the evaluators
//! return derived scores. Persistence and access control live with the caller.

pub mod blend;
pub mod board;
pub mod closure;
pub mod completeness;
pub mod department;
pub mod domain;
pub mod readiness;
pub mod router;
pub mod transition;

#[cfg(test)]
mod tests;

pub use blend::{BlendProfile, DEPARTMENT_PROFILE, PORTFOLIO_PROFILE};
pub use board::{ArtifactKind, BoardCard, StageBoard, StageColumn};
pub use closure::{
    can_close_capa, ApproverDirectory, ClosureBasis, ClosureDecision, ClosureGate,
    EXCEPTION_REASON,
};
pub use completeness::{
    effectiveness_gate_passed, evaluate, evaluate_capa, evaluate_completeness, ArtifactRef,
    CapaCompleteness, CompletenessReport, Evaluable, FieldCheck,
};
pub use department::{calculate_department_readiness, DepartmentReadiness};
pub use domain::{
    AppDocument, CapaReport, CapaStatus, ChecklistItem, ClosureException, ComplianceStatus,
    EffectivenessCheck, FieldValue, LifecycleArtifact, LocalizedName, PdcaCycle, PdcaStage,
    Project, ProjectStatus, Risk, RiskStatus, StageHistoryEntry, StagedArtifact, UserId,
};
pub use readiness::{calculate_readiness, PortfolioReadiness, PortfolioSnapshot, ReadinessScorer};
pub use router::{lifecycle_router, lifecycle_router_with_approvers, LifecycleSettings};
pub use transition::{advance_stage, next_stage, TransitionError, TransitionRequest};
