use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::completeness::evaluate_capa;
use super::domain::{CapaReport, UserId};

pub const EXCEPTION_REASON: &str = "Closure allowed by approved exception";
const MISSING_EVIDENCE_PREFIX: &str = "Missing required closure evidence";

/// Which rule produced a closure decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureBasis {
    LenientMode,
    EvidenceComplete,
    ApprovedException,
    MissingEvidence,
    /// Required fields are all present but the effectiveness check is not done.
    EffectivenessPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub basis: ClosureBasis,
}

impl ClosureDecision {
    fn allow(basis: ClosureBasis) -> Self {
        Self {
            allowed: true,
            reason: None,
            basis,
        }
    }
}

/// Lookup deciding whether a user may sign closure exceptions.
pub trait ApproverDirectory: Send + Sync {
    fn is_authorized_approver(&self, user: &UserId) -> bool;
}

/// Closure policy for CAPA reports.
///
/// Without an [`ApproverDirectory`] a complete closure exception is trusted as
/// is; authorizing the signer is then the caller's concern.
#[derive(Clone)]
pub struct ClosureGate {
    strict_validation: bool,
    approvers: Option<Arc<dyn ApproverDirectory>>,
}

impl fmt::Debug for ClosureGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureGate")
            .field("strict_validation", &self.strict_validation)
            .field("verifies_approvers", &self.approvers.is_some())
            .finish()
    }
}

impl ClosureGate {
    pub fn new(strict_validation: bool) -> Self {
        Self {
            strict_validation,
            approvers: None,
        }
    }

    pub fn with_approver_directory(mut self, directory: Arc<dyn ApproverDirectory>) -> Self {
        self.approvers = Some(directory);
        self
    }

    pub fn strict_validation(&self) -> bool {
        self.strict_validation
    }

    pub fn evaluate(&self, capa: &CapaReport) -> ClosureDecision {
        if !self.strict_validation {
            return ClosureDecision::allow(ClosureBasis::LenientMode);
        }

        let completeness = evaluate_capa(capa);
        if completeness.is_closure_ready {
            return ClosureDecision::allow(ClosureBasis::EvidenceComplete);
        }

        if self.has_valid_exception(capa) {
            debug!(capa = %capa.id, "closure granted by approved exception");
            return ClosureDecision {
                allowed: true,
                reason: Some(EXCEPTION_REASON.to_string()),
                basis: ClosureBasis::ApprovedException,
            };
        }

        let missing = completeness.report.missing_fields;
        let basis = if missing.is_empty() {
            ClosureBasis::EffectivenessPending
        } else {
            ClosureBasis::MissingEvidence
        };

        ClosureDecision {
            allowed: false,
            reason: Some(format!("{MISSING_EVIDENCE_PREFIX}: {}", missing.join(", "))),
            basis,
        }
    }

    fn has_valid_exception(&self, capa: &CapaReport) -> bool {
        let Some(exception) = capa
            .closure_exception
            .as_ref()
            .filter(|exception| exception.is_complete())
        else {
            return false;
        };

        match &self.approvers {
            Some(directory) => {
                let authorized = exception
                    .approver()
                    .is_some_and(|approver| directory.is_authorized_approver(&approver));
                if !authorized {
                    warn!(
                        capa = %capa.id,
                        approver = ?exception.approved_by,
                        "closure exception signed by unauthorized approver"
                    );
                }
                authorized
            }
            None => true,
        }
    }
}

pub fn can_close_capa(capa: &CapaReport, strict_validation_enabled: bool) -> ClosureDecision {
    ClosureGate::new(strict_validation_enabled).evaluate(capa)
}
