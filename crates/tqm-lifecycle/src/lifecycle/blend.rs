//! Weighted blend of independently guarded 0–100 sub-scores.
//!
//! Portfolio and department readiness are both fixed-weight sums over four
//! percentages. They share this primitive and differ only in their profile.

/// Named weight vector over `N` percentage components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendProfile<const N: usize> {
    pub name: &'static str,
    pub components: [&'static str; N],
    pub weights: [f64; N],
}

impl<const N: usize> BlendProfile<N> {
    pub const fn new(name: &'static str, components: [&'static str; N], weights: [f64; N]) -> Self {
        Self {
            name,
            components,
            weights,
        }
    }

    /// Clamps every sub-score into `[0, 100]`, applies the weights, and rounds.
    pub fn blend(&self, scores: [f64; N]) -> u8 {
        let total: f64 = self
            .weights
            .iter()
            .zip(scores)
            .map(|(weight, score)| weight * clamp_percentage(score))
            .sum();
        round_percentage(total)
    }

    pub fn weight_of(&self, component: &str) -> Option<f64> {
        self.components
            .iter()
            .position(|name| *name == component)
            .map(|index| self.weights[index])
    }
}

pub const PORTFOLIO_PROFILE: BlendProfile<4> = BlendProfile::new(
    "portfolio",
    [
        "projectDelivery",
        "riskControl",
        "evidenceIntegrity",
        "capaEffectiveness",
    ],
    [0.35, 0.25, 0.25, 0.15],
);

pub const DEPARTMENT_PROFILE: BlendProfile<4> = BlendProfile::new(
    "department",
    [
        "compliance",
        "onTimeRate",
        "capaControlRate",
        "criticalRiskControlRate",
    ],
    [0.4, 0.25, 0.2, 0.15],
);

/// Non-finite input counts as zero.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn round_percentage(value: f64) -> u8 {
    clamp_percentage(value).round() as u8
}

/// `part / whole` as a percentage; an empty denominator set scores 100.
pub fn share_percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        100.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}
