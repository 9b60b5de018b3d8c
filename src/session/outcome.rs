//! Grading a finished session from the pieces that survived.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::numeric::{ratio, round_percent};
use crate::scene::{NodeId, SceneGraph};
use crate::UNKNOWN_COMPONENT_TYPE;

/// Grade awarded from the survival rate, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SurvivalTier {
    /// Under 20% of the pieces remain.
    Failure,
    /// At least 20% remain.
    Poor,
    /// At least 40% remain.
    Partial,
    /// At least 60% remain.
    Good,
    /// At least 80% remain.
    Excellent,
}

impl SurvivalTier {
    /// Maps a survival rate to its tier; each bound is inclusive.
    ///
    /// # Examples
    ///
    /// ```
    /// use trestle::session::SurvivalTier;
    /// assert_eq!(SurvivalTier::from_rate(0.8), SurvivalTier::Excellent);
    /// assert_eq!(SurvivalTier::from_rate(0.79), SurvivalTier::Good);
    /// assert_eq!(SurvivalTier::from_rate(0.1), SurvivalTier::Failure);
    /// ```
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.8 {
            Self::Excellent
        } else if rate >= 0.6 {
            Self::Good
        } else if rate >= 0.4 {
            Self::Partial
        } else if rate >= 0.2 {
            Self::Poor
        } else {
            Self::Failure
        }
    }

    /// Tier for `remaining` of `initial` pieces; `Failure` when `initial` is 0.
    #[must_use]
    pub fn from_counts(remaining: usize, initial: usize) -> Self {
        Self::from_rate(survival_rate(remaining, initial))
    }

    /// Smallest survival rate that earns this tier.
    #[must_use]
    pub const fn lower_bound(self) -> f64 {
        match self {
            Self::Excellent => 0.8,
            Self::Good => 0.6,
            Self::Partial => 0.4,
            Self::Poor => 0.2,
            Self::Failure => 0.0,
        }
    }

    /// Announcement used when the tier's effects fire.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT SUCCESS - structure held strong",
            Self::Good => "GOOD SUCCESS - structure held well",
            Self::Partial => "PARTIAL SUCCESS - structure damaged but functional",
            Self::Poor => "POOR PERFORMANCE - structure severely damaged",
            Self::Failure => "COMPLETE FAILURE - structure collapsed",
        }
    }
}

impl fmt::Display for SurvivalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// `remaining / initial`, or `0.0` when nothing was there to begin with.
#[must_use]
pub fn survival_rate(remaining: usize, initial: usize) -> f64 {
    ratio(remaining, initial)
}

/// Result of a finished test session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    /// Load kind the structure was tested with.
    pub load_kind: String,
    /// Pieces under the root when the session started.
    pub initial_piece_count: usize,
    /// Pieces under the root when the session was graded.
    pub remaining_piece_count: usize,
    /// `remaining / initial`.
    pub survival_rate: f64,
    /// Grade derived from the survival rate.
    pub tier: SurvivalTier,
    /// Whether grading was triggered by a total collapse before the window ran out.
    pub early_collapse: bool,
    /// Seconds spent monitoring.
    pub elapsed_secs: f32,
    /// Remaining pieces grouped by component type.
    pub remaining_by_type: BTreeMap<String, usize>,
}

impl TestOutcome {
    /// Survival rate rounded to a whole percentage.
    #[must_use]
    pub fn survival_percent(&self) -> u32 {
        round_percent(self.survival_rate)
    }
}

/// Remaining children of `root` grouped by their component type tag.
#[must_use]
pub fn remaining_by_type(scene: &SceneGraph, root: NodeId) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for child in scene.children(root) {
        let Some(tags) = scene.tags(*child) else {
            continue;
        };
        let kind = tags.component_type().unwrap_or(UNKNOWN_COMPONENT_TYPE);
        *breakdown.entry(kind.to_owned()).or_insert(0) += 1;
    }
    breakdown
}

/// Inputs to [`evaluate`] that come from the session rather than the scene.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Load kind the session ran with.
    pub load_kind: &'a str,
    /// Pieces under the root at start.
    pub initial_piece_count: usize,
    /// Seconds spent monitoring.
    pub elapsed_secs: f32,
    /// Whether a total collapse cut monitoring short.
    pub early_collapse: bool,
}

/// Grades the structure under `root` as it stands now.
///
/// Survival counts every live child of the root, including pieces that were
/// never replaced and anything the physics layer parented there.
#[must_use]
pub fn evaluate(scene: &SceneGraph, root: NodeId, context: EvaluationContext<'_>) -> TestOutcome {
    let remaining = scene.child_count(root);
    let rate = survival_rate(remaining, context.initial_piece_count);
    TestOutcome {
        load_kind: context.load_kind.to_owned(),
        initial_piece_count: context.initial_piece_count,
        remaining_piece_count: remaining,
        survival_rate: rate,
        tier: SurvivalTier::from_rate(rate),
        early_collapse: context.early_collapse,
        elapsed_secs: context.elapsed_secs,
        remaining_by_type: remaining_by_type(scene, root),
    }
}
