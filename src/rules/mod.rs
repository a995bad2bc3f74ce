//! Risk rules and the engine that evaluates them.
//!
//! A rule reads the finished [`ThreatModel`] and emits [`Risk`] records for
//! one [`RiskCategory`]. Built-in rules live in [`builtin`]; callers may
//! register their own through the same trait.

pub mod builtin;
mod engine;

pub use engine::{GeneratedRisks, RiskEngine};

use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::{Risk, RiskCategory};

/// A pluggable risk rule.
///
/// Rules must only read the model. The engine may call them concurrently.
pub trait RiskRule: Send + Sync {
    /// Static catalog entry for the findings this rule produces.
    fn category(&self) -> RiskCategory;

    /// Free-text model tags this rule reacts to.
    fn supported_tags(&self) -> Vec<String> {
        Vec::new()
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>>;
}
