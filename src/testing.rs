//! Shared fixtures for unit tests.

use crate::builder::build_model;
use crate::graph::ThreatModel;
use crate::raa::RaaScorer;

/// Build a model from an inline document, panicking on validation errors.
pub fn build(document: serde_json::Value) -> ThreatModel {
    match build_model(document) {
        Ok(model) => model,
        Err(err) => panic!("fixture model failed to build: {}", err),
    }
}

/// Build and RAA-score a model, as the analyzer does before running rules.
pub fn scored(document: serde_json::Value) -> ThreatModel {
    let mut model = build(document);
    RaaScorer::new().apply(&mut model);
    model
}
