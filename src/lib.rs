//! Threatlens
//!
//! Architecture threat-model analysis: builds a validated graph from a model
//! document, scores technical assets by relative attacker attractiveness,
//! runs a catalog of risk rules over the graph and reconciles the findings
//! with human risk tracking.

pub mod analyzer;
pub mod builder;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod input;
pub mod models;
pub mod raa;
pub mod report;
pub mod rules;
pub mod tracking;

#[cfg(test)]
mod testing;

pub use analyzer::{AnalysisOutcome, ThreatAnalyzer};
pub use config::AnalysisOptions;
pub use errors::{ThreatError, ThreatResult};
