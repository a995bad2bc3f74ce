//! Relative Attacker Attractiveness (RAA) scoring.
//!
//! Each in-scope technical asset gets a raw weighted score from its own and
//! its data's sensitivity plus exposure bonuses. Scores are then normalized
//! against the most attractive asset, so 100 marks the top target of this
//! model and the numbers only carry meaning relative to each other.

use crate::graph::ThreatModel;
use crate::models::TechnicalAsset;
use std::collections::HashMap;

const DATA_CONFIDENTIALITY_WEIGHT: f64 = 0.8;
const DATA_INTEGRITY_WEIGHT: f64 = 0.8;
const DATA_AVAILABILITY_WEIGHT: f64 = 0.5;

const INTERNET_BONUS: f64 = 50.0;
const HUMAN_CLIENT_BONUS: f64 = 25.0;
const MULTI_TENANT_BONUS: f64 = 20.0;
const CUSTOM_DEVELOPED_BONUS: f64 = 15.0;
const HIGH_VALUE_TECHNOLOGY_BONUS: f64 = 10.0;

/// Multi-factor RAA scorer.
#[derive(Debug, Default)]
pub struct RaaScorer;

impl RaaScorer {
    pub fn new() -> Self {
        Self
    }

    /// Unnormalized attractiveness of a single in-scope asset.
    pub fn raw_score(&self, model: &ThreatModel, asset: &TechnicalAsset) -> f64 {
        let mut score = 0.0;

        // 1. The asset's own rating
        score += asset.confidentiality.asset_attractiveness();
        score += asset.integrity.asset_attractiveness();
        score += asset.availability.asset_attractiveness();

        // 2. Highest rating across itself and the data it processes or stores
        let highest = model.asset_sensitivity(asset);
        score += highest.confidentiality.processed_or_stored_attractiveness()
            * DATA_CONFIDENTIALITY_WEIGHT;
        score += highest.integrity.processed_or_stored_attractiveness() * DATA_INTEGRITY_WEIGHT;
        score +=
            highest.availability.processed_or_stored_attractiveness() * DATA_AVAILABILITY_WEIGHT;

        // 3. Exposure
        if asset.internet {
            score += INTERNET_BONUS;
        }
        if asset.used_as_client_by_human {
            score += HUMAN_CLIENT_BONUS;
        }
        if asset.multi_tenant {
            score += MULTI_TENANT_BONUS;
        }
        if asset.custom_developed_parts {
            score += CUSTOM_DEVELOPED_BONUS;
        }

        // 4. Technology
        if asset.technology.is_high_value_target() {
            score += HIGH_VALUE_TECHNOLOGY_BONUS;
        }

        score.max(0.0)
    }

    /// Score every technical asset in place. Out-of-scope assets get 0.
    pub fn apply(&self, model: &mut ThreatModel) {
        let mut raw_scores: HashMap<String, f64> = HashMap::new();
        let mut max_raw = 0.0_f64;
        for asset in model.in_scope_technical_assets() {
            let raw = self.raw_score(model, asset);
            max_raw = max_raw.max(raw);
            raw_scores.insert(asset.id.clone(), raw);
        }

        for asset in model.technical_assets_mut() {
            let raa = match raw_scores.get(&asset.id) {
                Some(raw) if asset.is_in_scope() && max_raw > 0.0 => {
                    (raw / max_raw * 100.0).clamp(0.0, 100.0)
                }
                _ => 0.0,
            };
            asset.raa = Some(raa);
        }
        log::info!(
            "Calculated RAA for {} in-scope technical assets (max raw score {:.1})",
            raw_scores.len(),
            max_raw
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::build;
    use serde_json::json;

    fn model() -> ThreatModel {
        build(json!({
            "data_assets": { "Secrets": { "confidentiality": "strictly-confidential", "integrity": "mission-critical" } },
            "technical_assets": {
                "Portal": { "internet": true, "technology": "web-application", "data_assets_processed": ["secrets"] },
                "Batch": {},
                "Legacy": { "out_of_scope": true, "internet": true, "multi_tenant": true }
            }
        }))
    }

    #[test]
    fn test_out_of_scope_is_zero() {
        let mut model = model();
        RaaScorer::new().apply(&mut model);
        assert_eq!(model.technical_asset("legacy").unwrap().raa, Some(0.0));
    }

    #[test]
    fn test_scores_are_normalized() {
        let mut model = model();
        RaaScorer::new().apply(&mut model);
        let portal = model.technical_asset("portal").unwrap().raa();
        let batch = model.technical_asset("batch").unwrap().raa();
        assert!((portal - 100.0).abs() < f64::EPSILON);
        assert!(batch > 0.0 && batch < portal);
        for asset in model.technical_assets() {
            assert!((0.0..=100.0).contains(&asset.raa()));
        }
    }

    #[test]
    fn test_raw_score_components() {
        let model = build(json!({ "technical_assets": { "Plain": {} } }));
        let plain = model.technical_asset("plain").unwrap();
        // internal/operational/operational own + 0.8*8 + 0.8*5 + 0.5*5 from itself
        let expected = 13.0 + 8.0 + 8.0 + 8.0 * 0.8 + 5.0 * 0.8 + 5.0 * 0.5;
        assert!((RaaScorer::new().raw_score(&model, plain) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_all_out_of_scope_scores_zero() {
        let mut model = build(json!({ "technical_assets": { "A": { "out_of_scope": true } } }));
        RaaScorer::new().apply(&mut model);
        assert_eq!(model.technical_asset("a").unwrap().raa(), 0.0);
    }
}
