use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

const RAA_LIMIT: f64 = 50.0;

/// Attractive assets sharing a network segment with less protected ones.
pub struct MissingNetworkSegmentation;

impl MissingNetworkSegmentation {
    pub const ID: &'static str = "missing-network-segmentation";

    fn exempted(technology: Technology) -> bool {
        use Technology::*;
        matches!(technology, ReverseProxy | Waf | Ids | Ips | ServiceRegistry)
    }
}

impl RiskRule for MissingNetworkSegmentation {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Highly sensitive assets and datastores in the same network segment as lower \
                          protected assets should be separated by a network segmentation boundary."
                .into(),
            impact: "An attacker who compromises a lower protected asset in the segment can reach the \
                     sensitive asset directly."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Network Segmentation".into(),
            mitigation: "Move sensitive assets into their own network segment.".into(),
            check: "Are sensitive assets separated from lower protected assets?".into(),
            detection_logic: "In-scope assets with RAA of at least 50% that are datastores or handle \
                              confidential or critical data, sharing a network boundary with an unconnected \
                              lower protected asset."
                .into(),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical assets, low \
                              otherwise."
                .into(),
            false_positives: "Segments further separated by means not expressed in the model.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Network Segmentation",
                RiskFunction::Operations,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.in_scope_technical_assets() {
            if Self::exempted(asset.technology) || asset.raa() < RAA_LIMIT {
                continue;
            }
            let sensitive = asset.asset_type == TechnicalAssetType::Datastore
                || asset.confidentiality >= Confidentiality::Confidential
                || asset.integrity >= Criticality::Critical
                || asset.availability >= Criticality::Critical;
            if !sensitive {
                continue;
            }
            let exposed = model.in_scope_technical_assets().any(|other| {
                other.id != asset.id
                    && !other.technology.is_close_to_high_value_targets_tolerated()
                    && other.technology.is_less_protected_type()
                    && model.is_same_trust_boundary_network_only(&asset.id, &other.id)
                    && !model.has_direct_connection(&asset.id, &other.id)
            });
            if !exposed {
                continue;
            }
            let impact = if Sensitivity::of_technical_asset(asset).is_top_rated() {
                RiskExploitationImpact::Medium
            } else {
                RiskExploitationImpact::Low
            };
            risks.push(
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    impact,
                    format!(
                        "Missing Network Segmentation to further encapsulate and protect {} against \
                         unrelated lower protected assets in the same network segment",
                        asset.title
                    ),
                    synthetic_id(Self::ID, &[&asset.id]),
                )
                .with_technical_asset(&asset.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()]),
            );
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scored;
    use serde_json::json;

    fn model(db_links: serde_json::Value) -> ThreatModel {
        scored(json!({
            "technical_assets": {
                "Db": {
                    "type": "datastore",
                    "technology": "database",
                    "confidentiality": "strictly-confidential",
                    "internet": true,
                    "communication_links": db_links
                },
                "Cms": { "technology": "cms" }
            },
            "trust_boundaries": { "Lan": { "technical_assets_inside": ["db", "cms"] } }
        }))
    }

    #[test]
    fn test_unconnected_less_protected_neighbor() {
        let model = model(json!({}));
        let risks = MissingNetworkSegmentation.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "missing-network-segmentation@db");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
    }

    #[test]
    fn test_connected_neighbor_is_expected() {
        let model = model(json!({ "Replicate": { "target": "cms", "protocol": "https" } }));
        assert!(MissingNetworkSegmentation.generate_risks(&model).unwrap().is_empty());
    }
}
