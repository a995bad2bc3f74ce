use super::neighbor_proximity;
use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

pub struct MissingIdentityProviderIsolation;

impl MissingIdentityProviderIsolation {
    pub const ID: &'static str = "missing-identity-provider-isolation";
}

impl RiskRule for MissingIdentityProviderIsolation {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Identity providers and identity stores should be isolated from other assets by \
                          their own network segmentation trust boundary."
                .into(),
            impact: "A compromised neighbor can attack the identity provider directly, and a compromised \
                     identity provider hands out every identity it manages."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Network Segmentation".into(),
            mitigation: "Place identity-related assets in a dedicated network segment.".into(),
            check: "Are identity-related assets isolated from unrelated assets?".into(),
            detection_logic: "In-scope identity-related assets sharing an execution environment or network \
                              boundary with assets that are neither identity-related nor tolerated close to \
                              high-value targets."
                .into(),
            risk_assessment: "Very high impact for strictly-confidential or mission-critical identity assets, \
                              high otherwise. Likely when sharing an execution environment."
                .into(),
            false_positives: "Segments that are further separated by means not expressed in the model.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Identity Provider Isolation",
                RiskFunction::Operations,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model
            .in_scope_technical_assets()
            .filter(|asset| asset.technology.is_identity_related())
        {
            let likelihood = match neighbor_proximity(model, asset, |candidate| {
                !candidate.technology.is_identity_related()
                    && !candidate.technology.is_close_to_high_value_targets_tolerated()
            }) {
                Some(likelihood) => likelihood,
                None => continue,
            };
            let impact = if Sensitivity::of_technical_asset(asset).is_top_rated() {
                RiskExploitationImpact::VeryHigh
            } else {
                RiskExploitationImpact::High
            };
            let place = if likelihood == RiskExploitationLikelihood::Likely {
                "execution environment"
            } else {
                "network segment"
            };
            risks.push(
                Risk::new(
                    &category,
                    likelihood,
                    impact,
                    format!(
                        "Missing Identity Provider Isolation to further encapsulate and protect \
                         identity-related asset {} against unrelated lower protected assets in the same {}",
                        asset.title, place
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

    #[test]
    fn test_idp_next_to_application() {
        let model = scored(json!({
            "technical_assets": {
                "Idp": { "technology": "identity-provider", "integrity": "mission-critical" },
                "Ldap": { "technology": "identity-store-ldap" },
                "Proxy": { "technology": "reverse-proxy" },
                "App": { "technology": "application-server" }
            },
            "trust_boundaries": {
                "Lan": { "technical_assets_inside": ["idp", "ldap", "proxy", "app"] }
            }
        }));
        let risks = MissingIdentityProviderIsolation.generate_risks(&model).unwrap();
        let ids: Vec<&str> = risks.iter().map(|r| r.synthetic_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "missing-identity-provider-isolation@idp",
                "missing-identity-provider-isolation@ldap"
            ]
        );
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::VeryHigh);
        assert_eq!(risks[1].exploitation_impact, RiskExploitationImpact::High);
    }

    #[test]
    fn test_tolerated_neighbors_only() {
        let model = scored(json!({
            "technical_assets": {
                "Idp": { "technology": "identity-provider" },
                "Probe": { "technology": "monitoring" }
            },
            "trust_boundaries": { "Lan": { "technical_assets_inside": ["idp", "probe"] } }
        }));
        assert!(MissingIdentityProviderIsolation.generate_risks(&model).unwrap().is_empty());
    }
}
