use super::neighbor_proximity;
use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

/// Vaults sharing a segment or execution environment with unrelated assets.
pub struct MissingVaultIsolation;

impl MissingVaultIsolation {
    pub const ID: &'static str = "missing-vault-isolation";
}

impl RiskRule for MissingVaultIsolation {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Highly sensitive vault assets and their datastores should be isolated from other \
                          assets by their own network segmentation trust boundary."
                .into(),
            impact: "An attacker who compromises a neighboring asset can attack the vault from inside its \
                     network segment."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Network Segmentation".into(),
            mitigation: "Place vaults and their storage in a dedicated network segment.".into(),
            check: "Is the vault isolated from unrelated assets?".into(),
            detection_logic: "In-scope vaults sharing an execution environment or network boundary with \
                              assets that are neither vaults nor the vault's own datastores."
                .into(),
            risk_assessment: "High impact for strictly-confidential or mission-critical vaults, medium \
                              otherwise. Likely when sharing an execution environment."
                .into(),
            false_positives: "Segments that are further separated by means not expressed in the model.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Vault Isolation",
                RiskFunction::Operations,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for vault in model
            .in_scope_technical_assets()
            .filter(|asset| asset.technology == Technology::Vault)
        {
            let is_vault_storage = |candidate: &TechnicalAsset| {
                candidate.asset_type == TechnicalAssetType::Datastore
                    && model.has_direct_connection(&vault.id, &candidate.id)
            };
            let likelihood = match neighbor_proximity(model, vault, |candidate| {
                candidate.technology != Technology::Vault && !is_vault_storage(candidate)
            }) {
                Some(likelihood) => likelihood,
                None => continue,
            };
            let impact = if Sensitivity::of_technical_asset(vault).is_top_rated() {
                RiskExploitationImpact::High
            } else {
                RiskExploitationImpact::Medium
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
                        "Missing Vault Isolation to further encapsulate and protect vault-related asset {} \
                         against unrelated lower protected assets in the same {}",
                        vault.title, place
                    ),
                    synthetic_id(Self::ID, &[&vault.id]),
                )
                .with_technical_asset(&vault.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![vault.id.clone()]),
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
    fn test_vault_with_unrelated_neighbor() {
        let model = scored(json!({
            "technical_assets": {
                "Vault": {
                    "technology": "vault",
                    "confidentiality": "strictly-confidential",
                    "communication_links": { "Persist": { "target": "vault-db", "protocol": "jdbc-encrypted" } }
                },
                "Vault Db": { "type": "datastore", "technology": "database" },
                "Shop": { "technology": "web-application" }
            },
            "trust_boundaries": {
                "Lan": { "type": "network-on-prem", "technical_assets_inside": ["vault", "vault-db", "shop"] }
            }
        }));
        let risks = MissingVaultIsolation.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "missing-vault-isolation@vault");
        assert_eq!(risks[0].exploitation_likelihood, RiskExploitationLikelihood::Unlikely);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
    }

    #[test]
    fn test_vault_storage_only_is_isolated() {
        let model = scored(json!({
            "technical_assets": {
                "Vault": {
                    "technology": "vault",
                    "communication_links": { "Persist": { "target": "vault-db", "protocol": "jdbc-encrypted" } }
                },
                "Vault Db": { "type": "datastore" },
                "Shop": {}
            },
            "trust_boundaries": {
                "Secure": { "technical_assets_inside": ["vault", "vault-db"] },
                "Lan": { "technical_assets_inside": ["shop"] }
            }
        }));
        assert!(MissingVaultIsolation.generate_risks(&model).unwrap().is_empty());
    }

    #[test]
    fn test_same_execution_environment_is_likely() {
        let model = scored(json!({
            "technical_assets": { "Vault": { "technology": "vault" }, "App": {} },
            "trust_boundaries": {
                "Host": { "type": "execution-environment", "technical_assets_inside": ["vault", "app"] }
            }
        }));
        let risks = MissingVaultIsolation.generate_risks(&model).unwrap();
        assert_eq!(risks[0].exploitation_likelihood, RiskExploitationLikelihood::Likely);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
        assert!(risks[0].title.contains("execution environment"));
    }
}
