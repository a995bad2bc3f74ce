use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

const RAA_LIMIT: f64 = 55.0;
const RAA_LIMIT_REDUCED: f64 = 40.0;

/// Attractive assets that need explicit hardening.
pub struct MissingHardening;

impl MissingHardening {
    pub const ID: &'static str = "missing-hardening";

    fn exceeds_limit(asset: &TechnicalAsset) -> bool {
        let high_value = asset.asset_type == TechnicalAssetType::Datastore
            || matches!(
                asset.technology,
                Technology::ApplicationServer | Technology::IdentityProvider | Technology::Erp
            );
        asset.raa() >= RAA_LIMIT || (high_value && asset.raa() >= RAA_LIMIT_REDUCED)
    }
}

impl RiskRule for MissingHardening {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: format!(
                "Technical assets with an RAA of {}% or higher should be explicitly hardened against \
                 attacks.",
                RAA_LIMIT
            ),
            impact: "Unhardened attractive assets are easier to compromise with known techniques.".into(),
            asvs: "V14 - Configuration Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "System Hardening".into(),
            mitigation: "Apply vendor and community hardening guides, remove unused features and keep the \
                         system patched."
                .into(),
            check: "Are hardening guides applied and verified regularly?".into(),
            detection_logic: format!(
                "In-scope assets with RAA of {}% or higher. For datastores, application servers, identity \
                 providers and ERP systems the limit is {}%.",
                RAA_LIMIT, RAA_LIMIT_REDUCED
            ),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical assets, low \
                              otherwise."
                .into(),
            false_positives: "Assets that are already hardened.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Hardening",
                RiskFunction::Operations,
                Stride::Tampering,
                16,
            )
        }
    }

    fn supported_tags(&self) -> Vec<String> {
        vec!["tomcat".into()]
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        Ok(model
            .in_scope_technical_assets()
            .filter(|asset| Self::exceeds_limit(asset))
            .map(|asset| {
                let impact = if asset.confidentiality == Confidentiality::StrictlyConfidential
                    || asset.integrity == Criticality::MissionCritical
                {
                    RiskExploitationImpact::Medium
                } else {
                    RiskExploitationImpact::Low
                };
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Likely,
                    impact,
                    format!("Missing Hardening risk at {}", asset.title),
                    synthetic_id(Self::ID, &[&asset.id]),
                )
                .with_technical_asset(&asset.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scored;
    use serde_json::json;

    #[test]
    fn test_most_attractive_asset_needs_hardening() {
        let model = scored(json!({
            "technical_assets": {
                "Portal": { "internet": true, "integrity": "mission-critical", "technology": "web-server" },
                "Job": {}
            }
        }));
        let risks = MissingHardening.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "missing-hardening@portal");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
        assert_eq!(risks[0].severity, RiskSeverity::Elevated);
    }

    #[test]
    fn test_reduced_limit_for_datastores() {
        let mut model = scored(json!({
            "technical_assets": {
                "Db": { "type": "datastore" },
                "Proc": {}
            }
        }));
        for asset in model.technical_assets_mut() {
            asset.raa = Some(45.0);
        }
        let risks = MissingHardening.generate_risks(&model).unwrap();
        let ids: Vec<&str> = risks.iter().map(|r| r.synthetic_id.as_str()).collect();
        assert_eq!(ids, vec!["missing-hardening@db"]);
    }
}
