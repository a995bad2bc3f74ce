use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

/// Web applications and services reached across a boundary without a WAF in front.
pub struct MissingWaf;

impl MissingWaf {
    pub const ID: &'static str = "missing-waf";
}

impl RiskRule for MissingWaf {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Web applications and web services reached from across a network boundary should \
                          be protected by a web application firewall."
                .into(),
            impact: "Without a WAF, common web attacks reach the application unfiltered.".into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Virtual_Patching_Cheat_Sheet.html"
                .into(),
            action: "Web Application Firewall (WAF)".into(),
            mitigation: "Place a WAF in front of the web application or service.".into(),
            check: "Is a WAF in place and tuned for the application?".into(),
            detection_logic: "In-scope web applications and web services with an incoming web-protocol link \
                              across a network boundary whose caller is not a WAF."
                .into(),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical assets, low \
                              otherwise."
                .into(),
            false_positives: "Applications protected by filtering not expressed in the model.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Web Application Firewall (WAF)",
                RiskFunction::Operations,
                Stride::Tampering,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model
            .in_scope_technical_assets()
            .filter(|asset| {
                asset.technology.is_web_application() || asset.technology.is_web_service()
            })
        {
            let unguarded = model.incoming_links(&asset.id).into_iter().any(|link| {
                model.is_across_trust_boundary_network_only(link)
                    && link.protocol.is_potential_web_access()
                    && model
                        .technical_asset(&link.source_id)
                        .map(|caller| caller.technology != Technology::Waf)
                        .unwrap_or(false)
            });
            if !unguarded {
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
                    format!("Missing Web Application Firewall (WAF) risk at {}", asset.title),
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

    fn model(caller_technology: &str) -> ThreatModel {
        scored(json!({
            "technical_assets": {
                "Edge": {
                    "technology": caller_technology,
                    "communication_links": { "Serve": { "target": "shop", "protocol": "https" } }
                },
                "Shop": { "technology": "web-application" }
            },
            "trust_boundaries": {
                "Edge Zone": { "technical_assets_inside": ["edge"] },
                "App": { "technical_assets_inside": ["shop"] }
            }
        }))
    }

    #[test]
    fn test_web_app_without_waf() {
        let risks = MissingWaf.generate_risks(&model("browser")).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "missing-waf@shop");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Low);
    }

    #[test]
    fn test_waf_in_front_passes() {
        assert!(MissingWaf.generate_risks(&model("waf")).unwrap().is_empty());
    }

    #[test]
    fn test_caller_outside_every_boundary_passes() {
        let model = scored(json!({
            "technical_assets": {
                "Edge": { "communication_links": { "Serve": { "target": "shop", "protocol": "https" } } },
                "Shop": { "technology": "web-application" }
            },
            "trust_boundaries": { "App": { "technical_assets_inside": ["shop"] } }
        }));
        assert!(MissingWaf.generate_risks(&model).unwrap().is_empty());
    }
}
