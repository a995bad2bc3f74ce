use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

pub struct UnnecessaryCommunicationLink;

impl UnnecessaryCommunicationLink {
    pub const ID: &'static str = "unnecessary-communication-link";
}

impl RiskRule for UnnecessaryCommunicationLink {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Communication links that transfer no data assets should not exist.".into(),
            impact: "Every open path between assets is a path an attacker may use.".into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Attack Surface Reduction".into(),
            mitigation: "Remove the link, or model the data it transfers.".into(),
            check: "Is the communication link really needed?".into(),
            detection_logic: "Links without sent or received data assets where at least one end is in scope."
                .into(),
            risk_assessment: "Always low.".into(),
            false_positives: "Incomplete models.".into(),
            model_failure_possible_reason: true,
            ..RiskCategory::new(
                Self::ID,
                "Unnecessary Communication Link",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.technical_assets() {
            for link in asset.communication_links.iter().filter(|link| !link.carries_data()) {
                let target_in_scope = model
                    .technical_asset(&link.target_id)
                    .map(TechnicalAsset::is_in_scope)
                    .unwrap_or(false);
                if asset.out_of_scope && !target_in_scope {
                    continue;
                }
                risks.push(
                    Risk::new(
                        &category,
                        RiskExploitationLikelihood::Unlikely,
                        RiskExploitationImpact::Low,
                        format!(
                            "Unnecessary Communication Link titled {} at technical asset {}",
                            link.title, asset.title
                        ),
                        synthetic_id(Self::ID, &[&link.id, &asset.id]),
                    )
                    .with_fixed_severity(RiskSeverity::Low)
                    .with_technical_asset(&asset.id)
                    .with_communication_link(&link.id)
                    .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()]),
                );
            }
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
    fn test_empty_links_flagged_unless_both_ends_out_of_scope() {
        let model = scored(json!({
            "data_assets": { "Orders": {} },
            "technical_assets": {
                "A": {
                    "communication_links": {
                        "Ping": { "target": "b" },
                        "Push": { "target": "b", "data_assets_sent": ["orders"] }
                    }
                },
                "B": {},
                "X": { "out_of_scope": true, "communication_links": { "Noop": { "target": "y" } } },
                "Y": { "out_of_scope": true }
            }
        }));
        let risks = UnnecessaryCommunicationLink.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "unnecessary-communication-link@a>ping@a");
        assert_eq!(risks[0].most_relevant_communication_link_id.as_deref(), Some("a>ping"));
    }
}
