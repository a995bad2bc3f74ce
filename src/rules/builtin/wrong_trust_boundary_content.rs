use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

/// Non-container assets placed inside a namespace-isolation boundary.
pub struct WrongTrustBoundaryContent;

impl WrongTrustBoundaryContent {
    pub const ID: &'static str = "wrong-trust-boundary-content";
}

impl RiskRule for WrongTrustBoundaryContent {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Network policy namespace isolation boundaries can only contain containers or \
                          serverless functions."
                .into(),
            impact: "The modeled isolation does not apply to the asset, so its real exposure is higher than \
                     the diagram suggests."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Model Consistency".into(),
            mitigation: "Move the asset into a fitting boundary, or correct its machine type.".into(),
            check: "Are the contents of namespace isolation boundaries all containers or functions?".into(),
            detection_logic: "Assets directly inside a network-policy-namespace-isolation boundary whose \
                              machine is neither container nor serverless."
                .into(),
            risk_assessment: "Always low.".into(),
            false_positives: "Assets with a wrongly modeled machine type.".into(),
            model_failure_possible_reason: true,
            ..RiskCategory::new(
                Self::ID,
                "Wrong Trust Boundary Content",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for boundary in model
            .trust_boundaries()
            .filter(|tb| tb.boundary_type == TrustBoundaryType::NetworkPolicyNamespaceIsolation)
        {
            for asset in boundary
                .technical_assets_inside
                .iter()
                .filter_map(|id| model.technical_asset(id))
            {
                if matches!(
                    asset.machine,
                    TechnicalAssetMachine::Container | TechnicalAssetMachine::Serverless
                ) {
                    continue;
                }
                risks.push(
                    Risk::new(
                        &category,
                        RiskExploitationLikelihood::Unlikely,
                        RiskExploitationImpact::Low,
                        format!(
                            "Wrong Trust Boundary Content (non-container asset inside network-policy-namespace-isolation boundary) at {}",
                            asset.title
                        ),
                        synthetic_id(Self::ID, &[&asset.id]),
                    )
                    .with_fixed_severity(RiskSeverity::Low)
                    .with_technical_asset(&asset.id)
                    .with_trust_boundary(&boundary.id)
                    .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()]),
                );
            }
        }
        Ok(risks)
    }
}
