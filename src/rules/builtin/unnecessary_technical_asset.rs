use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

pub struct UnnecessaryTechnicalAsset;

impl UnnecessaryTechnicalAsset {
    pub const ID: &'static str = "unnecessary-technical-asset";
}

impl RiskRule for UnnecessaryTechnicalAsset {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Technical assets that neither handle data nor communicate add attack surface \
                          without purpose."
                .into(),
            impact: "Forgotten assets are rarely patched and may serve as a foothold.".into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Attack Surface Reduction".into(),
            mitigation: "Remove the asset, or complete the model if it is actually used.".into(),
            check: "Is the asset really needed?".into(),
            detection_logic: "In-scope assets that process or store no data, or have no incoming and no \
                              outgoing communication links."
                .into(),
            risk_assessment: "Always low.".into(),
            false_positives: "Incomplete models.".into(),
            model_failure_possible_reason: true,
            ..RiskCategory::new(
                Self::ID,
                "Unnecessary Technical Asset",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        Ok(model
            .in_scope_technical_assets()
            .filter(|asset| {
                let no_data =
                    asset.data_assets_processed.is_empty() && asset.data_assets_stored.is_empty();
                let no_links = asset.communication_links.is_empty()
                    && model.incoming_links(&asset.id).is_empty();
                no_data || no_links
            })
            .map(|asset| {
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    RiskExploitationImpact::Low,
                    format!("Unnecessary Technical Asset named {}", asset.title),
                    synthetic_id(Self::ID, &[&asset.id]),
                )
                .with_fixed_severity(RiskSeverity::Low)
                .with_technical_asset(&asset.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()])
            })
            .collect())
    }
}
