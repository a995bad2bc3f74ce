use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;
use std::collections::BTreeSet;

pub struct UnnecessaryDataAsset;

impl UnnecessaryDataAsset {
    pub const ID: &'static str = "unnecessary-data-asset";
}

impl RiskRule for UnnecessaryDataAsset {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Data assets that no technical asset processes, stores or transfers should not be \
                          kept."
                .into(),
            impact: "Data that is kept without need can still leak.".into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Attack Surface Reduction".into(),
            mitigation: "Delete the data asset, or complete the model where it is used.".into(),
            check: "Is the data asset really needed?".into(),
            detection_logic: "Data assets not referenced by any technical asset or communication link.".into(),
            risk_assessment: "Always low.".into(),
            false_positives: "Incomplete models.".into(),
            model_failure_possible_reason: true,
            ..RiskCategory::new(
                Self::ID,
                "Unnecessary Data Asset",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut used: BTreeSet<&str> = BTreeSet::new();
        for asset in model.technical_assets() {
            used.extend(asset.data_assets_processed_or_stored());
            for link in &asset.communication_links {
                used.extend(link.data_assets_sent.iter().map(String::as_str));
                used.extend(link.data_assets_received.iter().map(String::as_str));
            }
        }
        Ok(model
            .data_assets()
            .filter(|data| !used.contains(data.id.as_str()))
            .map(|data| {
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    RiskExploitationImpact::Low,
                    format!("Unnecessary Data Asset named {}", data.title),
                    synthetic_id(Self::ID, &[&data.id]),
                )
                .with_fixed_severity(RiskSeverity::Low)
                .with_data_asset(&data.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![data.id.clone()])
            })
            .collect())
    }
}
