use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

pub struct AccidentalSecretLeak;

impl AccidentalSecretLeak {
    pub const ID: &'static str = "accidental-secret-leak";
}

impl RiskRule for AccidentalSecretLeak {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Sourcecode repositories and artifact registries may accidentally receive secrets \
                          such as passwords, keys or tokens."
                .into(),
            impact: "Leaked secrets give attackers direct access to the systems they protect.".into(),
            asvs: "V14 - Configuration Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Secrets_Management_Cheat_Sheet.html"
                .into(),
            action: "Build Pipeline Hardening".into(),
            mitigation: "Scan commits and artifacts for secrets before they are pushed, and rotate any \
                         secret that leaked."
                .into(),
            check: "Is secret scanning in place for repositories and registries?".into(),
            detection_logic: "In-scope sourcecode repositories and artifact registries.".into(),
            risk_assessment: "Impact follows the highest rating of the asset and its data: high for strictly \
                              confidential or mission critical, medium for confidential or critical, low \
                              otherwise."
                .into(),
            false_positives: "Repositories that only hold public content.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Accidental Secret Leak",
                RiskFunction::Operations,
                Stride::InformationDisclosure,
                200,
            )
        }
    }

    fn supported_tags(&self) -> Vec<String> {
        vec!["git".into(), "nexus".into()]
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.in_scope_technical_assets().filter(|asset| {
            matches!(
                asset.technology,
                Technology::SourcecodeRepository | Technology::ArtifactRegistry
            )
        }) {
            let highest = model.asset_sensitivity(asset);
            let impact = if highest.is_top_rated() {
                RiskExploitationImpact::High
            } else if highest.confidentiality >= Confidentiality::Confidential
                || highest.integrity >= Criticality::Critical
                || highest.availability >= Criticality::Critical
            {
                RiskExploitationImpact::Medium
            } else {
                RiskExploitationImpact::Low
            };
            let title = if asset.is_tagged_with_any(&["git"]) {
                format!(
                    "Accidental Secret Leak (Git) risk at {}: Git Leak Prevention",
                    asset.title
                )
            } else {
                format!("Accidental Secret Leak risk at {}", asset.title)
            };
            risks.push(
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    impact,
                    title,
                    synthetic_id(Self::ID, &[&asset.id]),
                )
                .with_technical_asset(&asset.id)
                .with_data_breach(DataBreachProbability::Probable, vec![asset.id.clone()]),
            );
        }
        Ok(risks)
    }
}
