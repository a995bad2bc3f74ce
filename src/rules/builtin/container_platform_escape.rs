use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

pub struct ContainerPlatformEscape;

impl ContainerPlatformEscape {
    pub const ID: &'static str = "container-platform-escape";
}

impl RiskRule for ContainerPlatformEscape {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Container platforms are attractive targets, since a container escape exposes every \
                          workload the platform runs."
                .into(),
            impact: "An attacker breaking out of a container may take over the platform and all containers \
                     on it."
                .into(),
            asvs: "V14 - Configuration Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Docker_Security_Cheat_Sheet.html".into(),
            action: "Container Infrastructure Hardening".into(),
            mitigation: "Harden the platform: run containers rootless with minimal capabilities, apply \
                         seccomp and AppArmor profiles, and keep the platform patched."
                .into(),
            check: "Is the container platform hardened according to current benchmarks?".into(),
            detection_logic: "In-scope assets of technology container-platform.".into(),
            risk_assessment: "High impact for strictly-confidential or mission-critical platforms, medium \
                              otherwise."
                .into(),
            false_positives: "Platforms that are already hardened.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Container Platform Escape",
                RiskFunction::Operations,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn supported_tags(&self) -> Vec<String> {
        vec!["docker".into(), "kubernetes".into(), "openshift".into()]
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let containers: Vec<String> = model
            .technical_assets()
            .filter(|asset| asset.machine == TechnicalAssetMachine::Container)
            .map(|asset| asset.id.clone())
            .collect();
        let mut risks = Vec::new();
        for platform in model
            .in_scope_technical_assets()
            .filter(|asset| asset.technology == Technology::ContainerPlatform)
        {
            let impact = if Sensitivity::of_technical_asset(platform).is_top_rated() {
                RiskExploitationImpact::High
            } else {
                RiskExploitationImpact::Medium
            };
            let mut breached = containers.clone();
            if !breached.contains(&platform.id) {
                breached.push(platform.id.clone());
            }
            risks.push(
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    impact,
                    format!("Container Platform Escape risk at {}", platform.title),
                    synthetic_id(Self::ID, &[&platform.id]),
                )
                .with_technical_asset(&platform.id)
                .with_data_breach(DataBreachProbability::Probable, breached),
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
    fn test_platform_breach_covers_containers() {
        let model = scored(json!({
            "technical_assets": {
                "K8s": { "technology": "container-platform", "availability": "mission-critical" },
                "Pod A": { "machine": "container" },
                "Pod B": { "machine": "container" },
                "Vm": {}
            }
        }));
        let risks = ContainerPlatformEscape.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "container-platform-escape@k8s");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
        assert_eq!(risks[0].data_breach_technical_asset_ids, vec!["pod-a", "pod-b", "k8s"]);
    }

    #[test]
    fn test_reports_tags() {
        assert!(ContainerPlatformEscape.supported_tags().contains(&"kubernetes".to_string()));
    }
}
