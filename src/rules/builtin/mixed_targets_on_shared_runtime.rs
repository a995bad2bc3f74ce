use crate::errors::ThreatResult;
use crate::graph::{Sensitivity, ThreatModel};
use crate::models::*;
use crate::rules::RiskRule;

/// Unrelated or frontend/backend-mixed assets co-located on one runtime.
pub struct MixedTargetsOnSharedRuntime;

impl MixedTargetsOnSharedRuntime {
    pub const ID: &'static str = "mixed-targets-on-shared-runtime";

    fn is_mixed(model: &ThreatModel, runtime: &SharedRuntime) -> bool {
        let mut boundary: Option<Option<&str>> = None;
        let mut frontend = false;
        let mut backend = false;
        for id in &runtime.technical_assets_running {
            let asset = match model.technical_asset(id) {
                Some(asset) => asset,
                None => continue,
            };
            let current = model.trust_boundary_of(id).map(|tb| tb.id.as_str());
            match boundary {
                None => boundary = Some(current),
                Some(first) if first != current => return true,
                Some(_) => {}
            }
            frontend |= asset.technology.is_exclusively_frontend();
            backend |= asset.technology.is_exclusively_backend();
        }
        frontend && backend
    }
}

impl RiskRule for MixedTargetsOnSharedRuntime {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Different attacker targets (frontend and backend, or assets of different trust \
                          boundaries) should not run on the same shared runtime."
                .into(),
            impact: "An attacker who compromises a less valuable target on the runtime may move on to a more \
                     valuable one running next to it."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                .into(),
            action: "Runtime Separation".into(),
            mitigation: "Use separate runtimes for frontend and backend components and for assets of different \
                         trust boundaries."
                .into(),
            check: "Are frontend and backend components running on separate runtimes?".into(),
            detection_logic: "Shared runtimes with at least two assets that either sit in different trust \
                              boundaries or mix exclusively-frontend with exclusively-backend technologies."
                .into(),
            risk_assessment: "Medium impact if any running asset is strictly confidential or mission critical, \
                              low otherwise."
                .into(),
            false_positives: "Runtimes whose co-located assets are isolated by mechanisms the model does not \
                              express."
                .into(),
            ..RiskCategory::new(
                Self::ID,
                "Mixed Targets on Shared Runtime",
                RiskFunction::Operations,
                Stride::ElevationOfPrivilege,
                1008,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for runtime in model.shared_runtimes() {
            if runtime.technical_assets_running.len() < 2 || !Self::is_mixed(model, runtime) {
                continue;
            }
            let more_risky = runtime
                .technical_assets_running
                .iter()
                .filter_map(|id| model.technical_asset(id))
                .any(|asset| Sensitivity::of_technical_asset(asset).is_top_rated());
            let impact = if more_risky {
                RiskExploitationImpact::Medium
            } else {
                RiskExploitationImpact::Low
            };
            let title = format!(
                "Mixed Targets on Shared Runtime named {} might enable attackers moving from one less \
                 valuable target to a more valuable one",
                runtime.title
            );
            risks.push(
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    impact,
                    title,
                    synthetic_id(Self::ID, &[&runtime.id]),
                )
                .with_shared_runtime(&runtime.id)
                .with_data_breach(
                    DataBreachProbability::Improbable,
                    runtime.technical_assets_running.clone(),
                ),
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
    fn test_frontend_and_backend_mix() {
        let model = scored(json!({
            "technical_assets": {
                "Proxy": { "technology": "reverse-proxy" },
                "Db": { "technology": "database", "type": "datastore" }
            },
            "shared_runtimes": { "Host One": { "technical_assets_running": ["proxy", "db"] } }
        }));
        let risks = MixedTargetsOnSharedRuntime.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "mixed-targets-on-shared-runtime@host-one");
        assert_eq!(risks[0].most_relevant_shared_runtime_id.as_deref(), Some("host-one"));
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Low);
        assert_eq!(risks[0].data_breach_technical_asset_ids, vec!["proxy", "db"]);
    }

    #[test]
    fn test_different_boundaries() {
        let model = scored(json!({
            "technical_assets": {
                "A": { "confidentiality": "strictly-confidential" },
                "B": {}
            },
            "trust_boundaries": { "Zone": { "technical_assets_inside": ["a"] } },
            "shared_runtimes": { "Host": { "technical_assets_running": ["a", "b"] } }
        }));
        let risks = MixedTargetsOnSharedRuntime.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
    }

    #[test]
    fn test_homogeneous_runtime_passes() {
        let model = scored(json!({
            "technical_assets": {
                "Api": { "technology": "web-service-rest" },
                "Db": { "technology": "database" }
            },
            "shared_runtimes": {
                "Host": { "technical_assets_running": ["api", "db"] },
                "Solo": { "technical_assets_running": ["api"] }
            }
        }));
        assert!(MixedTargetsOnSharedRuntime.generate_risks(&model).unwrap().is_empty());
    }
}
