use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

/// Access to availability-critical assets from across a network boundary.
///
/// Traffic forwarded by a load-balancer, reverse-proxy or WAF is attributed
/// to the forwarder's own callers.
pub struct DosRiskyAccessAcrossTrustBoundary;

impl DosRiskyAccessAcrossTrustBoundary {
    pub const ID: &'static str = "dos-risky-access-across-trust-boundary";

    fn check(
        &self,
        model: &ThreatModel,
        category: &RiskCategory,
        asset: &TechnicalAsset,
        access: &CommunicationLink,
        hop: Option<&TechnicalAsset>,
        risks: &mut Vec<Risk>,
    ) {
        if !model.is_across_trust_boundary_network_only(access)
            || access.protocol.is_process_local()
            || access.usage == Usage::DevOps
        {
            return;
        }
        let caller = match model.technical_asset(&access.source_id) {
            Some(caller) => caller,
            None => return,
        };
        let more_risky = asset.availability == Criticality::MissionCritical
            && !access.vpn
            && !access.ip_filtered
            && !asset.redundant;
        let impact = if more_risky {
            RiskExploitationImpact::Medium
        } else {
            RiskExploitationImpact::Low
        };
        let mut title = format!(
            "Denial-of-Service risky access of {} by {} via {}",
            asset.title, caller.title, access.title
        );
        if let Some(hop) = hop {
            title.push_str(&format!(" forwarded via {}", hop.title));
        }
        risks.push(
            Risk::new(
                category,
                RiskExploitationLikelihood::Unlikely,
                impact,
                title,
                synthetic_id(Self::ID, &[&asset.id, &caller.id, &access.id]),
            )
            .with_technical_asset(&asset.id)
            .with_communication_link(&access.id)
            .with_data_breach(DataBreachProbability::Improbable, Vec::new()),
        );
    }
}

impl RiskRule for DosRiskyAccessAcrossTrustBoundary {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Assets with high availability requirements accessed from across a network trust \
                          boundary are exposed to denial-of-service attempts."
                .into(),
            impact: "Attackers outside the boundary may exhaust the asset and interrupt the business process \
                     it supports."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Denial_of_Service_Cheat_Sheet.html"
                .into(),
            action: "Anti-DoS Measures".into(),
            mitigation: "Apply rate limiting, IP filtering or VPN access to the link, or run the asset \
                         redundantly."
                .into(),
            check: "Are anti-DoS measures in place for links across trust boundaries?".into(),
            detection_logic: "In-scope assets other than load-balancers with availability critical or higher, \
                              reached by non-local, non-devops links across a network boundary. Forwarders \
                              are looked through to their callers."
                .into(),
            risk_assessment: "Medium impact for mission-critical assets reached without VPN or IP filtering \
                              and not redundant, low otherwise."
                .into(),
            false_positives: "Links already protected by anti-DoS infrastructure not expressed in the model."
                .into(),
            ..RiskCategory::new(
                Self::ID,
                "DoS-risky Access Across Trust-Boundary",
                RiskFunction::Operations,
                Stride::DenialOfService,
                400,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.in_scope_technical_assets() {
            if asset.technology == Technology::LoadBalancer
                || asset.availability < Criticality::Critical
            {
                continue;
            }
            for access in model.incoming_links(&asset.id) {
                let source = match model.technical_asset(&access.source_id) {
                    Some(source) => source,
                    None => continue,
                };
                if source.technology.is_traffic_forwarding() {
                    for forwarded in model.incoming_links(&source.id) {
                        self.check(model, &category, asset, forwarded, Some(source), &mut risks);
                    }
                } else {
                    self.check(model, &category, asset, access, None, &mut risks);
                }
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
    fn test_direct_access_across_boundary() {
        let model = scored(json!({
            "technical_assets": {
                "Client": { "communication_links": { "Call": { "target": "api", "protocol": "https" } } },
                "Api": { "availability": "mission-critical" }
            },
            "trust_boundaries": {
                "Office": { "technical_assets_inside": ["client"] },
                "Backend": { "technical_assets_inside": ["api"] }
            }
        }));
        let risks = DosRiskyAccessAcrossTrustBoundary.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "dos-risky-access-across-trust-boundary@api@client@client>call");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
        assert!(risks[0].data_breach_technical_asset_ids.is_empty());
    }

    #[test]
    fn test_forwarder_is_looked_through() {
        let model = scored(json!({
            "technical_assets": {
                "Client": { "communication_links": { "Enter": { "target": "lb", "protocol": "https" } } },
                "Lb": {
                    "technology": "load-balancer",
                    "communication_links": { "Forward": { "target": "api", "protocol": "https" } }
                },
                "Api": { "availability": "critical" }
            },
            "trust_boundaries": {
                "Office": { "technical_assets_inside": ["client"] },
                "Backend": { "technical_assets_inside": ["lb", "api"] }
            }
        }));
        let risks = DosRiskyAccessAcrossTrustBoundary.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "dos-risky-access-across-trust-boundary@api@client@client>enter");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Low);
        assert!(risks[0].title.ends_with("forwarded via Lb"));
    }

    #[test]
    fn test_protected_or_devops_access_passes() {
        let model = scored(json!({
            "technical_assets": {
                "Ops": { "communication_links": { "Deploy": { "target": "api", "protocol": "ssh", "usage": "devops" } } },
                "Api": { "availability": "mission-critical" }
            },
            "trust_boundaries": { "Backend": { "technical_assets_inside": ["api"] } }
        }));
        assert!(DosRiskyAccessAcrossTrustBoundary.generate_risks(&model).unwrap().is_empty());
    }
}
