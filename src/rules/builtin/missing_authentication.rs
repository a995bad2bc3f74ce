use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

/// Unauthenticated links into assets that handle sensitive data.
pub struct MissingAuthentication;

impl MissingAuthentication {
    pub const ID: &'static str = "missing-authentication";

    fn exempted(technology: Technology) -> bool {
        use Technology::*;
        matches!(technology, LoadBalancer | ReverseProxy | ServiceRegistry | Waf | Ids | Ips)
    }
}

impl RiskRule for MissingAuthentication {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Technical assets (especially multi-tenant systems) should authenticate incoming requests \
                          when they process or store sensitive data."
                .into(),
            impact: "Without authentication an attacker who reaches the asset can read or modify sensitive data \
                     without proving any identity."
                .into(),
            asvs: "V2 - Authentication Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html".into(),
            action: "Authentication of Incoming Requests".into(),
            mitigation: "Require a standard authentication mechanism on every communication link that reaches \
                         sensitive data, for human users and technical callers alike."
                .into(),
            check: "Are recommendations from the linked cheat sheet and ASVS chapter applied?".into(),
            detection_logic: "In-scope assets (except load-balancers, reverse-proxies, service registries, WAFs, \
                              IDS and IPS) that handle confidential, critical or multi-tenant data and receive \
                              a non-local link with authentication none from a caller that is neither a \
                              datastore nor a component tolerating unprotected communication."
                .into(),
            risk_assessment: "Impact is high for strictly-confidential or mission-critical data on the link, low \
                              for public or internal data with at most operational integrity, medium otherwise."
                .into(),
            false_positives: "Links whose callers are authenticated by other means not expressed in the model."
                .into(),
            ..RiskCategory::new(
                Self::ID,
                "Missing Authentication",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                306,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.in_scope_technical_assets() {
            if Self::exempted(asset.technology) {
                continue;
            }
            let highest = model.asset_sensitivity(asset);
            let sensitive = highest.confidentiality >= Confidentiality::Confidential
                || highest.integrity >= Criticality::Critical
                || highest.availability >= Criticality::Critical;
            if !sensitive && !asset.multi_tenant {
                continue;
            }
            for link in model.incoming_links(&asset.id) {
                let caller = match model.technical_asset(&link.source_id) {
                    Some(caller) => caller,
                    None => continue,
                };
                if caller.technology.is_unprotected_communications_tolerated()
                    || caller.asset_type == TechnicalAssetType::Datastore
                    || link.protocol.is_process_local()
                    || link.authentication != Authentication::None
                {
                    continue;
                }
                let carried = model.link_sensitivity(link);
                let impact = if carried.confidentiality == Confidentiality::StrictlyConfidential
                    || carried.integrity == Criticality::MissionCritical
                {
                    RiskExploitationImpact::High
                } else if carried.confidentiality <= Confidentiality::Internal
                    && carried.integrity <= Criticality::Operational
                {
                    RiskExploitationImpact::Low
                } else {
                    RiskExploitationImpact::Medium
                };
                let title = format!(
                    "Missing Authentication covering communication link {} from {} to {}",
                    link.title, caller.title, asset.title
                );
                risks.push(
                    Risk::new(
                        &category,
                        RiskExploitationLikelihood::Likely,
                        impact,
                        title,
                        synthetic_id(Self::ID, &[&link.id, &caller.id, &asset.id]),
                    )
                    .with_technical_asset(&asset.id)
                    .with_communication_link(&link.id)
                    .with_data_breach(DataBreachProbability::Possible, vec![asset.id.clone()]),
                );
            }
        }
        Ok(risks)
    }
}
