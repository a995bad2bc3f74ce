use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

/// Plaintext links carrying sensitive or authentication data.
pub struct UnencryptedCommunication;

impl UnencryptedCommunication {
    pub const ID: &'static str = "unencrypted-communication";
}

fn is_high(data: &DataAsset) -> bool {
    data.confidentiality == Confidentiality::StrictlyConfidential
        || data.integrity == Criticality::MissionCritical
}

fn is_medium(data: &DataAsset) -> bool {
    data.confidentiality >= Confidentiality::Confidential || data.integrity >= Criticality::Critical
}

impl RiskRule for UnencryptedCommunication {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Communication links between technical assets should be encrypted when they carry \
                          sensitive or authentication data."
                .into(),
            impact: "Anyone on the network path can eavesdrop on or manipulate the transferred data.".into(),
            asvs: "V9 - Communication Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Transport_Layer_Protection_Cheat_Sheet.html"
                .into(),
            action: "Encryption of Communication Links".into(),
            mitigation: "Apply transport layer encryption to every link carrying sensitive data or credentials."
                .into(),
            check: "Is every link carrying sensitive data or credentials encrypted in transit?".into(),
            detection_logic: "Unencrypted, non-local links between in-scope assets that transfer \
                              authentication data or confidential or critical data assets. Medium sensitive \
                              data over a VPN is accepted."
                .into(),
            risk_assessment: "High impact for authentication data or strictly-confidential or mission-critical \
                              data, medium otherwise. Likely when the link crosses a network boundary."
                .into(),
            false_positives: "Links between components that tolerate unprotected communication, like \
                              monitoring probes."
                .into(),
            ..RiskCategory::new(
                Self::ID,
                "Unencrypted Communication",
                RiskFunction::Operations,
                Stride::InformationDisclosure,
                319,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for source in model.in_scope_technical_assets() {
            for link in &source.communication_links {
                let target = match model.technical_asset(&link.target_id) {
                    Some(target) if target.is_in_scope() => target,
                    _ => continue,
                };
                let needs_encryption = !link.protocol.is_encrypted()
                    && !link.protocol.is_process_local()
                    && !source.technology.is_unprotected_communications_tolerated()
                    && !target.technology.is_unprotected_communications_tolerated();
                if !needs_encryption {
                    continue;
                }

                let transfers_auth_data = link.authentication != Authentication::None;
                let transferred: Vec<&DataAsset> = link
                    .data_assets_sent
                    .iter()
                    .chain(link.data_assets_received.iter())
                    .filter_map(|id| model.data_asset(id))
                    .collect();
                let high = transferred.iter().any(|data| is_high(data));
                let medium = !link.vpn && transferred.iter().any(|data| is_medium(data));
                if !high && !medium && !transfers_auth_data {
                    continue;
                }

                let high = high || transfers_auth_data;
                let impact = if high {
                    RiskExploitationImpact::High
                } else {
                    RiskExploitationImpact::Medium
                };
                let likelihood = if model.is_across_trust_boundary_network_only(link) {
                    RiskExploitationLikelihood::Likely
                } else {
                    RiskExploitationLikelihood::Unlikely
                };
                let mut title = format!(
                    "Unencrypted Communication named {} between {} and {}",
                    link.title, source.title, target.title
                );
                if transfers_auth_data {
                    title.push_str(" transferring authentication data (like credentials, token, session-id, etc.)");
                }
                if link.vpn && high {
                    title.push_str(
                        " (even VPN-protected connections need to encrypt strictly-confidential or \
                         mission-critical data in transit)",
                    );
                }
                risks.push(
                    Risk::new(
                        &category,
                        likelihood,
                        impact,
                        title,
                        synthetic_id(Self::ID, &[&link.id, &source.id, &target.id]),
                    )
                    .with_technical_asset(&source.id)
                    .with_communication_link(&link.id)
                    .with_data_breach(
                        DataBreachProbability::Possible,
                        vec![target.id.clone(), source.id.clone()],
                    ),
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

    fn model(link: serde_json::Value, boundaries: serde_json::Value) -> ThreatModel {
        scored(json!({
            "data_assets": {
                "Orders": { "confidentiality": "confidential" },
                "Keys": { "confidentiality": "strictly-confidential" },
                "Logs": {}
            },
            "technical_assets": {
                "Web": { "communication_links": { "Sync": link } },
                "Db": {}
            },
            "trust_boundaries": boundaries
        }))
    }

    #[test]
    fn test_plaintext_with_confidential_data() {
        let model = model(json!({ "target": "db", "protocol": "jdbc", "data_assets_sent": ["orders"] }), json!({}));
        let risks = UnencryptedCommunication.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.synthetic_id, "unencrypted-communication@web>sync@web@db");
        assert_eq!(risk.exploitation_impact, RiskExploitationImpact::Medium);
        assert_eq!(risk.exploitation_likelihood, RiskExploitationLikelihood::Unlikely);
        assert_eq!(risk.data_breach_technical_asset_ids, vec!["db", "web"]);
    }

    #[test]
    fn test_vpn_covers_medium_but_not_high() {
        let medium = model(
            json!({ "target": "db", "protocol": "jdbc", "vpn": true, "data_assets_sent": ["orders"] }),
            json!({}),
        );
        assert!(UnencryptedCommunication.generate_risks(&medium).unwrap().is_empty());

        let high = model(
            json!({ "target": "db", "protocol": "jdbc", "vpn": true, "data_assets_received": ["keys"] }),
            json!({}),
        );
        let risks = UnencryptedCommunication.generate_risks(&high).unwrap();
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
        assert!(risks[0].title.contains("VPN"));
    }

    #[test]
    fn test_authentication_data_is_high_and_boundary_makes_likely() {
        let model = model(
            json!({ "target": "db", "protocol": "http", "authentication": "credentials", "data_assets_sent": ["logs"] }),
            json!({ "Dmz": { "technical_assets_inside": ["web"] }, "Core": { "technical_assets_inside": ["db"] } }),
        );
        let risks = UnencryptedCommunication.generate_risks(&model).unwrap();
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
        assert_eq!(risks[0].exploitation_likelihood, RiskExploitationLikelihood::Likely);
        assert_eq!(risks[0].severity, RiskSeverity::Elevated);
    }

    #[test]
    fn test_encrypted_protocol_passes() {
        let model = model(json!({ "target": "db", "protocol": "jdbc-encrypted", "data_assets_sent": ["keys"] }), json!({}));
        assert!(UnencryptedCommunication.generate_risks(&model).unwrap().is_empty());
    }
}
