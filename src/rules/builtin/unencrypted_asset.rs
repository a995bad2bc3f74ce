use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

/// Sensitive assets stored or processed without encryption at rest.
pub struct UnencryptedAsset;

impl UnencryptedAsset {
    pub const ID: &'static str = "unencrypted-asset";

    /// Pass-through and embedded components never hold data at rest.
    fn is_waived(asset: &TechnicalAsset) -> bool {
        use Technology::*;
        matches!(
            asset.technology,
            ReverseProxy | LoadBalancer | Waf | Ids | Ips | Library
        )
    }
}

impl RiskRule for UnencryptedAsset {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Technical assets handling confidential or critical data should encrypt it at rest."
                .into(),
            impact: "Anyone with access to the underlying storage, backups or hosting can read or alter the \
                     data."
                .into(),
            asvs: "V6 - Stored Cryptography Verification Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Cryptographic_Storage_Cheat_Sheet.html"
                .into(),
            action: "Encryption of Technical Asset".into(),
            mitigation: "Encrypt sensitive data at rest, using end-user individual keys for highly sensitive \
                         end-user data."
                .into(),
            check: "Is stored data encrypted with keys managed outside the storage itself?".into(),
            detection_logic: "In-scope assets with confidential data or critical integrity whose encryption \
                              is none, or which store strictly-confidential end-user data with only shared \
                              or transparent keys."
                .into(),
            risk_assessment: "High impact for strictly-confidential or mission-critical data without any \
                              encryption, medium otherwise."
                .into(),
            false_positives: "Assets that never persist the data they process.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Unencrypted Technical Assets",
                RiskFunction::Operations,
                Stride::InformationDisclosure,
                311,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for asset in model.in_scope_technical_assets() {
            if Self::is_waived(asset) {
                continue;
            }
            let highest = model.asset_sensitivity(asset);
            if highest.confidentiality < Confidentiality::Confidential
                && highest.integrity < Criticality::Critical
            {
                continue;
            }
            let very_sensitive = highest.confidentiality == Confidentiality::StrictlyConfidential
                || highest.integrity == Criticality::MissionCritical;
            let needs_enduser_key =
                very_sensitive && asset.technology.is_usually_storing_enduser_data();

            let impact = match asset.encryption {
                EncryptionStyle::None if very_sensitive => RiskExploitationImpact::High,
                EncryptionStyle::None => RiskExploitationImpact::Medium,
                EncryptionStyle::DataWithEnduserIndividualKey => continue,
                _ if needs_enduser_key => RiskExploitationImpact::Medium,
                _ => continue,
            };

            let mut title = format!("Unencrypted Technical Asset named {}", asset.title);
            if needs_enduser_key {
                title.push_str(" missing enduser-individual encryption (like data-with-enduser-individual-key)");
            }
            risks.push(
                Risk::new(
                    &category,
                    RiskExploitationLikelihood::Unlikely,
                    impact,
                    title,
                    synthetic_id(Self::ID, &[&asset.id]),
                )
                .with_technical_asset(&asset.id)
                .with_data_breach(DataBreachProbability::Improbable, vec![asset.id.clone()]),
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
    fn test_unencrypted_sensitive_asset() {
        let model = scored(json!({
            "data_assets": { "Cards": { "confidentiality": "strictly-confidential" } },
            "technical_assets": {
                "Store": { "technology": "file-server", "data_assets_stored": ["cards"] },
                "Cache": { "confidentiality": "confidential" },
                "Plain": {}
            }
        }));
        let risks = UnencryptedAsset.generate_risks(&model).unwrap();
        let ids: Vec<&str> = risks.iter().map(|r| r.synthetic_id.as_str()).collect();
        assert_eq!(ids, vec!["unencrypted-asset@cache", "unencrypted-asset@store"]);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
        assert_eq!(risks[1].exploitation_impact, RiskExploitationImpact::High);
        assert!(risks[1].title.contains("enduser-individual"));
    }

    #[test]
    fn test_shared_key_needs_enduser_key_for_enduser_stores() {
        let model = scored(json!({
            "technical_assets": {
                "Db": {
                    "technology": "database",
                    "confidentiality": "strictly-confidential",
                    "encryption": "data-with-symmetric-shared-key"
                },
                "App": {
                    "technology": "application-server",
                    "confidentiality": "strictly-confidential",
                    "encryption": "transparent"
                }
            }
        }));
        let risks = UnencryptedAsset.generate_risks(&model).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "unencrypted-asset@db");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
    }

    #[test]
    fn test_waived_technologies() {
        let model = scored(json!({
            "technical_assets": {
                "Lb": { "technology": "load-balancer", "confidentiality": "confidential" },
                "Lib": { "technology": "library", "integrity": "critical" }
            }
        }));
        assert!(UnencryptedAsset.generate_risks(&model).unwrap().is_empty());
    }
}
