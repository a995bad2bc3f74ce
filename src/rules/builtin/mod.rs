//! Built-in risk rules.
//!
//! Each rule walks technical assets in ID order so repeated runs emit risks
//! in the same order.

mod accidental_secret_leak;
mod container_platform_escape;
mod dos_risky_access_across_trust_boundary;
mod missing_authentication;
mod missing_hardening;
mod missing_identity_provider_isolation;
mod missing_network_segmentation;
mod missing_vault_isolation;
mod missing_waf;
mod mixed_targets_on_shared_runtime;
mod unencrypted_asset;
mod unencrypted_communication;
mod unguarded_direct_datastore_access;
mod unnecessary_communication_link;
mod unnecessary_data_asset;
mod unnecessary_technical_asset;
mod wrong_trust_boundary_content;

pub use accidental_secret_leak::AccidentalSecretLeak;
pub use container_platform_escape::ContainerPlatformEscape;
pub use dos_risky_access_across_trust_boundary::DosRiskyAccessAcrossTrustBoundary;
pub use missing_authentication::MissingAuthentication;
pub use missing_hardening::MissingHardening;
pub use missing_identity_provider_isolation::MissingIdentityProviderIsolation;
pub use missing_network_segmentation::MissingNetworkSegmentation;
pub use missing_vault_isolation::MissingVaultIsolation;
pub use missing_waf::MissingWaf;
pub use mixed_targets_on_shared_runtime::MixedTargetsOnSharedRuntime;
pub use unencrypted_asset::UnencryptedAsset;
pub use unencrypted_communication::UnencryptedCommunication;
pub use unguarded_direct_datastore_access::UnguardedDirectDatastoreAccess;
pub use unnecessary_communication_link::UnnecessaryCommunicationLink;
pub use unnecessary_data_asset::UnnecessaryDataAsset;
pub use unnecessary_technical_asset::UnnecessaryTechnicalAsset;
pub use wrong_trust_boundary_content::WrongTrustBoundaryContent;

use super::RiskRule;
use crate::graph::ThreatModel;
use crate::models::{RiskExploitationLikelihood, TechnicalAsset};

/// Every built-in rule, in evaluation order.
pub fn all() -> Vec<Box<dyn RiskRule>> {
    vec![
        Box::new(AccidentalSecretLeak),
        Box::new(ContainerPlatformEscape),
        Box::new(DosRiskyAccessAcrossTrustBoundary),
        Box::new(MissingAuthentication),
        Box::new(MissingHardening),
        Box::new(MissingIdentityProviderIsolation),
        Box::new(MissingNetworkSegmentation),
        Box::new(MissingVaultIsolation),
        Box::new(MissingWaf),
        Box::new(MixedTargetsOnSharedRuntime),
        Box::new(UnencryptedAsset),
        Box::new(UnencryptedCommunication),
        Box::new(UnguardedDirectDatastoreAccess),
        Box::new(UnnecessaryCommunicationLink),
        Box::new(UnnecessaryDataAsset),
        Box::new(UnnecessaryTechnicalAsset),
        Box::new(WrongTrustBoundaryContent),
    ]
}

/// Likelihood that an unrelated neighbor compromises `asset`: likely when one
/// shares its execution environment, unlikely when one shares only its network
/// segment, `None` when no neighbor qualifies.
pub(crate) fn neighbor_proximity<F>(
    model: &ThreatModel,
    asset: &TechnicalAsset,
    is_unrelated: F,
) -> Option<RiskExploitationLikelihood>
where
    F: Fn(&TechnicalAsset) -> bool,
{
    let mut proximity = None;
    for candidate in model.technical_assets() {
        if candidate.id == asset.id || !is_unrelated(candidate) {
            continue;
        }
        if model.is_same_execution_environment(&asset.id, &candidate.id) {
            return Some(RiskExploitationLikelihood::Likely);
        }
        if model.is_same_trust_boundary_network_only(&asset.id, &candidate.id) {
            proximity = Some(RiskExploitationLikelihood::Unlikely);
        }
    }
    proximity
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_category_ids_are_unique() {
        let rules = all();
        let ids: HashSet<String> = rules.iter().map(|rule| rule.category().id).collect();
        assert_eq!(ids.len(), rules.len());
        assert_eq!(rules.len(), 17);
    }

    #[test]
    fn test_categories_are_documented() {
        for rule in all() {
            let category = rule.category();
            assert!(!category.title.is_empty(), "{} has no title", category.id);
            assert!(!category.description.is_empty(), "{} has no description", category.id);
            assert!(!category.mitigation.is_empty(), "{} has no mitigation", category.id);
            assert!(!category.detection_logic.is_empty(), "{} has no detection logic", category.id);
        }
    }
}
