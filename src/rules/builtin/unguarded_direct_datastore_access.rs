use crate::errors::ThreatResult;
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::RiskRule;

const RAA_LIMIT: f64 = 40.0;

/// Sensitive datastores reached directly from another network segment.
pub struct UnguardedDirectDatastoreAccess;

impl UnguardedDirectDatastoreAccess {
    pub const ID: &'static str = "unguarded-direct-datastore-access";

    /// Identity stores fed by their identity provider, and file servers
    /// serving FTP, are the expected way in.
    fn is_expected_access(
        datastore: &TechnicalAsset,
        caller: &TechnicalAsset,
        link: &CommunicationLink,
    ) -> bool {
        let identity_backend = datastore.technology.is_identity_store()
            && caller.technology == Technology::IdentityProvider;
        let file_transfer = datastore.technology == Technology::FileServer
            && matches!(link.protocol, Protocol::Ftp | Protocol::Ftps | Protocol::Sftp);
        identity_backend || file_transfer || link.usage == Usage::DevOps
    }
}

impl RiskRule for UnguardedDirectDatastoreAccess {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            description: "Datastores holding sensitive data should only be accessed from assets within the \
                          same trust boundary."
                .into(),
            impact: "Direct access across a boundary lets attackers who compromise the caller bypass the \
                     guarding application layer."
                .into(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".into(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Database_Security_Cheat_Sheet.html"
                .into(),
            action: "Encapsulation of Datastore".into(),
            mitigation: "Route access through an application layer inside the datastore's boundary.".into(),
            check: "Are sensitive datastores only accessed from within their trust boundary?".into(),
            detection_logic: "In-scope datastores with confidential data or critical integrity reached by an \
                              in-scope caller across a network boundary without a shared parent boundary. \
                              Identity providers reaching identity stores, FTP access to file servers and \
                              devops links are accepted."
                .into(),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical datastores or RAA \
                              above 40%, low otherwise."
                .into(),
            false_positives: "Callers that are themselves guarding application layers.".into(),
            ..RiskCategory::new(
                Self::ID,
                "Unguarded Direct Datastore Access",
                RiskFunction::Architecture,
                Stride::ElevationOfPrivilege,
                501,
            )
        }
    }

    fn generate_risks(&self, model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
        let category = self.category();
        let mut risks = Vec::new();
        for datastore in model
            .in_scope_technical_assets()
            .filter(|asset| asset.asset_type == TechnicalAssetType::Datastore)
        {
            if datastore.confidentiality < Confidentiality::Confidential
                && datastore.integrity < Criticality::Critical
            {
                continue;
            }
            for link in model.incoming_links(&datastore.id) {
                let caller = match model.technical_asset(&link.source_id) {
                    Some(caller) if caller.is_in_scope() => caller,
                    _ => continue,
                };
                if Self::is_expected_access(datastore, caller, link)
                    || !model.is_across_trust_boundary_network_only(link)
                    || model.is_sharing_same_parent_trust_boundary(&datastore.id, &caller.id)
                {
                    continue;
                }
                let more_risky = datastore.confidentiality == Confidentiality::StrictlyConfidential
                    || datastore.integrity == Criticality::MissionCritical;
                let impact = if more_risky || datastore.raa() > RAA_LIMIT {
                    RiskExploitationImpact::Medium
                } else {
                    RiskExploitationImpact::Low
                };
                risks.push(
                    Risk::new(
                        &category,
                        RiskExploitationLikelihood::Likely,
                        impact,
                        format!(
                            "Unguarded Direct Datastore Access of {} by {} via {}",
                            datastore.title, caller.title, link.title
                        ),
                        synthetic_id(Self::ID, &[&link.id, &caller.id, &datastore.id]),
                    )
                    .with_technical_asset(&datastore.id)
                    .with_communication_link(&link.id)
                    .with_data_breach(
                        DataBreachProbability::Improbable,
                        vec![datastore.id.clone()],
                    ),
                );
            }
        }
        Ok(risks)
    }
}
