//! Recognized shape of a decoded model document.
//!
//! Every field is optional in the document; omitted or `null` fields fall
//! back to the serde defaults declared here. Enumerated fields stay as
//! strings at this stage so the builder can report unknown keywords with
//! entity context.

use crate::errors::ThreatResult;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

fn default_weight() -> u32 {
    1
}

/// An explicit `null` (what an empty YAML key decodes to) reads as omitted.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_else(default_true))
}

fn nullable_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_else(default_weight))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelInput {
    pub title: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub author: AuthorInput,
    pub date: Option<String>,
    pub business_criticality: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub management_summary_comment: String,
    #[serde(deserialize_with = "nullable")]
    pub business_overview: OverviewInput,
    #[serde(deserialize_with = "nullable")]
    pub technical_overview: OverviewInput,
    #[serde(deserialize_with = "nullable")]
    pub questions: BTreeMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub abuse_cases: BTreeMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub security_requirements: BTreeMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub tags_available: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_assets: BTreeMap<String, DataAssetInput>,
    #[serde(deserialize_with = "nullable")]
    pub technical_assets: BTreeMap<String, TechnicalAssetInput>,
    #[serde(deserialize_with = "nullable")]
    pub trust_boundaries: BTreeMap<String, TrustBoundaryInput>,
    #[serde(deserialize_with = "nullable")]
    pub shared_runtimes: BTreeMap<String, SharedRuntimeInput>,
    #[serde(deserialize_with = "nullable")]
    pub individual_risk_categories: BTreeMap<String, RiskCategoryInput>,
    #[serde(deserialize_with = "nullable")]
    pub risk_tracking: BTreeMap<String, RiskTrackingInput>,
}

impl ModelInput {
    /// Map a generic decoded document onto the recognized input shape.
    pub fn from_value(document: serde_json::Value) -> ThreatResult<Self> {
        Ok(serde_json::from_value(document)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorInput {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub homepage: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverviewInput {
    #[serde(deserialize_with = "nullable")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataAssetInput {
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    pub usage: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub origin: String,
    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    pub quantity: Option<String>,
    pub confidentiality: Option<String>,
    pub integrity: Option<String>,
    pub availability: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub justification_cia_rating: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TechnicalAssetInput {
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub usage: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub used_as_client_by_human: bool,
    #[serde(deserialize_with = "nullable")]
    pub out_of_scope: bool,
    #[serde(deserialize_with = "nullable")]
    pub justification_out_of_scope: String,
    pub size: Option<String>,
    pub technology: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub internet: bool,
    pub machine: Option<String>,
    pub encryption: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    pub confidentiality: Option<String>,
    pub integrity: Option<String>,
    pub availability: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub justification_cia_rating: String,
    #[serde(deserialize_with = "nullable")]
    pub multi_tenant: bool,
    #[serde(deserialize_with = "nullable")]
    pub redundant: bool,
    #[serde(deserialize_with = "nullable")]
    pub custom_developed_parts: bool,
    #[serde(deserialize_with = "nullable")]
    pub data_assets_processed: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_assets_stored: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_formats_accepted: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub diagram_tweak_order: i32,
    #[serde(deserialize_with = "nullable")]
    pub communication_links: BTreeMap<String, CommunicationLinkInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommunicationLinkInput {
    #[serde(deserialize_with = "nullable")]
    pub target: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    pub protocol: Option<String>,
    pub authentication: Option<String>,
    pub authorization: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub vpn: bool,
    #[serde(deserialize_with = "nullable")]
    pub ip_filtered: bool,
    #[serde(deserialize_with = "nullable")]
    pub readonly: bool,
    pub usage: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_assets_sent: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_assets_received: Vec<String>,
    #[serde(default = "default_weight", deserialize_with = "nullable_weight")]
    pub diagram_tweak_weight: u32,
    #[serde(default = "default_true", deserialize_with = "nullable_true")]
    pub diagram_tweak_constraint: bool,
}

impl Default for CommunicationLinkInput {
    fn default() -> Self {
        Self {
            target: String::new(),
            description: String::new(),
            protocol: None,
            authentication: None,
            authorization: None,
            tags: Vec::new(),
            vpn: false,
            ip_filtered: false,
            readonly: false,
            usage: None,
            data_assets_sent: Vec::new(),
            data_assets_received: Vec::new(),
            diagram_tweak_weight: default_weight(),
            diagram_tweak_constraint: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrustBoundaryInput {
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "type")]
    pub boundary_type: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub technical_assets_inside: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub trust_boundaries_nested: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SharedRuntimeInput {
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub technical_assets_running: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskCategoryInput {
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub impact: String,
    #[serde(deserialize_with = "nullable")]
    pub asvs: String,
    #[serde(deserialize_with = "nullable")]
    pub cheat_sheet: String,
    #[serde(deserialize_with = "nullable")]
    pub action: String,
    #[serde(deserialize_with = "nullable")]
    pub mitigation: String,
    #[serde(deserialize_with = "nullable")]
    pub check: String,
    pub function: Option<String>,
    pub stride: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub detection_logic: String,
    #[serde(deserialize_with = "nullable")]
    pub risk_assessment: String,
    #[serde(deserialize_with = "nullable")]
    pub false_positives: String,
    #[serde(deserialize_with = "nullable")]
    pub model_failure_possible_reason: bool,
    #[serde(deserialize_with = "nullable")]
    pub cwe: u32,
    #[serde(deserialize_with = "nullable")]
    pub risks_identified: BTreeMap<String, RiskIdentifiedInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskIdentifiedInput {
    pub severity: Option<String>,
    pub exploitation_likelihood: Option<String>,
    pub exploitation_impact: Option<String>,
    pub data_breach_probability: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub data_breach_technical_assets: Vec<String>,
    pub most_relevant_data_asset: Option<String>,
    pub most_relevant_technical_asset: Option<String>,
    pub most_relevant_communication_link: Option<String>,
    pub most_relevant_trust_boundary: Option<String>,
    pub most_relevant_shared_runtime: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskTrackingInput {
    pub status: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub justification: String,
    #[serde(deserialize_with = "nullable")]
    pub ticket: String,
    pub date: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub checked_by: String,
}
