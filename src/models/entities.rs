//! Graph entities produced by the model builder.

use super::types::*;
use serde::Serialize;

/// Tag queries shared by every taggable entity. Tags are stored normalized.
pub trait Tagged {
    fn tags(&self) -> &[String];

    /// Case-insensitive match against any of the given tags.
    fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        self.tags()
            .iter()
            .any(|own| tags.iter().any(|t| own.eq_ignore_ascii_case(t.trim())))
    }

    /// True if a tag equals `base` or is a qualified form like `base:detail`.
    fn is_tagged_with_base_tag(&self, base: &str) -> bool {
        let base = base.trim().to_lowercase();
        let prefix = format!("{}:", base);
        self.tags()
            .iter()
            .any(|tag| *tag == base || tag.starts_with(&prefix))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Author {
    pub name: String,
    pub homepage: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub usage: Usage,
    pub tags: Vec<String>,
    pub origin: String,
    pub owner: String,
    pub quantity: Quantity,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    pub justification_cia_rating: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicalAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub usage: Usage,
    pub asset_type: TechnicalAssetType,
    pub size: TechnicalAssetSize,
    pub technology: Technology,
    pub machine: TechnicalAssetMachine,
    pub encryption: EncryptionStyle,
    pub tags: Vec<String>,
    pub owner: String,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    pub justification_cia_rating: String,
    pub out_of_scope: bool,
    pub justification_out_of_scope: String,
    pub internet: bool,
    pub multi_tenant: bool,
    pub redundant: bool,
    pub custom_developed_parts: bool,
    pub used_as_client_by_human: bool,
    pub data_assets_processed: Vec<String>,
    pub data_assets_stored: Vec<String>,
    pub data_formats_accepted: Vec<DataFormat>,
    /// Outgoing links, owned by this (source) asset.
    pub communication_links: Vec<CommunicationLink>,
    pub diagram_tweak_order: i32,
    /// Relative attacker attractiveness, unset until scored.
    pub raa: Option<f64>,
}

impl TechnicalAsset {
    /// RAA score, 0 before the scorer ran.
    pub fn raa(&self) -> f64 {
        self.raa.unwrap_or(0.0)
    }

    pub fn is_in_scope(&self) -> bool {
        !self.out_of_scope
    }

    pub fn processes_or_stores(&self, data_asset_id: &str) -> bool {
        self.data_assets_processed.iter().any(|id| id == data_asset_id)
            || self.data_assets_stored.iter().any(|id| id == data_asset_id)
    }

    /// Processed and stored data asset IDs, without duplicates.
    pub fn data_assets_processed_or_stored(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .data_assets_processed
            .iter()
            .chain(self.data_assets_stored.iter())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl Tagged for TechnicalAsset {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for DataAsset {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunicationLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub title: String,
    pub description: String,
    pub protocol: Protocol,
    pub authentication: Authentication,
    pub authorization: Authorization,
    pub usage: Usage,
    pub tags: Vec<String>,
    pub vpn: bool,
    pub ip_filtered: bool,
    pub readonly: bool,
    pub data_assets_sent: Vec<String>,
    pub data_assets_received: Vec<String>,
    pub diagram_tweak_weight: u32,
    pub diagram_tweak_constraint: bool,
}

impl CommunicationLink {
    pub fn carries_data(&self) -> bool {
        !self.data_assets_sent.is_empty() || !self.data_assets_received.is_empty()
    }

    pub fn transfers(&self, data_asset_id: &str) -> bool {
        self.data_assets_sent.iter().any(|id| id == data_asset_id)
            || self.data_assets_received.iter().any(|id| id == data_asset_id)
    }
}

impl Tagged for CommunicationLink {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrustBoundary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub boundary_type: TrustBoundaryType,
    pub tags: Vec<String>,
    pub technical_assets_inside: Vec<String>,
    pub trust_boundaries_nested: Vec<String>,
}

impl Tagged for TrustBoundary {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedRuntime {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub technical_assets_running: Vec<String>,
}

impl Tagged for SharedRuntime {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}
