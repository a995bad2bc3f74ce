//! The built threat model.
//!
//! A [`ThreatModel`] is produced once per analysis run by the builder and is
//! then shared read-only by the rules and the reconciler. Besides the entity
//! maps it holds the reverse indices every rule relies on: incoming links by
//! target, the containing trust boundary and runtime of each asset, and the
//! parent of each nested trust boundary.

mod query;

pub use query::{EntityRef, Sensitivity};

use crate::models::*;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct ThreatModel {
    pub title: String,
    pub author: Author,
    pub date: NaiveDate,
    pub business_criticality: Criticality,
    pub management_summary_comment: String,
    pub business_overview: String,
    pub technical_overview: String,
    /// Question → answer; an empty answer means unanswered.
    pub questions: BTreeMap<String, String>,
    pub abuse_cases: BTreeMap<String, String>,
    pub security_requirements: BTreeMap<String, String>,
    pub tags_available: Vec<String>,

    pub(crate) data_assets: BTreeMap<String, DataAsset>,
    pub(crate) technical_assets: BTreeMap<String, TechnicalAsset>,
    pub(crate) trust_boundaries: BTreeMap<String, TrustBoundary>,
    pub(crate) shared_runtimes: BTreeMap<String, SharedRuntime>,
    pub(crate) individual_risk_categories: BTreeMap<String, RiskCategory>,
    pub(crate) individual_risks: Vec<Risk>,
    pub(crate) risk_tracking: BTreeMap<String, RiskTracking>,

    /// link id → (source asset id, position in its link list)
    pub(crate) link_index: HashMap<String, (String, usize)>,
    /// target asset id → incoming link ids
    pub(crate) incoming_links: HashMap<String, Vec<String>>,
    pub(crate) boundary_of_asset: HashMap<String, String>,
    pub(crate) runtime_of_asset: HashMap<String, String>,
    pub(crate) parent_of_boundary: HashMap<String, String>,
}

impl ThreatModel {
    pub(crate) fn empty(title: String, date: NaiveDate) -> Self {
        Self {
            title,
            author: Author::default(),
            date,
            business_criticality: Criticality::Important,
            management_summary_comment: String::new(),
            business_overview: String::new(),
            technical_overview: String::new(),
            questions: BTreeMap::new(),
            abuse_cases: BTreeMap::new(),
            security_requirements: BTreeMap::new(),
            tags_available: Vec::new(),
            data_assets: BTreeMap::new(),
            technical_assets: BTreeMap::new(),
            trust_boundaries: BTreeMap::new(),
            shared_runtimes: BTreeMap::new(),
            individual_risk_categories: BTreeMap::new(),
            individual_risks: Vec::new(),
            risk_tracking: BTreeMap::new(),
            link_index: HashMap::new(),
            incoming_links: HashMap::new(),
            boundary_of_asset: HashMap::new(),
            runtime_of_asset: HashMap::new(),
            parent_of_boundary: HashMap::new(),
        }
    }

    /// Data assets ordered by ID.
    pub fn data_assets(&self) -> impl Iterator<Item = &DataAsset> {
        self.data_assets.values()
    }

    pub fn data_asset(&self, id: &str) -> Option<&DataAsset> {
        self.data_assets.get(id)
    }

    /// Technical assets ordered by ID.
    pub fn technical_assets(&self) -> impl Iterator<Item = &TechnicalAsset> {
        self.technical_assets.values()
    }

    pub fn technical_asset(&self, id: &str) -> Option<&TechnicalAsset> {
        self.technical_assets.get(id)
    }

    pub(crate) fn technical_assets_mut(&mut self) -> impl Iterator<Item = &mut TechnicalAsset> {
        self.technical_assets.values_mut()
    }

    pub fn trust_boundaries(&self) -> impl Iterator<Item = &TrustBoundary> {
        self.trust_boundaries.values()
    }

    pub fn trust_boundary(&self, id: &str) -> Option<&TrustBoundary> {
        self.trust_boundaries.get(id)
    }

    pub fn shared_runtimes(&self) -> impl Iterator<Item = &SharedRuntime> {
        self.shared_runtimes.values()
    }

    pub fn shared_runtime(&self, id: &str) -> Option<&SharedRuntime> {
        self.shared_runtimes.get(id)
    }

    /// All links, grouped by source asset in ID order.
    pub fn communication_links(&self) -> impl Iterator<Item = &CommunicationLink> {
        self.technical_assets
            .values()
            .flat_map(|asset| asset.communication_links.iter())
    }

    pub fn communication_link(&self, id: &str) -> Option<&CommunicationLink> {
        let (source, position) = self.link_index.get(id)?;
        self.technical_assets
            .get(source)
            .and_then(|asset| asset.communication_links.get(*position))
    }

    /// Links whose target is the given asset, in source order.
    pub fn incoming_links(&self, target_id: &str) -> Vec<&CommunicationLink> {
        self.incoming_links
            .get(target_id)
            .map(|ids| ids.iter().filter_map(|id| self.communication_link(id)).collect())
            .unwrap_or_default()
    }

    /// The trust boundary directly containing an asset.
    pub fn trust_boundary_of(&self, asset_id: &str) -> Option<&TrustBoundary> {
        self.boundary_of_asset
            .get(asset_id)
            .and_then(|id| self.trust_boundaries.get(id))
    }

    /// The shared runtime an asset runs on.
    pub fn shared_runtime_of(&self, asset_id: &str) -> Option<&SharedRuntime> {
        self.runtime_of_asset
            .get(asset_id)
            .and_then(|id| self.shared_runtimes.get(id))
    }

    /// Direct parent of a nested trust boundary.
    pub fn parent_trust_boundary(&self, boundary_id: &str) -> Option<&TrustBoundary> {
        self.parent_of_boundary
            .get(boundary_id)
            .and_then(|id| self.trust_boundaries.get(id))
    }

    pub fn individual_risk_categories(&self) -> impl Iterator<Item = &RiskCategory> {
        self.individual_risk_categories.values()
    }

    /// Risks declared directly in the model document.
    pub fn individual_risks(&self) -> &[Risk] {
        &self.individual_risks
    }

    /// Tracking entries keyed by their (possibly wildcard) synthetic ID.
    pub fn risk_tracking(&self) -> &BTreeMap<String, RiskTracking> {
        &self.risk_tracking
    }

    /// Technical assets ordered for diagrams: tweak order, then ID.
    pub fn technical_assets_by_tweak_order(&self) -> Vec<&TechnicalAsset> {
        let mut assets: Vec<&TechnicalAsset> = self.technical_assets.values().collect();
        assets.sort_by(|a, b| {
            a.diagram_tweak_order
                .cmp(&b.diagram_tweak_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        assets
    }

    /// Technical assets ordered by RAA (highest first), then title.
    pub fn technical_assets_by_raa(&self) -> Vec<&TechnicalAsset> {
        let mut assets: Vec<&TechnicalAsset> = self.technical_assets.values().collect();
        assets.sort_by(|a, b| {
            b.raa()
                .total_cmp(&a.raa())
                .then_with(|| a.title.cmp(&b.title))
        });
        assets
    }

    pub fn in_scope_technical_assets(&self) -> impl Iterator<Item = &TechnicalAsset> {
        self.technical_assets.values().filter(|a| a.is_in_scope())
    }

    pub fn out_of_scope_technical_assets(&self) -> impl Iterator<Item = &TechnicalAsset> {
        self.technical_assets.values().filter(|a| a.out_of_scope)
    }

    /// Questions without an answer, sorted.
    pub fn questions_unanswered(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|(_, answer)| answer.trim().is_empty())
            .map(|(question, _)| question.as_str())
            .collect()
    }

    /// Every tag attached to any entity of the model, sorted and unique.
    pub fn tags_actually_used(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        tags.extend(self.data_assets.values().flat_map(|a| a.tags.iter().cloned()));
        for asset in self.technical_assets.values() {
            tags.extend(asset.tags.iter().cloned());
            for link in &asset.communication_links {
                tags.extend(link.tags.iter().cloned());
            }
        }
        tags.extend(self.trust_boundaries.values().flat_map(|b| b.tags.iter().cloned()));
        tags.extend(self.shared_runtimes.values().flat_map(|r| r.tags.iter().cloned()));
        tags.sort();
        tags.dedup();
        tags
    }
}
