//! Derived relationships over the built model.
//!
//! Every proximity predicate resolves containment through the direct
//! containment maps recorded by the builder, so all rules see one topology.

use super::ThreatModel;
use crate::models::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Highest confidentiality / integrity / availability over a set of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sensitivity {
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
}

impl Sensitivity {
    pub const LOWEST: Sensitivity = Sensitivity {
        confidentiality: Confidentiality::Public,
        integrity: Criticality::Archive,
        availability: Criticality::Archive,
    };

    pub fn of_data_asset(data: &DataAsset) -> Self {
        Self {
            confidentiality: data.confidentiality,
            integrity: data.integrity,
            availability: data.availability,
        }
    }

    /// The asset's own rating, ignoring the data it touches.
    pub fn of_technical_asset(asset: &TechnicalAsset) -> Self {
        Self {
            confidentiality: asset.confidentiality,
            integrity: asset.integrity,
            availability: asset.availability,
        }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Sensitivity) -> Self {
        Self {
            confidentiality: self.confidentiality.max(other.confidentiality),
            integrity: self.integrity.max(other.integrity),
            availability: self.availability.max(other.availability),
        }
    }

    /// Strictly confidential, or mission-critical integrity or availability.
    pub fn is_top_rated(&self) -> bool {
        self.confidentiality == Confidentiality::StrictlyConfidential
            || self.integrity == Criticality::MissionCritical
            || self.availability == Criticality::MissionCritical
    }
}

/// Borrowed reference to any entity that has a derived sensitivity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    DataAsset(&'a DataAsset),
    TechnicalAsset(&'a TechnicalAsset),
    CommunicationLink(&'a CommunicationLink),
    TrustBoundary(&'a TrustBoundary),
    SharedRuntime(&'a SharedRuntime),
}

impl ThreatModel {
    /// Highest sensitivity of an entity and every data asset it touches.
    pub fn highest_sensitivity(&self, entity: EntityRef<'_>) -> Sensitivity {
        match entity {
            EntityRef::DataAsset(data) => Sensitivity::of_data_asset(data),
            EntityRef::TechnicalAsset(asset) => self.asset_sensitivity(asset),
            EntityRef::CommunicationLink(link) => self.link_sensitivity(link),
            EntityRef::TrustBoundary(boundary) => self.boundary_sensitivity(boundary),
            EntityRef::SharedRuntime(runtime) => self.runtime_sensitivity(runtime),
        }
    }

    /// Own rating merged with processed and stored data.
    pub fn asset_sensitivity(&self, asset: &TechnicalAsset) -> Sensitivity {
        asset
            .data_assets_processed
            .iter()
            .chain(asset.data_assets_stored.iter())
            .filter_map(|id| self.data_assets.get(id))
            .fold(Sensitivity::of_technical_asset(asset), |acc, data| {
                acc.max(Sensitivity::of_data_asset(data))
            })
    }

    /// Data sent and received over the link; a link without data rates lowest.
    pub fn link_sensitivity(&self, link: &CommunicationLink) -> Sensitivity {
        link.data_assets_sent
            .iter()
            .chain(link.data_assets_received.iter())
            .filter_map(|id| self.data_assets.get(id))
            .fold(Sensitivity::LOWEST, |acc, data| {
                acc.max(Sensitivity::of_data_asset(data))
            })
    }

    pub fn boundary_sensitivity(&self, boundary: &TrustBoundary) -> Sensitivity {
        self.recursively_contained_assets(&boundary.id)
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .fold(Sensitivity::LOWEST, |acc, asset| acc.max(self.asset_sensitivity(asset)))
    }

    pub fn runtime_sensitivity(&self, runtime: &SharedRuntime) -> Sensitivity {
        runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .fold(Sensitivity::LOWEST, |acc, asset| acc.max(self.asset_sensitivity(asset)))
    }

    /// Both assets are directly inside the same trust boundary.
    pub fn is_same_trust_boundary(&self, a: &str, b: &str) -> bool {
        match (self.boundary_of_asset.get(a), self.boundary_of_asset.get(b)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    pub fn is_same_execution_environment(&self, a: &str, b: &str) -> bool {
        self.is_same_trust_boundary(a, b)
            && self
                .trust_boundary_of(a)
                .map(|tb| tb.boundary_type == TrustBoundaryType::ExecutionEnvironment)
                .unwrap_or(false)
    }

    /// Both assets are directly inside the same network-type boundary.
    pub fn is_same_network_trust_boundary(&self, a: &str, b: &str) -> bool {
        self.is_same_trust_boundary(a, b)
            && self
                .trust_boundary_of(a)
                .map(|tb| tb.boundary_type.is_network_boundary())
                .unwrap_or(false)
    }

    /// Nearest enclosing network boundary, walking up past execution environments.
    pub fn network_trust_boundary_of(&self, asset_id: &str) -> Option<&TrustBoundary> {
        let mut current = self.trust_boundary_of(asset_id)?;
        let mut seen = HashSet::new();
        while !current.boundary_type.is_network_boundary() {
            if !seen.insert(current.id.as_str()) {
                return None;
            }
            current = self.parent_trust_boundary(&current.id)?;
        }
        Some(current)
    }

    /// Both assets resolve to the same enclosing network boundary.
    pub fn is_same_trust_boundary_network_only(&self, a: &str, b: &str) -> bool {
        match (self.network_trust_boundary_of(a), self.network_trust_boundary_of(b)) {
            (Some(left), Some(right)) => left.id == right.id,
            _ => false,
        }
    }

    /// Any link between the two assets, in either direction.
    pub fn has_direct_connection(&self, a: &str, b: &str) -> bool {
        self.communication_links().any(|link| {
            (link.source_id == a && link.target_id == b)
                || (link.source_id == b && link.target_id == a)
        })
    }

    /// Asset IDs inside a boundary or any nested descendant, sorted.
    pub fn recursively_contained_assets(&self, boundary_id: &str) -> Vec<String> {
        let mut assets = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![boundary_id];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(boundary) = self.trust_boundaries.get(id) {
                assets.extend(boundary.technical_assets_inside.iter().cloned());
                stack.extend(boundary.trust_boundaries_nested.iter().map(String::as_str));
            }
        }
        assets.into_iter().collect()
    }

    /// Ancestors of a boundary, nearest first, excluding the boundary itself.
    pub fn all_parent_trust_boundary_ids(&self, boundary_id: &str) -> Vec<String> {
        let mut parents = Vec::new();
        let mut current = boundary_id;
        while let Some(parent) = self.parent_of_boundary.get(current) {
            if parent == boundary_id || parents.contains(parent) {
                break;
            }
            parents.push(parent.clone());
            current = parent.as_str();
        }
        parents
    }

    fn is_ancestor_boundary(&self, ancestor: &str, boundary: &str) -> bool {
        self.all_parent_trust_boundary_ids(boundary)
            .iter()
            .any(|id| id == ancestor)
    }

    /// Source and target sit in different top-level or sibling boundaries.
    ///
    /// A link between a boundary and one of its own nested boundaries does not
    /// count as crossing.
    pub fn is_across_trust_boundary(&self, link: &CommunicationLink) -> bool {
        let source = self.boundary_of_asset.get(&link.source_id);
        let target = self.boundary_of_asset.get(&link.target_id);
        match (source, target) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(s), Some(t)) => {
                s != t && !self.is_ancestor_boundary(s, t) && !self.is_ancestor_boundary(t, s)
            }
        }
    }

    /// Source and target resolve to two different network boundaries.
    ///
    /// Execution environments are lifted to their enclosing network boundary
    /// first. An endpoint outside every network boundary never crosses.
    pub fn is_across_trust_boundary_network_only(&self, link: &CommunicationLink) -> bool {
        let source = self.network_trust_boundary_of(&link.source_id);
        let target = self.network_trust_boundary_of(&link.target_id);
        match (source, target) {
            (Some(s), Some(t)) => s.id != t.id,
            _ => false,
        }
    }

    /// Both assets are outside every boundary, or their boundary chains meet.
    pub fn is_sharing_same_parent_trust_boundary(&self, a: &str, b: &str) -> bool {
        match (self.boundary_of_asset.get(a), self.boundary_of_asset.get(b)) {
            (None, None) => true,
            (Some(left), Some(right)) => {
                if left == right {
                    return true;
                }
                let mut left_chain = self.all_parent_trust_boundary_ids(left);
                left_chain.push(left.clone());
                let mut right_chain = self.all_parent_trust_boundary_ids(right);
                right_chain.push(right.clone());
                left_chain.iter().any(|id| right_chain.contains(id))
            }
            _ => false,
        }
    }

    /// Tag match on the asset, its boundary and that boundary's ancestors, or its runtime.
    pub fn is_tagged_with_any_traversing_up(&self, asset: &TechnicalAsset, tags: &[&str]) -> bool {
        if asset.is_tagged_with_any(tags) {
            return true;
        }
        if let Some(boundary) = self.trust_boundary_of(&asset.id) {
            if boundary.is_tagged_with_any(tags) {
                return true;
            }
            let parent_tagged = self
                .all_parent_trust_boundary_ids(&boundary.id)
                .iter()
                .filter_map(|id| self.trust_boundaries.get(id))
                .any(|parent| parent.is_tagged_with_any(tags));
            if parent_tagged {
                return true;
            }
        }
        self.shared_runtime_of(&asset.id)
            .map(|runtime| runtime.is_tagged_with_any(tags))
            .unwrap_or(false)
    }

    /// The most attractive asset running on a runtime; ties keep the first listed.
    pub fn technical_asset_with_highest_raa(
        &self,
        runtime: &SharedRuntime,
    ) -> Option<&TechnicalAsset> {
        let mut best: Option<&TechnicalAsset> = None;
        for asset in runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
        {
            match best {
                Some(current) if current.raa() >= asset.raa() => {}
                _ => best = Some(asset),
            }
        }
        best
    }
}
