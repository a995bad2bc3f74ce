//! Risk tracking reconciliation.
//!
//! Tracking entries are matched against generated risks in two passes. Exact
//! entries go first and claim their risk; wildcard entries then cover the
//! risks nobody claimed. Associations are reported, never written back onto
//! the risks themselves.

use crate::errors::{ThreatError, ThreatResult};
use crate::models::{RiskStatus, RiskTracking};
use crate::rules::GeneratedRisks;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Outcome of matching tracking entries against generated risks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    /// Exact matches plus every risk a wildcard matched
    pub matched: usize,
    /// Exact entries without a risk (only when orphans are tolerated)
    pub orphaned: usize,
    /// Lowercased risk synthetic ID → tracking entry ID
    pub assignments: BTreeMap<String, String>,
    pub orphaned_entries: Vec<String>,
    pub unmatched_wildcards: Vec<String>,
    #[serde(skip)]
    statuses: BTreeMap<String, RiskStatus>,
}

impl ReconciliationReport {
    /// Tracking status of a risk; unchecked when no entry covers it.
    pub fn status_of(&self, synthetic_id: &str) -> RiskStatus {
        self.statuses
            .get(&synthetic_id.to_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// Tracking entry ID associated with a risk.
    pub fn tracking_of(&self, synthetic_id: &str) -> Option<&str> {
        self.assignments
            .get(&synthetic_id.to_lowercase())
            .map(String::as_str)
    }

    pub(crate) fn assign(&mut self, risk_key: &str, entry: &RiskTracking) {
        if self.assignments.contains_key(risk_key) {
            return;
        }
        self.assignments
            .insert(risk_key.to_string(), entry.synthetic_risk_id.clone());
        self.statuses.insert(risk_key.to_string(), entry.status);
    }
}

/// Compile a wildcard entry: `*` matches any substring, everything else literally.
pub fn wildcard_pattern(entry_id: &str) -> ThreatResult<Regex> {
    let body = entry_id
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(true)
        .build()
        .map_err(|source| ThreatError::InvalidTrackingPattern {
            pattern: entry_id.to_string(),
            source,
        })
}

pub struct RiskTrackingReconciler {
    ignore_orphaned: bool,
}

impl RiskTrackingReconciler {
    pub fn new(ignore_orphaned: bool) -> Self {
        Self { ignore_orphaned }
    }

    pub fn reconcile(
        &self,
        risks: &GeneratedRisks,
        tracking: &BTreeMap<String, RiskTracking>,
    ) -> ThreatResult<ReconciliationReport> {
        let mut report = ReconciliationReport::default();
        let mut claimed: HashSet<String> = HashSet::new();

        let (wildcards, exact): (Vec<&RiskTracking>, Vec<&RiskTracking>) =
            tracking.values().partition(|entry| entry.is_wildcard());

        for entry in exact {
            let key = entry.synthetic_risk_id.to_lowercase();
            if risks.contains(&key) {
                report.matched += 1;
                report.assign(&key, entry);
                claimed.insert(key);
                continue;
            }
            if !self.ignore_orphaned {
                return Err(ThreatError::OrphanedRiskTracking {
                    synthetic_id: entry.synthetic_risk_id.clone(),
                });
            }
            log::warn!(
                "Risk tracking references unknown risk (risk id not found): {}",
                entry.synthetic_risk_id
            );
            report.orphaned += 1;
            report.orphaned_entries.push(entry.synthetic_risk_id.clone());
        }

        for entry in wildcards {
            let pattern = wildcard_pattern(&entry.synthetic_risk_id)?;
            let mut hits = 0;
            for risk in risks.risks() {
                let key = risk.key();
                if claimed.contains(&key) || !pattern.is_match(&key) {
                    continue;
                }
                hits += 1;
                report.assign(&key, entry);
            }
            if hits == 0 {
                log::warn!(
                    "Wildcard risk tracking entry did not match any remaining risks: {}",
                    entry.synthetic_risk_id
                );
                report.unmatched_wildcards.push(entry.synthetic_risk_id.clone());
            }
            report.matched += hits;
        }

        log::info!(
            "Risk tracking reconciled: {} matched, {} orphaned, {} wildcard entries without match",
            report.matched,
            report.orphaned,
            report.unmatched_wildcards.len()
        );
        Ok(report)
    }
}
