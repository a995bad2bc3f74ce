//! Reporting views over an analysis run.
//!
//! Risks are never mutated after generation, so every view here pairs a risk
//! with the status the reconciler assigned to it.

use crate::errors::{ThreatError, ThreatResult};
use crate::graph::ThreatModel;
use crate::models::*;
use crate::rules::GeneratedRisks;
use crate::tracking::ReconciliationReport;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Risks ordered for presentation: severity (highest first), tracking status
/// (unchecked first), impact, likelihood, then title.
pub fn sort_risks<'a, I>(risks: I, tracking: &ReconciliationReport) -> Vec<&'a Risk>
where
    I: IntoIterator<Item = &'a Risk>,
{
    let mut sorted: Vec<&Risk> = risks.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| {
                tracking
                    .status_of(&a.synthetic_id)
                    .cmp(&tracking.status_of(&b.synthetic_id))
            })
            .then_with(|| b.exploitation_impact.cmp(&a.exploitation_impact))
            .then_with(|| b.exploitation_likelihood.cmp(&a.exploitation_likelihood))
            .then_with(|| a.title.cmp(&b.title))
    });
    sorted
}

pub fn still_at_risk<'a>(risks: &[&'a Risk], tracking: &ReconciliationReport) -> Vec<&'a Risk> {
    risks
        .iter()
        .copied()
        .filter(|risk| tracking.status_of(&risk.synthetic_id).is_still_at_risk())
        .collect()
}

pub fn of_severity<'a>(risks: &[&'a Risk], severity: RiskSeverity) -> Vec<&'a Risk> {
    risks
        .iter()
        .copied()
        .filter(|risk| risk.severity == severity)
        .collect()
}

/// Risks whose category belongs to `function`. Risks of unknown categories are dropped.
pub fn of_function<'a>(
    risks: &[&'a Risk],
    generated: &GeneratedRisks,
    function: RiskFunction,
) -> Vec<&'a Risk> {
    risks
        .iter()
        .copied()
        .filter(|risk| {
            generated
                .category(&risk.category_id)
                .map(|category| category.function == function)
                .unwrap_or(false)
        })
        .collect()
}

pub fn highest_severity<'a, I>(risks: I) -> Option<RiskSeverity>
where
    I: IntoIterator<Item = &'a Risk>,
{
    risks.into_iter().map(|risk| risk.severity).max()
}

/// Risk counts per severity and tracking status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RiskStatistics {
    pub total: usize,
    pub still_at_risk: usize,
    /// severity → status → count, every combination present
    pub by_severity: BTreeMap<String, BTreeMap<String, usize>>,
}

impl RiskStatistics {
    pub fn collect<'a, I>(risks: I, tracking: &ReconciliationReport) -> Self
    where
        I: IntoIterator<Item = &'a Risk>,
    {
        let mut stats = Self::default();
        for severity in RiskSeverity::ALL {
            let row = stats.by_severity.entry(severity.as_str().to_string()).or_default();
            for status in RiskStatus::ALL {
                row.insert(status.as_str().to_string(), 0);
            }
        }
        for risk in risks {
            let status = tracking.status_of(&risk.synthetic_id);
            stats.total += 1;
            if status.is_still_at_risk() {
                stats.still_at_risk += 1;
            }
            *stats
                .by_severity
                .entry(risk.severity.as_str().to_string())
                .or_default()
                .entry(status.as_str().to_string())
                .or_default() += 1;
        }
        stats
    }

    pub fn count(&self, severity: RiskSeverity, status: RiskStatus) -> usize {
        self.by_severity
            .get(severity.as_str())
            .and_then(|row| row.get(status.as_str()))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelCounts {
    pub data_assets: usize,
    pub technical_assets: usize,
    pub communication_links: usize,
    pub trust_boundaries: usize,
    pub shared_runtimes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetScore {
    pub id: String,
    pub title: String,
    pub raa: f64,
    pub out_of_scope: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportedRisk {
    #[serde(flatten)]
    pub risk: Risk,
    pub category_title: String,
    pub function: Option<RiskFunction>,
    pub status: RiskStatus,
    pub tracking_id: Option<String>,
}

/// Serializable summary of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    pub date: NaiveDate,
    pub generated_at: String,
    pub counts: ModelCounts,
    pub highest_severity: Option<RiskSeverity>,
    /// Assets by RAA, highest first
    pub technical_assets: Vec<AssetScore>,
    pub risks: Vec<ReportedRisk>,
    pub statistics: RiskStatistics,
    pub reconciliation: ReconciliationReport,
    pub failed_rules: Vec<String>,
    pub tags_used: Vec<String>,
    pub questions_unanswered: Vec<String>,
}

impl AnalysisReport {
    pub fn new(
        model: &ThreatModel,
        generated: &GeneratedRisks,
        reconciliation: ReconciliationReport,
    ) -> Self {
        let sorted = sort_risks(generated.risks(), &reconciliation);
        let risks = sorted
            .iter()
            .map(|risk| {
                let category = generated.category(&risk.category_id);
                ReportedRisk {
                    risk: (*risk).clone(),
                    category_title: category.map(|c| c.title.clone()).unwrap_or_default(),
                    function: category.map(|c| c.function),
                    status: reconciliation.status_of(&risk.synthetic_id),
                    tracking_id: reconciliation
                        .tracking_of(&risk.synthetic_id)
                        .map(str::to_string),
                }
            })
            .collect();

        Self {
            title: model.title.clone(),
            date: model.date,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            counts: ModelCounts {
                data_assets: model.data_assets().count(),
                technical_assets: model.technical_assets().count(),
                communication_links: model.communication_links().count(),
                trust_boundaries: model.trust_boundaries().count(),
                shared_runtimes: model.shared_runtimes().count(),
            },
            highest_severity: highest_severity(sorted.iter().copied()),
            technical_assets: model
                .technical_assets_by_raa()
                .into_iter()
                .map(|asset| AssetScore {
                    id: asset.id.clone(),
                    title: asset.title.clone(),
                    raa: asset.raa(),
                    out_of_scope: asset.out_of_scope,
                })
                .collect(),
            risks,
            statistics: RiskStatistics::collect(sorted.iter().copied(), &reconciliation),
            reconciliation,
            failed_rules: generated.failed_rules().to_vec(),
            tags_used: model.tags_actually_used(),
            questions_unanswered: model
                .questions_unanswered()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn to_json(&self) -> ThreatResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> ThreatResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| ThreatError::io(e, Some(path.to_path_buf())))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category() -> RiskCategory {
        RiskCategory::new("sample", "Sample", RiskFunction::Architecture, Stride::Spoofing, 0)
    }

    fn risk(
        id: &str,
        likelihood: RiskExploitationLikelihood,
        impact: RiskExploitationImpact,
    ) -> Risk {
        Risk::new(&category(), likelihood, impact, format!("Risk {}", id), id)
    }

    fn tracked(id: &str, status: RiskStatus) -> RiskTracking {
        RiskTracking {
            synthetic_risk_id: id.to_string(),
            justification: String::new(),
            ticket: String::new(),
            checked_by: String::new(),
            status,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_sort_by_severity_then_status() {
        use RiskExploitationImpact as I;
        use RiskExploitationLikelihood as L;
        let risks = vec![
            risk("low", L::Unlikely, I::Low),
            risk("high-mitigated", L::Likely, I::High),
            risk("high-open", L::VeryLikely, I::Medium),
            risk("critical", L::Frequent, I::VeryHigh),
        ];
        let mut tracking = ReconciliationReport::default();
        tracking.assign("high-mitigated", &tracked("high-mitigated", RiskStatus::Mitigated));

        let ids: Vec<&str> = sort_risks(&risks, &tracking)
            .iter()
            .map(|r| r.synthetic_id.as_str())
            .collect();
        assert_eq!(ids, vec!["critical", "high-open", "high-mitigated", "low"]);
    }

    #[test]
    fn test_filters_and_statistics() {
        use RiskExploitationImpact as I;
        use RiskExploitationLikelihood as L;
        let risks = vec![
            risk("a", L::Unlikely, I::Low),
            risk("b", L::Unlikely, I::Low),
            risk("c", L::Likely, I::High),
        ];
        let mut tracking = ReconciliationReport::default();
        tracking.assign("b", &tracked("b", RiskStatus::FalsePositive));
        let all: Vec<&Risk> = risks.iter().collect();

        assert_eq!(still_at_risk(&all, &tracking).len(), 2);
        assert_eq!(of_severity(&all, RiskSeverity::Low).len(), 2);
        assert_eq!(highest_severity(&risks), Some(RiskSeverity::High));
        assert_eq!(highest_severity(Vec::<&Risk>::new()), None);

        let stats = RiskStatistics::collect(&risks, &tracking);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.still_at_risk, 2);
        assert_eq!(stats.count(RiskSeverity::Low, RiskStatus::Unchecked), 1);
        assert_eq!(stats.count(RiskSeverity::Low, RiskStatus::FalsePositive), 1);
        assert_eq!(stats.count(RiskSeverity::Critical, RiskStatus::Accepted), 0);
    }
}
