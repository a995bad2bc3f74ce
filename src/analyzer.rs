//! One-call analysis pipeline: build → score → evaluate rules → reconcile.

use crate::builder::build_model;
use crate::config::AnalysisOptions;
use crate::errors::{ThreatError, ThreatResult};
use crate::graph::ThreatModel;
use crate::raa::RaaScorer;
use crate::report::AnalysisReport;
use crate::rules::{GeneratedRisks, RiskEngine};
use crate::tracking::{ReconciliationReport, RiskTrackingReconciler};
use std::path::Path;
use std::time::Instant;

/// Everything one run produced. The model is exclusively owned by the run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub model: ThreatModel,
    pub risks: GeneratedRisks,
    pub reconciliation: ReconciliationReport,
}

impl AnalysisOutcome {
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::new(&self.model, &self.risks, self.reconciliation.clone())
    }
}

pub struct ThreatAnalyzer {
    options: AnalysisOptions,
    engine: RiskEngine,
}

impl ThreatAnalyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        let engine = RiskEngine::from_options(&options);
        Self { options, engine }
    }

    /// Analyzer with a caller-assembled rule engine, e.g. with custom rules registered.
    pub fn with_engine(options: AnalysisOptions, engine: RiskEngine) -> Self {
        Self { options, engine }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn analyze(&self, document: serde_json::Value) -> ThreatResult<AnalysisOutcome> {
        let start = Instant::now();

        let mut model = build_model(document)?;
        log::info!(
            "Model '{}' built: {} technical assets, {} data assets, {} trust boundaries",
            model.title,
            model.technical_assets().count(),
            model.data_assets().count(),
            model.trust_boundaries().count()
        );

        RaaScorer::new().apply(&mut model);

        let risks = self.engine.run(&model);

        let reconciliation = RiskTrackingReconciler::new(self.options.ignore_orphaned_risk_tracking)
            .reconcile(&risks, model.risk_tracking())?;

        log::debug!("Analysis finished in {:.2?}", start.elapsed());
        Ok(AnalysisOutcome {
            model,
            risks,
            reconciliation,
        })
    }

    pub fn analyze_file(&self, path: &Path) -> ThreatResult<AnalysisOutcome> {
        log::info!("Reading model from {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| ThreatError::io(e, Some(path.to_path_buf())))?;
        let document: serde_json::Value = serde_json::from_str(&text)?;
        self.analyze(document)
    }
}

impl Default for ThreatAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn shop() -> serde_json::Value {
        json!({
            "title": "Web Shop",
            "date": "2024-03-01",
            "data_assets": {
                "Orders": { "confidentiality": "confidential", "integrity": "critical" }
            },
            "technical_assets": {
                "Browser": {
                    "technology": "browser",
                    "internet": true,
                    "used_as_client_by_human": true,
                    "communication_links": {
                        "Shop Traffic": { "target": "web", "protocol": "http", "data_assets_sent": ["orders"] }
                    }
                },
                "Web": {
                    "technology": "web-application",
                    "data_assets_processed": ["orders"],
                    "communication_links": {
                        "Query": { "target": "db", "protocol": "jdbc", "authentication": "credentials", "data_assets_sent": ["orders"] }
                    }
                },
                "Db": {
                    "type": "datastore",
                    "technology": "database",
                    "confidentiality": "confidential",
                    "data_assets_stored": ["orders"]
                }
            },
            "trust_boundaries": {
                "Internet": { "type": "network-dedicated-hoster", "technical_assets_inside": ["browser"] },
                "Backend": { "technical_assets_inside": ["web", "db"] }
            }
        })
    }

    #[test]
    fn test_unauthenticated_link_to_sensitive_target() {
        let outcome = ThreatAnalyzer::default()
            .analyze(json!({
                "technical_assets": {
                    "A": {
                        "confidentiality": "public",
                        "communication_links": { "Fetch": { "target": "b", "protocol": "https" } }
                    },
                    "B": { "confidentiality": "confidential" }
                }
            }))
            .unwrap();
        let found = outcome.risks.risks_of_category("missing-authentication");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].synthetic_id, "missing-authentication@a>fetch@a@b");
        assert_eq!(found[0].most_relevant_technical_asset_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_asset_in_two_boundaries_fails_build() {
        let err = ThreatAnalyzer::default()
            .analyze(json!({
                "technical_assets": { "A": {} },
                "trust_boundaries": {
                    "Zone One": { "technical_assets_inside": ["a"] },
                    "Zone Two": { "technical_assets_inside": ["a"] }
                }
            }))
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ThreatError::AssetInMultipleBoundaries { .. }));
        assert!(message.contains("zone-one"));
        assert!(message.contains("zone-two"));
    }

    #[test]
    fn test_mixed_runtime_reported_once() {
        let outcome = ThreatAnalyzer::default()
            .analyze(json!({
                "technical_assets": {
                    "Proxy": { "technology": "reverse-proxy" },
                    "Store": { "type": "datastore", "technology": "database" }
                },
                "shared_runtimes": { "Node": { "technical_assets_running": ["proxy", "store"] } }
            }))
            .unwrap();
        let found = outcome.risks.risks_of_category("mixed-targets-on-shared-runtime");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].most_relevant_shared_runtime_id.as_deref(), Some("node"));
    }

    #[test]
    fn test_skipped_rule_produces_nothing() {
        let options = AnalysisOptions::new().skip_rule("Unencrypted-Communication");
        let outcome = ThreatAnalyzer::new(options).analyze(shop()).unwrap();
        assert!(outcome.risks.risks_of_category("unencrypted-communication").is_empty());
        assert!(outcome.risks.category("unencrypted-communication").is_none());

        let full = ThreatAnalyzer::default().analyze(shop()).unwrap();
        assert!(!full.risks.risks_of_category("unencrypted-communication").is_empty());
        // a superset of rules never loses a finding
        assert!(outcome.risks.synthetic_ids().all(|id| full.risks.contains(id)));
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let sequential = ThreatAnalyzer::default().analyze(shop()).unwrap();
        let parallel = ThreatAnalyzer::new(AnalysisOptions::new().parallel_rules(true))
            .analyze(shop())
            .unwrap();
        let again = ThreatAnalyzer::default().analyze(shop()).unwrap();
        let a: Vec<&str> = sequential.risks.synthetic_ids().collect();
        let b: Vec<&str> = parallel.risks.synthetic_ids().collect();
        let c: Vec<&str> = again.risks.synthetic_ids().collect();
        assert!(!a.is_empty());
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_orphaned_tracking_respects_option() {
        let mut document = shop();
        document["risk_tracking"] = json!({ "no-such-risk@web": { "status": "accepted" } });

        let err = ThreatAnalyzer::default().analyze(document.clone()).unwrap_err();
        assert!(matches!(err, ThreatError::OrphanedRiskTracking { .. }));

        let tolerant = AnalysisOptions::new().ignore_orphaned_risk_tracking(true);
        let outcome = ThreatAnalyzer::new(tolerant).analyze(document).unwrap();
        assert_eq!(outcome.reconciliation.orphaned, 1);
    }

    #[test]
    fn test_wildcard_tracking_marks_report_entries() {
        let mut document = shop();
        document["risk_tracking"] = json!({
            "unencrypted-communication@*": { "status": "mitigated", "date": "2024-03-02" }
        });
        let outcome = ThreatAnalyzer::default().analyze(document).unwrap();
        let report = outcome.report();
        let tracked: Vec<_> = report
            .risks
            .iter()
            .filter(|r| r.risk.category_id == "unencrypted-communication")
            .collect();
        assert!(!tracked.is_empty());
        assert!(tracked.iter().all(|r| r.status == RiskStatus::Mitigated));
        assert!(tracked
            .iter()
            .all(|r| r.tracking_id.as_deref() == Some("unencrypted-communication@*")));
    }

    #[test]
    fn test_report_written_from_model_file() {
        let mut model_file = NamedTempFile::new().unwrap();
        write!(model_file, "{}", shop()).unwrap();

        let outcome = ThreatAnalyzer::default().analyze_file(model_file.path()).unwrap();
        let report = outcome.report();
        assert_eq!(report.title, "Web Shop");
        assert_eq!(report.counts.technical_assets, 3);
        assert_eq!(report.statistics.total, outcome.risks.len());

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        report.write_to(&out).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["title"], "Web Shop");
        assert_eq!(written["date"], "2024-03-01");
        assert_eq!(written["risks"].as_array().unwrap().len(), outcome.risks.len());
    }

    #[test]
    fn test_missing_model_file_is_io_error() {
        let err = ThreatAnalyzer::default()
            .analyze_file(Path::new("/nonexistent/model.json"))
            .unwrap_err();
        assert!(matches!(err, ThreatError::Io { path: Some(_), .. }));
    }
}
