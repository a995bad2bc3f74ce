//! Options controlling a single analysis run.

use crate::cli::Args;
use std::collections::BTreeSet;

/// Caller-supplied switches for [`crate::analyzer::ThreatAnalyzer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Category IDs of rules that must not run
    pub skipped_rules: BTreeSet<String>,
    /// Downgrade unmatched exact tracking entries from an error to a warning
    pub ignore_orphaned_risk_tracking: bool,
    /// Evaluate rules on the rayon pool instead of one after another
    pub parallel_rules: bool,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_rule(mut self, category_id: impl Into<String>) -> Self {
        let id = category_id.into().trim().to_lowercase();
        if !id.is_empty() {
            self.skipped_rules.insert(id);
        }
        self
    }

    pub fn ignore_orphaned_risk_tracking(mut self, ignore: bool) -> Self {
        self.ignore_orphaned_risk_tracking = ignore;
        self
    }

    pub fn parallel_rules(mut self, parallel: bool) -> Self {
        self.parallel_rules = parallel;
        self
    }

    pub fn is_skipped(&self, category_id: &str) -> bool {
        self.skipped_rules.contains(&category_id.to_lowercase())
    }
}

impl From<&Args> for AnalysisOptions {
    fn from(args: &Args) -> Self {
        args.skip_rules.iter().fold(
            AnalysisOptions::new()
                .ignore_orphaned_risk_tracking(args.ignore_orphaned_risk_tracking)
                .parallel_rules(args.parallel),
            |options, id| options.skip_rule(id.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::default();
        assert!(options.skipped_rules.is_empty());
        assert!(!options.ignore_orphaned_risk_tracking);
        assert!(!options.parallel_rules);
    }

    #[test]
    fn test_skip_rule_normalizes() {
        let options = AnalysisOptions::new().skip_rule(" Missing-WAF ").skip_rule("");
        assert_eq!(options.skipped_rules.len(), 1);
        assert!(options.is_skipped("missing-waf"));
        assert!(options.is_skipped("MISSING-WAF"));
    }

    #[test]
    fn test_from_args() {
        let args = Args::parse_from([
            "threatlens",
            "--model",
            "model.json",
            "--skip-rules",
            "missing-waf,missing-hardening",
            "--parallel",
        ]);
        let options = AnalysisOptions::from(&args);
        assert!(options.parallel_rules);
        assert!(!options.ignore_orphaned_risk_tracking);
        assert!(options.is_skipped("missing-hardening"));
        assert!(options.is_skipped("missing-waf"));
    }
}
