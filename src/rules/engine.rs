use super::{builtin, RiskRule};
use crate::config::AnalysisOptions;
use crate::graph::ThreatModel;
use crate::models::{Risk, RiskCategory};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};

/// Registry of rules plus the switches for one evaluation.
pub struct RiskEngine {
    rules: Vec<Box<dyn RiskRule>>,
    skipped: BTreeSet<String>,
    parallel: bool,
}

/// What a single rule left behind.
enum RuleOutcome {
    Skipped(String),
    Completed {
        category: RiskCategory,
        tags: Vec<String>,
        risks: Vec<Risk>,
    },
    Failed {
        rule: String,
        message: String,
    },
}

impl RiskEngine {
    /// Engine with an empty registry.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            skipped: BTreeSet::new(),
            parallel: false,
        }
    }

    /// Engine preloaded with every built-in rule.
    pub fn with_builtin_rules() -> Self {
        let mut engine = Self::new();
        for rule in builtin::all() {
            engine.register(rule);
        }
        engine
    }

    /// Built-ins configured from caller options.
    pub fn from_options(options: &AnalysisOptions) -> Self {
        Self::with_builtin_rules()
            .skip_rules(options.skipped_rules.iter())
            .parallel(options.parallel_rules)
    }

    pub fn register(&mut self, rule: Box<dyn RiskRule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn skip_rules<I, S>(mut self, category_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skipped
            .extend(category_ids.into_iter().map(|id| id.as_ref().trim().to_lowercase()));
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate every non-skipped rule against the model.
    ///
    /// Individual risks declared in the model are seeded first. Rule output is
    /// then merged in registry order, first writer wins on synthetic ID.
    pub fn run(&self, model: &ThreatModel) -> GeneratedRisks {
        let mut generated = GeneratedRisks::default();

        for category in model.individual_risk_categories() {
            generated.add_category(category.clone());
        }
        for risk in model.individual_risks() {
            generated.insert(risk.clone(), "individual risks");
        }

        log::debug!(
            "Evaluating {} risk rules ({})",
            self.rules.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let outcomes: Vec<RuleOutcome> = if self.parallel {
            self.rules
                .par_iter()
                .enumerate()
                .map(|(position, rule)| self.evaluate(position, &**rule, model))
                .collect()
        } else {
            self.rules
                .iter()
                .enumerate()
                .map(|(position, rule)| self.evaluate(position, &**rule, model))
                .collect()
        };

        for outcome in outcomes {
            match outcome {
                RuleOutcome::Skipped(id) => log::info!("Skipping risk rule: {}", id),
                RuleOutcome::Completed {
                    category,
                    tags,
                    risks,
                } => {
                    let category_id = category.id.clone();
                    log::debug!("Rule {} produced {} risks", category_id, risks.len());
                    generated.supported_tags.extend(tags);
                    generated.add_category(category);
                    for risk in risks {
                        generated.insert(risk, &category_id);
                    }
                }
                RuleOutcome::Failed { rule, message } => {
                    log::error!("Risk rule {} failed and was skipped: {}", rule, message);
                    generated.failed_rules.push(rule);
                }
            }
        }

        log::info!(
            "Generated {} risks in {} categories ({} rules failed)",
            generated.len(),
            generated.categories.len(),
            generated.failed_rules.len()
        );
        generated
    }

    /// Run one rule with every call into it guarded against panics.
    fn evaluate(&self, position: usize, rule: &dyn RiskRule, model: &ThreatModel) -> RuleOutcome {
        // until the category is known the rule is named by its registry slot
        let mut name = format!("rule #{}", position + 1);
        let guarded = panic::catch_unwind(AssertUnwindSafe(|| {
            let category = rule.category();
            name = category.id.clone();
            if self.skipped.contains(&category.id.to_lowercase()) {
                return Ok(None);
            }
            let tags: Vec<String> = rule
                .supported_tags()
                .into_iter()
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect();
            rule.generate_risks(model).map(|risks| Some((category, tags, risks)))
        }));
        match guarded {
            Ok(Ok(Some((category, tags, risks)))) => RuleOutcome::Completed {
                category,
                tags,
                risks,
            },
            Ok(Ok(None)) => RuleOutcome::Skipped(name),
            Ok(Err(err)) => RuleOutcome::Failed {
                rule: name,
                message: err.to_string(),
            },
            Err(payload) => RuleOutcome::Failed {
                rule: name,
                message: panic_message(payload.as_ref()),
            },
        }
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// Deduplicated findings of one engine run.
#[derive(Debug, Clone, Default)]
pub struct GeneratedRisks {
    risks: Vec<Risk>,
    index: HashMap<String, usize>,
    categories: Vec<RiskCategory>,
    supported_tags: BTreeSet<String>,
    failed_rules: Vec<String>,
}

impl GeneratedRisks {
    /// Keep the risk unless its synthetic ID is already taken.
    fn insert(&mut self, risk: Risk, origin: &str) -> bool {
        let key = risk.key();
        if self.index.contains_key(&key) {
            log::warn!(
                "Dropping duplicate risk {} from {}: synthetic ID already generated",
                risk.synthetic_id,
                origin
            );
            return false;
        }
        self.index.insert(key, self.risks.len());
        self.risks.push(risk);
        true
    }

    fn add_category(&mut self, category: RiskCategory) {
        if !self.categories.iter().any(|c| c.id == category.id) {
            self.categories.push(category);
        }
    }

    /// All risks in insertion order.
    pub fn risks(&self) -> &[Risk] {
        &self.risks
    }

    /// Case-insensitive lookup by synthetic ID.
    pub fn get(&self, synthetic_id: &str) -> Option<&Risk> {
        self.index
            .get(&synthetic_id.to_lowercase())
            .map(|&position| &self.risks[position])
    }

    pub fn contains(&self, synthetic_id: &str) -> bool {
        self.index.contains_key(&synthetic_id.to_lowercase())
    }

    pub fn synthetic_ids(&self) -> impl Iterator<Item = &str> {
        self.risks.iter().map(|risk| risk.synthetic_id.as_str())
    }

    /// Catalog of categories that ran successfully, plus individual ones.
    pub fn categories(&self) -> &[RiskCategory] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&RiskCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn risks_of_category(&self, category_id: &str) -> Vec<&Risk> {
        self.risks
            .iter()
            .filter(|risk| risk.category_id == category_id)
            .collect()
    }

    /// Category ID → risks. Categories without findings are absent.
    pub fn risks_by_category(&self) -> BTreeMap<&str, Vec<&Risk>> {
        let mut grouped: BTreeMap<&str, Vec<&Risk>> = BTreeMap::new();
        for risk in &self.risks {
            grouped.entry(risk.category_id.as_str()).or_default().push(risk);
        }
        grouped
    }

    pub fn supported_tags(&self) -> &BTreeSet<String> {
        &self.supported_tags
    }

    /// Category IDs of rules that returned an error or panicked.
    pub fn failed_rules(&self) -> &[String] {
        &self.failed_rules
    }

    pub fn len(&self) -> usize {
        self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ThreatError, ThreatResult};
    use crate::models::{RiskExploitationImpact, RiskExploitationLikelihood, RiskFunction, Stride};
    use crate::testing::build;
    use serde_json::json;

    struct FixedRule {
        id: &'static str,
        ids: Vec<&'static str>,
        tags: Vec<&'static str>,
    }

    impl RiskRule for FixedRule {
        fn category(&self) -> RiskCategory {
            RiskCategory::new(self.id, self.id, RiskFunction::Architecture, Stride::Tampering, 0)
        }

        fn supported_tags(&self) -> Vec<String> {
            self.tags.iter().map(|t| t.to_string()).collect()
        }

        fn generate_risks(&self, _model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
            let category = self.category();
            Ok(self
                .ids
                .iter()
                .map(|id| {
                    Risk::new(
                        &category,
                        RiskExploitationLikelihood::Likely,
                        RiskExploitationImpact::Medium,
                        format!("{} finding", self.id),
                        *id,
                    )
                })
                .collect())
        }
    }

    struct FailingRule;

    impl RiskRule for FailingRule {
        fn category(&self) -> RiskCategory {
            RiskCategory::new(
                "failing",
                "Failing",
                RiskFunction::Operations,
                Stride::Repudiation,
                0,
            )
        }

        fn generate_risks(&self, _model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
            Err(ThreatError::rule("failing", "no data"))
        }
    }

    struct PanickingRule;

    impl RiskRule for PanickingRule {
        fn category(&self) -> RiskCategory {
            RiskCategory::new(
                "panicking",
                "Panicking",
                RiskFunction::Operations,
                Stride::Repudiation,
                0,
            )
        }

        fn generate_risks(&self, _model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
            panic!("index out of range")
        }
    }

    struct BrokenTagsRule;

    impl RiskRule for BrokenTagsRule {
        fn category(&self) -> RiskCategory {
            RiskCategory::new(
                "broken-tags",
                "Broken Tags",
                RiskFunction::Operations,
                Stride::Spoofing,
                0,
            )
        }

        fn supported_tags(&self) -> Vec<String> {
            panic!("tag table missing")
        }

        fn generate_risks(&self, _model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
            Ok(Vec::new())
        }
    }

    struct BrokenCategoryRule;

    impl RiskRule for BrokenCategoryRule {
        fn category(&self) -> RiskCategory {
            panic!("category not configured")
        }

        fn generate_risks(&self, _model: &ThreatModel) -> ThreatResult<Vec<Risk>> {
            Ok(Vec::new())
        }
    }

    fn fixed(id: &'static str, ids: &[&'static str]) -> Box<dyn RiskRule> {
        Box::new(FixedRule {
            id,
            ids: ids.to_vec(),
            tags: vec![],
        })
    }

    fn empty_model() -> ThreatModel {
        build(json!({ "technical_assets": { "Web": {} } }))
    }

    #[test]
    fn test_first_writer_wins() {
        let mut engine = RiskEngine::new();
        engine.register(fixed("one", &["shared@x", "one@a"]));
        engine.register(fixed("two", &["SHARED@X", "two@b"]));
        let generated = engine.run(&empty_model());
        assert_eq!(generated.len(), 3);
        assert_eq!(generated.get("shared@x").unwrap().category_id, "one");
        assert!(generated.contains("Two@B"));
    }

    #[test]
    fn test_failing_and_panicking_rules_are_isolated() {
        let mut engine = RiskEngine::new();
        engine.register(Box::new(FailingRule));
        engine.register(Box::new(PanickingRule));
        engine.register(fixed("ok", &["ok@a"]));
        let generated = engine.run(&empty_model());
        assert_eq!(generated.failed_rules(), &["failing".to_string(), "panicking".to_string()]);
        assert_eq!(generated.synthetic_ids().collect::<Vec<_>>(), vec!["ok@a"]);
        assert!(generated.category("failing").is_none());
        assert!(generated.category("ok").is_some());
    }

    #[test]
    fn test_panicking_metadata_calls_are_isolated() {
        for parallel in [false, true] {
            let mut engine = RiskEngine::new();
            engine.register(fixed("first", &["first@a"]));
            engine.register(Box::new(BrokenTagsRule));
            engine.register(Box::new(BrokenCategoryRule));
            engine.register(fixed("last", &["last@a"]));
            let generated = engine.parallel(parallel).run(&empty_model());
            assert_eq!(
                generated.failed_rules(),
                &["broken-tags".to_string(), "rule #3".to_string()]
            );
            assert_eq!(generated.synthetic_ids().collect::<Vec<_>>(), vec!["first@a", "last@a"]);
            assert!(generated.category("broken-tags").is_none());
        }
    }

    #[test]
    fn test_skipped_rules_do_not_run() {
        let mut engine = RiskEngine::new();
        engine.register(fixed("one", &["one@a"]));
        engine.register(Box::new(FixedRule {
            id: "two",
            ids: vec!["two@a"],
            tags: vec!["docker"],
        }));
        let engine = engine.skip_rules(["TWO"]);
        let generated = engine.run(&empty_model());
        assert_eq!(generated.len(), 1);
        assert!(generated.supported_tags().is_empty());
    }

    #[test]
    fn test_supported_tags_collected() {
        let mut engine = RiskEngine::new();
        engine.register(Box::new(FixedRule {
            id: "tagged",
            ids: vec![],
            tags: vec![" Docker", "kubernetes"],
        }));
        let generated = engine.run(&empty_model());
        let tags: Vec<&str> = generated.supported_tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["docker", "kubernetes"]);
    }

    #[test]
    fn test_individual_risks_seeded_first() {
        let model = build(json!({
            "technical_assets": { "Web": {} },
            "individual_risk_categories": {
                "Custom": {
                    "function": "operations",
                    "stride": "tampering",
                    "risks_identified": { "Thing": { "most_relevant_technical_asset": "web" } }
                }
            }
        }));
        let mut engine = RiskEngine::new();
        engine.register(fixed("rule", &["custom@web:thing"]));
        let generated = engine.run(&model);
        assert_eq!(generated.len(), 1);
        assert_eq!(generated.risks()[0].category_id, "custom");
        assert!(generated.category("custom").is_some());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = empty_model();
        let build_engine = |parallel: bool| {
            let mut engine = RiskEngine::new();
            engine.register(fixed("a", &["dup@1", "a@1"]));
            engine.register(fixed("b", &["dup@1", "b@1"]));
            engine.register(Box::new(PanickingRule));
            engine.register(fixed("c", &["c@1"]));
            engine.parallel(parallel)
        };
        let sequential = build_engine(false).run(&model);
        let parallel = build_engine(true).run(&model);
        let ids = |g: &GeneratedRisks| g.synthetic_ids().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(ids(&sequential), ids(&parallel));
        assert_eq!(parallel.get("dup@1").unwrap().category_id, "a");
        assert_eq!(sequential.failed_rules(), parallel.failed_rules());
    }

    #[test]
    fn test_risks_by_category() {
        let mut engine = RiskEngine::new();
        engine.register(fixed("a", &["a@1", "a@2"]));
        engine.register(fixed("b", &[]));
        let generated = engine.run(&empty_model());
        let grouped = generated.risks_by_category();
        assert_eq!(grouped["a"].len(), 2);
        assert!(!grouped.contains_key("b"));
        assert_eq!(generated.categories().len(), 2);
        assert_eq!(generated.risks_of_category("a").len(), 2);
    }
}
