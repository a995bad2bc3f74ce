//! Risk categories, findings and tracking records.

use super::types::*;
use chrono::NaiveDate;
use serde::Serialize;

/// Catalog entry describing one kind of finding.
#[derive(Debug, Clone, Serialize)]
pub struct RiskCategory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub asvs: String,
    pub cheat_sheet: String,
    pub action: String,
    pub mitigation: String,
    pub check: String,
    pub function: RiskFunction,
    pub stride: Stride,
    pub detection_logic: String,
    pub risk_assessment: String,
    pub false_positives: String,
    pub model_failure_possible_reason: bool,
    pub cwe: u32,
}

impl RiskCategory {
    /// Category with just the classification set; narrative fields empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        function: RiskFunction,
        stride: Stride,
        cwe: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            impact: String::new(),
            asvs: String::new(),
            cheat_sheet: String::new(),
            action: String::new(),
            mitigation: String::new(),
            check: String::new(),
            function,
            stride,
            detection_logic: String::new(),
            risk_assessment: String::new(),
            false_positives: String::new(),
            model_failure_possible_reason: false,
            cwe,
        }
    }
}

/// Maps likelihood × impact onto a severity.
pub fn calculate_severity(
    likelihood: RiskExploitationLikelihood,
    impact: RiskExploitationImpact,
) -> RiskSeverity {
    match likelihood.weight() * impact.weight() {
        0..=1 => RiskSeverity::Low,
        2..=3 => RiskSeverity::Medium,
        4..=8 => RiskSeverity::Elevated,
        9..=12 => RiskSeverity::High,
        _ => RiskSeverity::Critical,
    }
}

/// Compose a synthetic risk ID: `category@part@part...`, skipping empty parts.
///
/// Every rule builds its IDs through this helper so composition stays uniform.
pub fn synthetic_id<S: AsRef<str>>(category_id: &str, parts: &[S]) -> String {
    let mut id = category_id.to_string();
    for part in parts {
        let part = part.as_ref();
        if !part.is_empty() {
            id.push('@');
            id.push_str(part);
        }
    }
    id
}

/// A single finding.
#[derive(Debug, Clone, Serialize)]
pub struct Risk {
    pub category_id: String,
    pub severity: RiskSeverity,
    pub exploitation_likelihood: RiskExploitationLikelihood,
    pub exploitation_impact: RiskExploitationImpact,
    pub title: String,
    pub synthetic_id: String,
    pub most_relevant_data_asset_id: Option<String>,
    pub most_relevant_technical_asset_id: Option<String>,
    pub most_relevant_trust_boundary_id: Option<String>,
    pub most_relevant_shared_runtime_id: Option<String>,
    pub most_relevant_communication_link_id: Option<String>,
    pub data_breach_probability: DataBreachProbability,
    pub data_breach_technical_asset_ids: Vec<String>,
}

impl Risk {
    /// New finding with severity derived from the likelihood/impact matrix.
    pub fn new(
        category: &RiskCategory,
        likelihood: RiskExploitationLikelihood,
        impact: RiskExploitationImpact,
        title: impl Into<String>,
        synthetic_id: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category.id.clone(),
            severity: calculate_severity(likelihood, impact),
            exploitation_likelihood: likelihood,
            exploitation_impact: impact,
            title: title.into(),
            synthetic_id: synthetic_id.into(),
            most_relevant_data_asset_id: None,
            most_relevant_technical_asset_id: None,
            most_relevant_trust_boundary_id: None,
            most_relevant_shared_runtime_id: None,
            most_relevant_communication_link_id: None,
            data_breach_probability: DataBreachProbability::Possible,
            data_breach_technical_asset_ids: Vec::new(),
        }
    }

    /// Override the matrix for categories whose severity is fixed by definition.
    pub fn with_fixed_severity(mut self, severity: RiskSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_technical_asset(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_technical_asset_id = Some(id.into());
        self
    }

    pub fn with_data_asset(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_data_asset_id = Some(id.into());
        self
    }

    pub fn with_communication_link(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_communication_link_id = Some(id.into());
        self
    }

    pub fn with_trust_boundary(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_trust_boundary_id = Some(id.into());
        self
    }

    pub fn with_shared_runtime(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_shared_runtime_id = Some(id.into());
        self
    }

    pub fn with_data_breach(
        mut self,
        probability: DataBreachProbability,
        technical_asset_ids: Vec<String>,
    ) -> Self {
        self.data_breach_probability = probability;
        self.data_breach_technical_asset_ids = technical_asset_ids;
        self
    }

    /// Lowercased synthetic ID used as the deduplication key.
    pub fn key(&self) -> String {
        self.synthetic_id.to_lowercase()
    }
}

/// A human-maintained tracking record, keyed by an exact or wildcard synthetic ID.
#[derive(Debug, Clone, Serialize)]
pub struct RiskTracking {
    pub synthetic_risk_id: String,
    pub justification: String,
    pub ticket: String,
    pub checked_by: String,
    pub status: RiskStatus,
    pub date: NaiveDate,
}

impl RiskTracking {
    /// Entries containing `*` match a family of risk IDs.
    pub fn is_wildcard(&self) -> bool {
        self.synthetic_risk_id.contains('*')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_matrix() {
        use RiskExploitationImpact as I;
        use RiskExploitationLikelihood as L;
        assert_eq!(calculate_severity(L::Unlikely, I::Low), RiskSeverity::Low);
        assert_eq!(calculate_severity(L::Unlikely, I::Medium), RiskSeverity::Medium);
        assert_eq!(calculate_severity(L::Likely, I::Medium), RiskSeverity::Elevated);
        assert_eq!(calculate_severity(L::Unlikely, I::VeryHigh), RiskSeverity::Elevated);
        assert_eq!(calculate_severity(L::VeryLikely, I::High), RiskSeverity::High);
        assert_eq!(calculate_severity(L::Frequent, I::High), RiskSeverity::High);
        assert_eq!(calculate_severity(L::Frequent, I::VeryHigh), RiskSeverity::Critical);
    }

    #[test]
    fn test_synthetic_id_skips_empty_parts() {
        assert_eq!(synthetic_id("cat", &["a", "", "b"]), "cat@a@b");
        assert_eq!(synthetic_id::<&str>("cat", &[]), "cat");
    }

    #[test]
    fn test_fixed_severity_overrides_matrix() {
        let category =
            RiskCategory::new("x", "X", RiskFunction::Architecture, Stride::Spoofing, 1008);
        let risk = Risk::new(
            &category,
            RiskExploitationLikelihood::Frequent,
            RiskExploitationImpact::VeryHigh,
            "t",
            "x@a",
        )
        .with_fixed_severity(RiskSeverity::Low);
        assert_eq!(risk.severity, RiskSeverity::Low);
        assert_eq!(risk.category_id, "x");
    }
}
