//! Model builder and validator.
//!
//! Turns the recognized input shape into a fully cross-referenced
//! [`ThreatModel`]. Phases run in a fixed order because each one resolves
//! references against the entities produced before it:
//!
//! 1. top-level metadata
//! 2. data assets
//! 3. technical assets (reference data assets)
//! 4. communication links (reference technical and data assets)
//! 5. trust boundaries and their nesting
//! 6. shared runtimes
//! 7. individual risk categories and declared risks
//! 8. risk tracking entries
//!
//! Any referential problem aborts the build; a partial model is never returned.

mod ids;
mod nesting;

pub use ids::{is_valid_id, make_id, normalize_tag, normalize_tags, risk_title_suffix};

use crate::errors::{ThreatError, ThreatResult};
use crate::graph::ThreatModel;
use crate::input::*;
use crate::models::*;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Decode a generic document and build the model from it.
pub fn build_model(document: serde_json::Value) -> ThreatResult<ThreatModel> {
    let input = ModelInput::from_value(document)?;
    ModelBuilder::new(&input).build()
}

/// Parse an optional keyword, falling back to `default` when absent or empty.
fn parse_or<T: FromStr>(
    value: Option<&str>,
    default: T,
    context: &str,
    field: &'static str,
) -> ThreatResult<T> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ThreatError::invalid_value(context, field, raw)),
    }
}

fn parse_required<T: FromStr>(
    value: Option<&str>,
    context: &str,
    field: &'static str,
) -> ThreatResult<T> {
    let raw = value.map(str::trim).unwrap_or_default();
    raw.parse()
        .map_err(|_| ThreatError::invalid_value(context, field, raw))
}

/// `YYYY-MM-DD` or RFC 3339; anything else falls back to today with a warning.
fn parse_date(value: Option<&str>, context: &str) -> NaiveDate {
    let today = Utc::now().date_naive();
    let raw = match value.map(str::trim) {
        None | Some("") => return today,
        Some(raw) => raw,
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .unwrap_or_else(|| {
            log::warn!("Invalid date '{}' in {}, using current date", raw, context);
            today
        })
}

pub struct ModelBuilder<'a> {
    input: &'a ModelInput,
    model: ThreatModel,
    /// technical asset title → resolved ID
    asset_ids: BTreeMap<String, String>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(input: &'a ModelInput) -> Self {
        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled Model")
            .to_string();
        let date = parse_date(input.date.as_deref(), "model date");
        Self {
            input,
            model: ThreatModel::empty(title, date),
            asset_ids: BTreeMap::new(),
        }
    }

    /// Run every phase and hand out the finished model.
    pub fn build(mut self) -> ThreatResult<ThreatModel> {
        self.parse_metadata()?;
        self.build_data_assets()?;
        self.build_technical_assets()?;
        self.build_communication_links()?;
        self.build_trust_boundaries()?;
        self.build_shared_runtimes()?;
        self.build_individual_risks()?;
        self.load_risk_tracking()?;
        log::info!(
            "Built model '{}': {} data assets, {} technical assets, {} links, \
             {} trust boundaries, {} shared runtimes",
            self.model.title,
            self.model.data_assets.len(),
            self.model.technical_assets.len(),
            self.model.link_index.len(),
            self.model.trust_boundaries.len(),
            self.model.shared_runtimes.len()
        );
        Ok(self.model)
    }

    fn parse_metadata(&mut self) -> ThreatResult<()> {
        let input = self.input;
        let model = &mut self.model;
        model.business_criticality = parse_or(
            input.business_criticality.as_deref(),
            Criticality::Important,
            "model",
            "business_criticality",
        )?;
        model.author = Author {
            name: input.author.name.clone(),
            homepage: input.author.homepage.clone(),
        };
        model.management_summary_comment = input.management_summary_comment.clone();
        model.business_overview = input.business_overview.description.clone();
        model.technical_overview = input.technical_overview.description.clone();
        model.questions = input.questions.clone();
        model.abuse_cases = input.abuse_cases.clone();
        model.security_requirements = input.security_requirements.clone();
        model.tags_available = normalize_tags(&input.tags_available);
        Ok(())
    }

    fn build_data_assets(&mut self) -> ThreatResult<()> {
        for (title, input) in &self.input.data_assets {
            let context = format!("data asset '{}'", title);
            let id = ids::resolve_id(input.id.as_deref(), title, &context)?;
            if self.model.data_assets.contains_key(&id) {
                return Err(ThreatError::DuplicateId { kind: "data asset", id });
            }
            let asset = DataAsset {
                id: id.clone(),
                title: title.clone(),
                description: input.description.clone(),
                usage: parse_or(input.usage.as_deref(), Usage::default(), &context, "usage")?,
                tags: normalize_tags(&input.tags),
                origin: input.origin.clone(),
                owner: input.owner.clone(),
                quantity: parse_or(
                    input.quantity.as_deref(),
                    Quantity::default(),
                    &context,
                    "quantity",
                )?,
                confidentiality: parse_or(
                    input.confidentiality.as_deref(),
                    Confidentiality::default(),
                    &context,
                    "confidentiality",
                )?,
                integrity: parse_or(
                    input.integrity.as_deref(),
                    Criticality::default(),
                    &context,
                    "integrity",
                )?,
                availability: parse_or(
                    input.availability.as_deref(),
                    Criticality::default(),
                    &context,
                    "availability",
                )?,
                justification_cia_rating: input.justification_cia_rating.clone(),
            };
            self.model.data_assets.insert(id, asset);
        }
        log::debug!("Parsed {} data assets", self.model.data_assets.len());
        Ok(())
    }

    /// Trimmed data asset references, each of which must already exist.
    fn data_asset_refs(&self, refs: &[String], context: &str) -> ThreatResult<Vec<String>> {
        refs.iter()
            .map(|raw| {
                let id = raw.trim();
                if self.model.data_assets.contains_key(id) {
                    Ok(id.to_string())
                } else {
                    Err(ThreatError::missing("data asset", context, id))
                }
            })
            .collect()
    }

    fn build_technical_assets(&mut self) -> ThreatResult<()> {
        for (title, input) in &self.input.technical_assets {
            let context = format!("technical asset '{}'", title);
            let id = ids::resolve_id(input.id.as_deref(), title, &context)?;
            if self.model.technical_assets.contains_key(&id) {
                return Err(ThreatError::DuplicateId { kind: "technical asset", id });
            }
            let data_assets_processed = self.data_asset_refs(
                &input.data_assets_processed,
                &format!("{} (processed)", context),
            )?;
            let data_assets_stored =
                self.data_asset_refs(&input.data_assets_stored, &format!("{} (stored)", context))?;
            let data_formats_accepted = input
                .data_formats_accepted
                .iter()
                .map(|raw| {
                    raw.parse::<DataFormat>().map_err(|_| {
                        ThreatError::invalid_value(
                            context.as_str(),
                            "data_formats_accepted",
                            raw.as_str(),
                        )
                    })
                })
                .collect::<ThreatResult<Vec<_>>>()?;

            let asset = TechnicalAsset {
                id: id.clone(),
                title: title.clone(),
                description: input.description.clone(),
                usage: parse_or(input.usage.as_deref(), Usage::default(), &context, "usage")?,
                asset_type: parse_or(
                    input.asset_type.as_deref(),
                    TechnicalAssetType::default(),
                    &context,
                    "type",
                )?,
                size: parse_or(
                    input.size.as_deref(),
                    TechnicalAssetSize::default(),
                    &context,
                    "size",
                )?,
                technology: parse_or(
                    input.technology.as_deref(),
                    Technology::default(),
                    &context,
                    "technology",
                )?,
                machine: parse_or(
                    input.machine.as_deref(),
                    TechnicalAssetMachine::default(),
                    &context,
                    "machine",
                )?,
                encryption: parse_or(
                    input.encryption.as_deref(),
                    EncryptionStyle::default(),
                    &context,
                    "encryption",
                )?,
                tags: normalize_tags(&input.tags),
                owner: input.owner.clone(),
                confidentiality: parse_or(
                    input.confidentiality.as_deref(),
                    Confidentiality::default(),
                    &context,
                    "confidentiality",
                )?,
                integrity: parse_or(
                    input.integrity.as_deref(),
                    Criticality::default(),
                    &context,
                    "integrity",
                )?,
                availability: parse_or(
                    input.availability.as_deref(),
                    Criticality::default(),
                    &context,
                    "availability",
                )?,
                justification_cia_rating: input.justification_cia_rating.clone(),
                out_of_scope: input.out_of_scope,
                justification_out_of_scope: input.justification_out_of_scope.clone(),
                internet: input.internet,
                multi_tenant: input.multi_tenant,
                redundant: input.redundant,
                custom_developed_parts: input.custom_developed_parts,
                used_as_client_by_human: input.used_as_client_by_human,
                data_assets_processed,
                data_assets_stored,
                data_formats_accepted,
                communication_links: Vec::new(),
                diagram_tweak_order: input.diagram_tweak_order,
                raa: None,
            };
            self.asset_ids.insert(title.clone(), id.clone());
            self.model.technical_assets.insert(id, asset);
        }
        log::debug!("Parsed {} technical assets", self.model.technical_assets.len());
        Ok(())
    }

    fn build_communication_links(&mut self) -> ThreatResult<()> {
        for (asset_title, asset_input) in &self.input.technical_assets {
            let source_id = match self.asset_ids.get(asset_title) {
                Some(id) => id.clone(),
                None => continue,
            };
            for (title, input) in &asset_input.communication_links {
                let context = format!(
                    "communication link '{}' of technical asset '{}'",
                    title, asset_title
                );
                let link_part = make_id(title);
                if link_part.is_empty() {
                    return Err(ThreatError::InvalidId {
                        context,
                        id: title.clone(),
                    });
                }
                let id = format!("{}>{}", source_id, link_part);
                if self.model.link_index.contains_key(&id) {
                    return Err(ThreatError::DuplicateId { kind: "communication link", id });
                }
                let target_id = input.target.trim().to_string();
                if !self.model.technical_assets.contains_key(&target_id) {
                    return Err(ThreatError::missing("target technical asset", context, target_id));
                }
                let link = CommunicationLink {
                    id: id.clone(),
                    source_id: source_id.clone(),
                    target_id: target_id.clone(),
                    title: title.clone(),
                    description: input.description.clone(),
                    protocol: parse_or(
                        input.protocol.as_deref(),
                        Protocol::default(),
                        &context,
                        "protocol",
                    )?,
                    authentication: parse_or(
                        input.authentication.as_deref(),
                        Authentication::default(),
                        &context,
                        "authentication",
                    )?,
                    authorization: parse_or(
                        input.authorization.as_deref(),
                        Authorization::default(),
                        &context,
                        "authorization",
                    )?,
                    usage: parse_or(input.usage.as_deref(), Usage::default(), &context, "usage")?,
                    tags: normalize_tags(&input.tags),
                    vpn: input.vpn,
                    ip_filtered: input.ip_filtered,
                    readonly: input.readonly,
                    data_assets_sent: self.data_asset_refs(
                        &input.data_assets_sent,
                        &format!("{} (sent)", context),
                    )?,
                    data_assets_received: self.data_asset_refs(
                        &input.data_assets_received,
                        &format!("{} (received)", context),
                    )?,
                    diagram_tweak_weight: input.diagram_tweak_weight,
                    diagram_tweak_constraint: input.diagram_tweak_constraint,
                };

                let source = self
                    .model
                    .technical_assets
                    .get_mut(&source_id)
                    .ok_or_else(|| {
                        ThreatError::missing(
                            "source technical asset",
                            context.as_str(),
                            source_id.as_str(),
                        )
                    })?;
                source.communication_links.push(link);
                let position = source.communication_links.len() - 1;
                self.model.link_index.insert(id.clone(), (source_id.clone(), position));
                self.model.incoming_links.entry(target_id).or_default().push(id);
            }
        }
        log::debug!("Parsed {} communication links", self.model.link_index.len());
        Ok(())
    }

    fn build_trust_boundaries(&mut self) -> ThreatResult<()> {
        let mut boundaries: BTreeMap<String, TrustBoundary> = BTreeMap::new();
        let mut containing: HashMap<String, String> = HashMap::new();

        for (title, input) in &self.input.trust_boundaries {
            let context = format!("trust boundary '{}'", title);
            let id = ids::resolve_id(input.id.as_deref(), title, &context)?;
            if boundaries.contains_key(&id) {
                return Err(ThreatError::DuplicateId { kind: "trust boundary", id });
            }
            let mut inside = Vec::with_capacity(input.technical_assets_inside.len());
            for raw in &input.technical_assets_inside {
                let asset_id = raw.trim().to_string();
                if !self.model.technical_assets.contains_key(&asset_id) {
                    return Err(ThreatError::missing("technical asset", context.as_str(), asset_id));
                }
                match containing.get(&asset_id) {
                    Some(first) if first == &id => continue,
                    Some(first) => {
                        return Err(ThreatError::AssetInMultipleBoundaries {
                            asset: asset_id,
                            first: first.clone(),
                            second: id,
                        })
                    }
                    None => {
                        containing.insert(asset_id.clone(), id.clone());
                        inside.push(asset_id);
                    }
                }
            }
            let boundary = TrustBoundary {
                id: id.clone(),
                title: title.clone(),
                description: input.description.clone(),
                boundary_type: parse_or(
                    input.boundary_type.as_deref(),
                    TrustBoundaryType::default(),
                    &context,
                    "type",
                )?,
                tags: normalize_tags(&input.tags),
                technical_assets_inside: inside,
                trust_boundaries_nested: input
                    .trust_boundaries_nested
                    .iter()
                    .map(|n| n.trim().to_string())
                    .collect(),
            };
            boundaries.insert(id, boundary);
        }

        let parents = nesting::resolve_nesting(&boundaries)?;
        self.model.trust_boundaries = boundaries;
        self.model.boundary_of_asset = containing;
        self.model.parent_of_boundary = parents;
        log::debug!("Parsed {} trust boundaries", self.model.trust_boundaries.len());
        Ok(())
    }

    fn build_shared_runtimes(&mut self) -> ThreatResult<()> {
        for (title, input) in &self.input.shared_runtimes {
            let context = format!("shared runtime '{}'", title);
            let id = ids::resolve_id(input.id.as_deref(), title, &context)?;
            if self.model.shared_runtimes.contains_key(&id) {
                return Err(ThreatError::DuplicateId { kind: "shared runtime", id });
            }
            let mut running = Vec::with_capacity(input.technical_assets_running.len());
            for raw in &input.technical_assets_running {
                let asset_id = raw.trim().to_string();
                if !self.model.technical_assets.contains_key(&asset_id) {
                    return Err(ThreatError::missing("technical asset", context.as_str(), asset_id));
                }
                match self.model.runtime_of_asset.get(&asset_id) {
                    Some(first) if first != &id => log::warn!(
                        "Technical asset {} runs on multiple shared runtimes ('{}' and '{}'), \
                         keeping '{}'",
                        asset_id,
                        first,
                        id,
                        first
                    ),
                    Some(_) => {}
                    None => {
                        self.model.runtime_of_asset.insert(asset_id.clone(), id.clone());
                    }
                }
                if !running.contains(&asset_id) {
                    running.push(asset_id);
                }
            }
            let runtime = SharedRuntime {
                id: id.clone(),
                title: title.clone(),
                description: input.description.clone(),
                tags: normalize_tags(&input.tags),
                technical_assets_running: running,
            };
            self.model.shared_runtimes.insert(id, runtime);
        }
        log::debug!("Parsed {} shared runtimes", self.model.shared_runtimes.len());
        Ok(())
    }

    /// Optional `most_relevant_*` reference that must resolve when present.
    fn optional_ref(
        &self,
        value: Option<&str>,
        kind: &'static str,
        context: &str,
    ) -> ThreatResult<Option<String>> {
        let id = match value.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(id) => id,
        };
        let exists = match kind {
            "data asset" => self.model.data_assets.contains_key(id),
            "technical asset" => self.model.technical_assets.contains_key(id),
            "communication link" => self.model.link_index.contains_key(id),
            "trust boundary" => self.model.trust_boundaries.contains_key(id),
            _ => self.model.shared_runtimes.contains_key(id),
        };
        if exists {
            Ok(Some(id.to_string()))
        } else {
            Err(ThreatError::missing(kind, context, id))
        }
    }

    fn build_individual_risks(&mut self) -> ThreatResult<()> {
        for (title, input) in &self.input.individual_risk_categories {
            let context = format!("individual risk category '{}'", title);
            let id = ids::resolve_id(input.id.as_deref(), title, &context)?;
            if self.model.individual_risk_categories.contains_key(&id) {
                return Err(ThreatError::DuplicateId { kind: "individual risk category", id });
            }
            let category = RiskCategory {
                id: id.clone(),
                title: title.clone(),
                description: input.description.clone(),
                impact: input.impact.clone(),
                asvs: input.asvs.clone(),
                cheat_sheet: input.cheat_sheet.clone(),
                action: input.action.clone(),
                mitigation: input.mitigation.clone(),
                check: input.check.clone(),
                function: parse_required(input.function.as_deref(), &context, "function")?,
                stride: parse_required(input.stride.as_deref(), &context, "stride")?,
                detection_logic: input.detection_logic.clone(),
                risk_assessment: input.risk_assessment.clone(),
                false_positives: input.false_positives.clone(),
                model_failure_possible_reason: input.model_failure_possible_reason,
                cwe: input.cwe,
            };

            for (risk_title, risk_input) in &input.risks_identified {
                let risk = self.build_individual_risk(&category, risk_title, risk_input)?;
                self.model.individual_risks.push(risk);
            }
            self.model.individual_risk_categories.insert(id, category);
        }
        log::debug!(
            "Parsed {} individual risk categories with {} risks",
            self.model.individual_risk_categories.len(),
            self.model.individual_risks.len()
        );
        Ok(())
    }

    fn build_individual_risk(
        &self,
        category: &RiskCategory,
        title: &str,
        input: &RiskIdentifiedInput,
    ) -> ThreatResult<Risk> {
        let context = format!("individual risk '{}' of category '{}'", title, category.id);
        let likelihood = parse_or(
            input.exploitation_likelihood.as_deref(),
            RiskExploitationLikelihood::default(),
            &context,
            "exploitation_likelihood",
        )?;
        let impact = parse_or(
            input.exploitation_impact.as_deref(),
            RiskExploitationImpact::default(),
            &context,
            "exploitation_impact",
        )?;
        let probability = parse_or(
            input.data_breach_probability.as_deref(),
            DataBreachProbability::default(),
            &context,
            "data_breach_probability",
        )?;

        let data_asset = self.optional_ref(
            input.most_relevant_data_asset.as_deref(),
            "data asset",
            &context,
        )?;
        let technical_asset = self.optional_ref(
            input.most_relevant_technical_asset.as_deref(),
            "technical asset",
            &context,
        )?;
        let link = self.optional_ref(
            input.most_relevant_communication_link.as_deref(),
            "communication link",
            &context,
        )?;
        let boundary = self.optional_ref(
            input.most_relevant_trust_boundary.as_deref(),
            "trust boundary",
            &context,
        )?;
        let runtime = self.optional_ref(
            input.most_relevant_shared_runtime.as_deref(),
            "shared runtime",
            &context,
        )?;

        let mut breached = Vec::with_capacity(input.data_breach_technical_assets.len());
        for raw in &input.data_breach_technical_assets {
            let id = raw.trim();
            if !self.model.technical_assets.contains_key(id) {
                return Err(ThreatError::missing(
                    "data breach technical asset",
                    context.as_str(),
                    id,
                ));
            }
            breached.push(id.to_string());
        }

        let anchor = technical_asset
            .as_deref()
            .or(link.as_deref())
            .or(data_asset.as_deref())
            .or(boundary.as_deref())
            .or(runtime.as_deref())
            .unwrap_or("model");
        let synthetic = format!(
            "{}:{}",
            synthetic_id(&category.id, &[anchor]),
            risk_title_suffix(title)
        )
        .to_lowercase();

        let mut risk = Risk::new(category, likelihood, impact, title, synthetic)
            .with_data_breach(probability, breached);
        // a declared severity is taken as given, otherwise the matrix applies
        if let Some(severity) = input.severity.as_deref().filter(|s| !s.trim().is_empty()) {
            risk.severity = parse_or(
                Some(severity),
                RiskSeverity::default(),
                &context,
                "severity",
            )?;
        }
        risk.most_relevant_data_asset_id = data_asset;
        risk.most_relevant_technical_asset_id = technical_asset;
        risk.most_relevant_communication_link_id = link;
        risk.most_relevant_trust_boundary_id = boundary;
        risk.most_relevant_shared_runtime_id = runtime;
        Ok(risk)
    }

    fn load_risk_tracking(&mut self) -> ThreatResult<()> {
        for (raw_id, input) in &self.input.risk_tracking {
            let synthetic_risk_id = raw_id.trim().to_string();
            let context = format!("risk tracking '{}'", synthetic_risk_id);
            let tracking = RiskTracking {
                synthetic_risk_id: synthetic_risk_id.clone(),
                justification: input.justification.clone(),
                ticket: input.ticket.clone(),
                checked_by: input.checked_by.clone(),
                status: parse_or(
                    input.status.as_deref(),
                    RiskStatus::default(),
                    &context,
                    "status",
                )?,
                date: parse_date(input.date.as_deref(), &context),
            };
            self.model.risk_tracking.insert(synthetic_risk_id, tracking);
        }
        log::debug!("Loaded {} risk tracking entries", self.model.risk_tracking.len());
        Ok(())
    }
}
