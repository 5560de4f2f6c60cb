//! Grouping request pipeline

use crate::cache::{CacheStats, EngineCache, EngineEntry};
use crate::error::{ServiceError, ServiceResult};
use crate::registry::{SystemDescriptor, SystemKind, SystemRegistry};
use grouperserve_kernel::{
    CaseParser, EffectiveCostWeight, GrouperResult, PatientCase, SupplementCase,
    SupplementGroupResult,
};
use serde::Serialize;
use std::sync::Arc;

const MISSING_VERSION: &str =
    "You have to provide a 'version' parameter. Choose one from /systems.";
const MISSING_CASE: &str = "You have to provide a patient case in the 'pc' parameter!";
const MISSING_CASES: &str = "You have to provide a list of patient cases in the 'pcs' parameter!";

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Include the parsed, grouped case in the result
    pub annotate: bool,
    /// Run the supplement grouper
    pub supplements: bool,
}

/// Single-case request. Parameters are optional so that absence can be reported.
#[derive(Debug, Clone, Default)]
pub struct GroupRequest {
    pub version: Option<String>,
    pub case: Option<String>,
    pub options: GroupOptions,
}

/// Batch request; `cases` holds the raw JSON array of case strings.
#[derive(Debug, Clone, Default)]
pub struct GroupManyRequest {
    pub version: Option<String>,
    pub cases: Option<String>,
    pub options: GroupOptions,
}

/// Outcome of grouping one case.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub classification_result: GrouperResult,
    pub cost_weight: EffectiveCostWeight,
    pub raw_case: Option<PatientCase>,
    pub supplement_result: Option<SupplementGroupResult>,
}

pub struct GroupingService {
    registry: Arc<SystemRegistry>,
    cache: Arc<EngineCache>,
    parser: Arc<dyn CaseParser>,
}

impl GroupingService {
    pub fn new(
        registry: Arc<SystemRegistry>,
        cache: Arc<EngineCache>,
        parser: Arc<dyn CaseParser>,
    ) -> Self {
        Self {
            registry,
            cache,
            parser,
        }
    }

    /// The configured systems list, pretty-printed.
    pub fn systems_json(&self) -> &str {
        self.registry.systems_json()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Check that a version was given and is registered.
    pub fn validate_version(&self, version: Option<&str>) -> ServiceResult<&SystemDescriptor> {
        let version = version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ServiceError::MissingParameter(MISSING_VERSION.to_string()))?;
        self.registry
            .describe(version)
            .ok_or_else(|| ServiceError::UnknownSystem(version.to_string()))
    }

    pub async fn group(&self, request: &GroupRequest) -> ServiceResult<RequestResult> {
        let descriptor = self.validate_version(request.version.as_deref())?;
        let raw = request
            .case
            .as_deref()
            .filter(|pc| !pc.is_empty())
            .ok_or_else(|| ServiceError::MissingParameter(MISSING_CASE.to_string()))?;
        let case = self.parse(raw)?;

        let entry = self.cache.get(&descriptor.version).await?;
        tracing::debug!(version = %entry.version, case_id = %case.id, "Grouping case");
        classify(&entry, case, request.options)
    }

    /// Group a batch in input order. The first failing case aborts the batch.
    pub async fn group_many(&self, request: &GroupManyRequest) -> ServiceResult<Vec<RequestResult>> {
        let descriptor = self.validate_version(request.version.as_deref())?;
        let raw = request
            .cases
            .as_deref()
            .filter(|pcs| !pcs.is_empty())
            .ok_or_else(|| ServiceError::MissingParameter(MISSING_CASES.to_string()))?;
        let cases: Vec<String> = serde_json::from_str(raw).map_err(|e| {
            ServiceError::InvalidParameter(format!(
                "The 'pcs' parameter must be a JSON array of patient case strings: {e}"
            ))
        })?;

        let entry = self.cache.get(&descriptor.version).await?;
        tracing::debug!(version = %entry.version, cases = cases.len(), "Grouping batch");

        let mut results = Vec::with_capacity(cases.len());
        for raw in &cases {
            let case = self.parse(raw)?;
            results.push(classify(&entry, case, request.options)?);
        }
        Ok(results)
    }

    fn parse(&self, raw: &str) -> ServiceResult<PatientCase> {
        self.parser
            .parse(raw)
            .map_err(|e| ServiceError::MalformedCase(e.to_string()))
    }
}

fn classify(
    entry: &EngineEntry,
    mut case: PatientCase,
    options: GroupOptions,
) -> ServiceResult<RequestResult> {
    entry.grouper.group(&mut case);
    let classification_result = case.grouper_result.clone().ok_or_else(|| {
        ServiceError::Internal(format!("grouper of system {} produced no result", entry.version))
    })?;

    let cost_weight = cost_weight(entry, &case, &classification_result.drg)?;

    let supplement_result = if options.supplements {
        let supplement_grouper = entry
            .supplement_grouper
            .as_ref()
            .ok_or_else(|| ServiceError::SupplementUnavailable(entry.version.clone()))?;
        Some(supplement_grouper.group(&SupplementCase::from(&case)))
    } else {
        None
    };

    Ok(RequestResult {
        classification_result,
        cost_weight,
        raw_case: options.annotate.then_some(case),
        supplement_result,
    })
}

fn cost_weight(
    entry: &EngineEntry,
    case: &PatientCase,
    class_code: &str,
) -> ServiceResult<EffectiveCostWeight> {
    let effective = match entry.kind {
        SystemKind::Acute => entry
            .catalogue
            .acute(class_code)
            .map(|relation| relation.effective_cost_weight(case)),
        SystemKind::Rehabilitation => entry
            .catalogue
            .rehabilitation(class_code)
            .map(|relation| relation.effective_cost_weight(case)),
    };
    effective.ok_or_else(|| {
        tracing::error!(
            version = %entry.version,
            class_code = class_code,
            "Class code missing from catalogue"
        );
        ServiceError::CostWeightLookup {
            version: entry.version.clone(),
            class_code: class_code.to_string(),
        }
    })
}

#[cfg(test)]
mod tests;
