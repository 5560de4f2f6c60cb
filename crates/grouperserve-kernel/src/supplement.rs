//! Supplement ("Zusatzentgelt") classification.

use crate::case::{PatientCase, Procedure, serialize_case_date};
use crate::specification::SupplementRules;
use serde::Serialize;
use time::Date;

/// Secondary billing engine.
pub trait SupplementGrouper: Send + Sync {
    fn group(&self, case: &SupplementCase<'_>) -> SupplementGroupResult;
}

/// View of a grouped [`PatientCase`] restricted to what supplement rules need.
#[derive(Debug, Clone, Copy)]
pub struct SupplementCase<'a> {
    case: &'a PatientCase,
}

impl<'a> SupplementCase<'a> {
    pub fn new(case: &'a PatientCase) -> Self {
        Self { case }
    }

    pub fn id(&self) -> &str {
        &self.case.id
    }

    pub fn procedures(&self) -> &'a [Procedure] {
        &self.case.procedures
    }

    /// Class code assigned by the primary grouper, if the case was grouped.
    pub fn drg(&self) -> Option<&'a str> {
        self.case.grouper_result.as_ref().map(|r| r.drg.as_str())
    }
}

impl<'a> From<&'a PatientCase> for SupplementCase<'a> {
    fn from(case: &'a PatientCase) -> Self {
        Self::new(case)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementEntry {
    pub code: String,
    pub procedure: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_case_date"
    )]
    pub date: Option<Date>,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementGroupResult {
    pub entries: Vec<SupplementEntry>,
    pub total_amount: f64,
}

#[derive(Debug, Clone)]
pub struct RuleSupplementGrouper {
    rules: SupplementRules,
}

impl RuleSupplementGrouper {
    pub fn new(rules: SupplementRules) -> Self {
        Self { rules }
    }
}

impl SupplementGrouper for RuleSupplementGrouper {
    fn group(&self, case: &SupplementCase<'_>) -> SupplementGroupResult {
        let mut entries = Vec::new();
        for rule in &self.rules.supplements {
            let matching = case.procedures().iter().filter(|p| {
                rule.procedures
                    .iter()
                    .any(|prefix| p.code.starts_with(prefix.as_str()))
            });
            for procedure in matching {
                entries.push(SupplementEntry {
                    code: rule.code.clone(),
                    procedure: procedure.code.clone(),
                    date: procedure.date,
                    amount: rule.amount,
                });
                if !rule.per_occurrence {
                    break;
                }
            }
        }

        let total_amount = entries.iter().map(|e| e.amount).sum();
        tracing::trace!(case_id = case.id(), entries = entries.len(), "Supplement grouping done");
        SupplementGroupResult {
            entries,
            total_amount,
        }
    }
}
