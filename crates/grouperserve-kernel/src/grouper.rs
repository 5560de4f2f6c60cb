//! Rule-based classification.

use crate::case::{GrouperResult, GroupingStatus, PatientCase};
use crate::specification::{DrgRule, GrouperRules};

/// MDC label for cases classified by a pre-MDC rule.
pub const PRE_MDC: &str = "PRE";

/// Damping factor of the PCCL formula.
const PCCL_ALPHA: f64 = 0.4;
const MAX_PCCL: u8 = 4;

/// Classification engine: writes a [`GrouperResult`] into the case.
pub trait Grouper: Send + Sync {
    fn group(&self, case: &mut PatientCase);
}

/// Grouper driven by [`GrouperRules`] from a specification workspace.
#[derive(Debug, Clone)]
pub struct RuleGrouper {
    rules: GrouperRules,
}

impl RuleGrouper {
    pub fn new(rules: GrouperRules) -> Self {
        Self { rules }
    }

    /// Patient clinical complexity level from the secondary diagnoses.
    pub fn pccl(&self, case: &PatientCase) -> u8 {
        let principal = case.principal_diagnosis().unwrap_or_default();
        let mut levels: Vec<u8> = case
            .secondary_diagnoses()
            .iter()
            .filter(|code| code.as_str() != principal)
            .filter_map(|code| self.ccl(code))
            .filter(|&level| level > 0)
            .collect();
        if levels.is_empty() {
            return 0;
        }
        levels.sort_unstable_by(|a, b| b.cmp(a));

        let sum: f64 = levels
            .iter()
            .enumerate()
            .map(|(i, &level)| f64::from(level) * (-PCCL_ALPHA * i as f64).exp())
            .sum();
        let pccl = ((1.0 + sum).ln() / ((3.0 / PCCL_ALPHA).ln() / 4.0)).round();
        pccl.clamp(0.0, f64::from(MAX_PCCL)) as u8
    }

    /// Complication level of a diagnosis, longest matching code prefix wins.
    fn ccl(&self, code: &str) -> Option<u8> {
        (1..=code.len())
            .rev()
            .filter_map(|len| code.get(..len))
            .find_map(|prefix| self.rules.ccl.get(prefix).copied())
    }

    fn mdc(&self, principal: &str) -> Option<&str> {
        self.rules
            .mdcs
            .iter()
            .find(|mdc| matches_any(&mdc.principal_diagnoses, principal))
            .map(|mdc| mdc.code.as_str())
    }

    fn error_result(&self, mdc: Option<String>, pccl: u8, status: GroupingStatus) -> GrouperResult {
        GrouperResult {
            drg: self.rules.error_drg.clone(),
            mdc,
            partition: None,
            pccl,
            status,
        }
    }

    fn classify(&self, case: &PatientCase) -> GrouperResult {
        let Some(principal) = case.principal_diagnosis() else {
            return self.error_result(None, 0, GroupingStatus::NoPrincipalDiagnosis);
        };
        let pccl = self.pccl(case);

        let pre_mdc = self
            .rules
            .drgs
            .iter()
            .filter(|rule| rule.mdc.is_none())
            .find(|rule| rule_matches(rule, case, pccl));
        if let Some(rule) = pre_mdc {
            return result_for(rule, PRE_MDC.to_string(), pccl);
        }

        let Some(mdc) = self.mdc(principal) else {
            return self.error_result(None, pccl, GroupingStatus::UnknownPrincipalDiagnosis);
        };

        self.rules
            .drgs
            .iter()
            .filter(|rule| rule.mdc.as_deref() == Some(mdc))
            .find(|rule| rule_matches(rule, case, pccl))
            .map(|rule| result_for(rule, mdc.to_string(), pccl))
            .unwrap_or_else(|| {
                self.error_result(Some(mdc.to_string()), pccl, GroupingStatus::Ungroupable)
            })
    }
}

impl Grouper for RuleGrouper {
    fn group(&self, case: &mut PatientCase) {
        let result = self.classify(case);
        tracing::trace!(case_id = %case.id, drg = %result.drg, status = ?result.status, "Grouped case");
        case.grouper_result = Some(result);
    }
}

fn result_for(rule: &DrgRule, mdc: String, pccl: u8) -> GrouperResult {
    GrouperResult {
        drg: rule.drg.clone(),
        mdc: Some(mdc),
        partition: rule.partition.clone(),
        pccl,
        status: GroupingStatus::Normal,
    }
}

fn matches_any(prefixes: &[String], code: &str) -> bool {
    prefixes.iter().any(|prefix| code.starts_with(prefix.as_str()))
}

fn rule_matches(rule: &DrgRule, case: &PatientCase, pccl: u8) -> bool {
    let principal = case.principal_diagnosis().unwrap_or_default();
    if !rule.principal_diagnoses.is_empty() && !matches_any(&rule.principal_diagnoses, principal) {
        return false;
    }
    if !rule.procedures.is_empty()
        && !case
            .procedures
            .iter()
            .any(|p| matches_any(&rule.procedures, &p.code))
    {
        return false;
    }
    if rule.min_age_years.is_some_and(|min| case.age_years < min) {
        return false;
    }
    if rule.max_age_years.is_some_and(|max| case.age_years > max) {
        return false;
    }
    if rule.min_pccl.is_some_and(|min| pccl < min) {
        return false;
    }
    if rule
        .min_ventilation_hours
        .is_some_and(|min| case.ventilation_hours < min)
    {
        return false;
    }
    true
}
