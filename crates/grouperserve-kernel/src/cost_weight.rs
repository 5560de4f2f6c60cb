//! Effective cost-weight calculation.

use crate::case::PatientCase;
use crate::catalogue::{RehabWeightingRelation, WeightingRelation};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostWeightAdjustment {
    None,
    LowTrim,
    HighTrim,
    Transfer,
    PerDay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveCostWeight {
    pub class_code: String,
    /// Catalogue cost-weight (per day for rehabilitation systems)
    pub cost_weight: f64,
    pub effective_cost_weight: f64,
    pub adjustment: CostWeightAdjustment,
    pub adjustment_days: u32,
}

impl WeightingRelation {
    /// Cost-weight of `case` after length-of-stay and transfer adjustments.
    ///
    /// Low-trim deductions take precedence over transfer deductions; high-trim
    /// surcharges only apply when neither deduction does.
    pub fn effective_cost_weight(&self, case: &PatientCase) -> EffectiveCostWeight {
        let los = case.los;
        let (adjustment, days, delta) = self
            .low_trim(los)
            .or_else(|| self.transfer(case))
            .or_else(|| self.high_trim(los))
            .unwrap_or((CostWeightAdjustment::None, 0, 0.0));

        EffectiveCostWeight {
            class_code: self.drg.clone(),
            cost_weight: self.cost_weight,
            effective_cost_weight: round3((self.cost_weight + delta).max(0.0)),
            adjustment,
            adjustment_days: days,
        }
    }

    fn low_trim(&self, los: u32) -> Option<(CostWeightAdjustment, u32, f64)> {
        let first = self.first_day_discount?;
        let per_day = self.discount_per_day?;
        if los > first {
            return None;
        }
        let days = (first - los).saturating_add(1);
        Some((CostWeightAdjustment::LowTrim, days, -(f64::from(days) * per_day)))
    }

    fn high_trim(&self, los: u32) -> Option<(CostWeightAdjustment, u32, f64)> {
        let first = self.first_day_surcharge?;
        let per_day = self.surcharge_per_day?;
        if los < first {
            return None;
        }
        let days = (los - first).saturating_add(1);
        Some((CostWeightAdjustment::HighTrim, days, f64::from(days) * per_day))
    }

    fn transfer(&self, case: &PatientCase) -> Option<(CostWeightAdjustment, u32, f64)> {
        if !case.is_transfer() || self.transfer_exempt.unwrap_or(false) {
            return None;
        }
        let per_day = self.transfer_discount_per_day?;
        let average = self.average_los?.round().max(0.0) as u32;
        let days = average.saturating_sub(case.los.saturating_add(1));
        if days == 0 {
            return None;
        }
        Some((CostWeightAdjustment::Transfer, days, -(f64::from(days) * per_day)))
    }
}

impl RehabWeightingRelation {
    /// Rehabilitation stays are paid per day.
    pub fn effective_cost_weight(&self, case: &PatientCase) -> EffectiveCostWeight {
        EffectiveCostWeight {
            class_code: self.rcg.clone(),
            cost_weight: self.cost_weight_per_day,
            effective_cost_weight: round3(self.cost_weight_per_day * f64::from(case.los)),
            adjustment: CostWeightAdjustment::PerDay,
            adjustment_days: case.los,
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
