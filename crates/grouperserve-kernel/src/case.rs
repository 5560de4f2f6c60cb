//! Patient case model shared by the parser, the groupers and the cost-weight calculation.

use serde::{Serialize, Serializer};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Compact `YYYYMMDD` date format used by case strings and JSON output.
pub(crate) const CASE_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]");

/// Admission/separation mode code for transfers from or to another hospital.
pub const TRANSFER_MODE: &str = "06";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "W")]
    Female,
    #[serde(rename = "U")]
    Unknown,
}

/// A coded procedure with optional laterality and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(serialize_with = "serialize_case_date")]
    pub date: Option<Date>,
}

/// Outcome of a grouping run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupingStatus {
    Normal,
    NoPrincipalDiagnosis,
    UnknownPrincipalDiagnosis,
    Ungroupable,
}

/// Classification result the grouper writes into a [`PatientCase`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrouperResult {
    /// Class code (DRG for acute systems, RCG for rehabilitation systems)
    pub drg: String,
    pub mdc: Option<String>,
    pub partition: Option<String>,
    pub pccl: u8,
    pub status: GroupingStatus,
}

/// A structured patient case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCase {
    pub id: String,
    pub age_years: u16,
    pub age_days: u16,
    /// Admission weight in grams (newborns)
    pub admission_weight: u32,
    pub sex: Sex,
    #[serde(serialize_with = "serialize_case_date")]
    pub admission_date: Option<Date>,
    pub admission_mode: String,
    #[serde(serialize_with = "serialize_case_date")]
    pub separation_date: Option<Date>,
    pub separation_mode: String,
    /// Length of stay in days
    pub los: u32,
    pub ventilation_hours: u32,
    /// Principal diagnosis first, then secondary diagnoses
    pub diagnoses: Vec<String>,
    pub procedures: Vec<Procedure>,
    pub grouper_result: Option<GrouperResult>,
}

impl PatientCase {
    pub fn principal_diagnosis(&self) -> Option<&str> {
        self.diagnoses.first().map(String::as_str)
    }

    pub fn secondary_diagnoses(&self) -> &[String] {
        self.diagnoses.get(1..).unwrap_or(&[])
    }

    /// True if the case was transferred in or out.
    pub fn is_transfer(&self) -> bool {
        self.admission_mode == TRANSFER_MODE || self.separation_mode == TRANSFER_MODE
    }
}

pub(crate) fn serialize_case_date<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => {
            let formatted = d
                .format(CASE_DATE_FORMAT)
                .map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&formatted)
        }
        None => serializer.serialize_none(),
    }
}
