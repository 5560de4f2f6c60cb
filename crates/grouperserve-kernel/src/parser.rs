//! Patient case parsing.
//!
//! The URL input format is a single line of 13 semicolon-separated fields:
//!
//! ```text
//! id;age_years;age_days;admission_weight;sex;admission_date;admission_mode;
//! separation_date;separation_mode;los;ventilation_hours;diagnoses;procedures
//! ```
//!
//! Diagnoses are `|`-separated with the principal diagnosis first. Procedures
//! are `|`-separated `code:side:date` triples where side and date may be
//! omitted. Dates use `YYYYMMDD`; empty numeric fields read as 0.

use crate::case::{CASE_DATE_FORMAT, PatientCase, Procedure, Sex};
use crate::error::{KernelError, KernelResult};
use std::str::FromStr;
use time::Date;

const FIELD_COUNT: usize = 13;

/// Turns a serialized case into a [`PatientCase`].
pub trait CaseParser: Send + Sync {
    fn parse(&self, input: &str) -> KernelResult<PatientCase>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlCaseParser;

impl UrlCaseParser {
    pub fn new() -> Self {
        Self
    }
}

impl CaseParser for UrlCaseParser {
    fn parse(&self, input: &str) -> KernelResult<PatientCase> {
        let fields: Vec<&str> = input.trim().split(';').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            return Err(KernelError::parse(format!(
                "Invalid patient case '{}': expected {} fields separated by ';', found {}",
                input,
                FIELD_COUNT,
                fields.len()
            )));
        }

        let diagnoses: Vec<String> = split_list(fields[11]).map(str::to_string).collect();
        let procedures = split_list(fields[12])
            .map(parse_procedure)
            .collect::<KernelResult<Vec<_>>>()?;

        Ok(PatientCase {
            id: fields[0].to_string(),
            age_years: parse_number(fields[1], "age_years")?,
            age_days: parse_number(fields[2], "age_days")?,
            admission_weight: parse_number(fields[3], "admission_weight")?,
            sex: parse_sex(fields[4])?,
            admission_date: parse_date(fields[5], "admission_date")?,
            admission_mode: fields[6].to_string(),
            separation_date: parse_date(fields[7], "separation_date")?,
            separation_mode: fields[8].to_string(),
            los: parse_number(fields[9], "los")?,
            ventilation_hours: parse_number(fields[10], "ventilation_hours")?,
            diagnoses,
            procedures,
            grouper_result: None,
        })
    }
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field.split('|').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number<T: FromStr + Default>(value: &str, field: &str) -> KernelResult<T> {
    if value.is_empty() {
        return Ok(T::default());
    }
    value
        .parse()
        .map_err(|_| KernelError::parse(format!("Invalid value '{value}' for field {field}")))
}

fn parse_sex(value: &str) -> KernelResult<Sex> {
    match value.to_ascii_uppercase().as_str() {
        "M" => Ok(Sex::Male),
        "W" | "F" => Ok(Sex::Female),
        "U" | "" => Ok(Sex::Unknown),
        _ => Err(KernelError::parse(format!(
            "Invalid value '{value}' for field sex"
        ))),
    }
}

fn parse_date(value: &str, field: &str) -> KernelResult<Option<Date>> {
    if value.is_empty() {
        return Ok(None);
    }
    Date::parse(value, CASE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| KernelError::parse(format!("Invalid date '{value}' for field {field}")))
}

fn parse_procedure(value: &str) -> KernelResult<Procedure> {
    let mut parts = value.split(':').map(str::trim);
    let code = parts.next().unwrap_or_default();
    if code.is_empty() {
        return Err(KernelError::parse(format!(
            "Invalid procedure '{value}': missing code"
        )));
    }
    let side = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let date = parse_date(parts.next().unwrap_or_default(), "procedure date")?;
    if parts.next().is_some() {
        return Err(KernelError::parse(format!(
            "Invalid procedure '{value}': expected code:side:date"
        )));
    }

    Ok(Procedure {
        code: code.to_string(),
        side,
        date,
    })
}
