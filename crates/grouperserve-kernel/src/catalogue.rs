//! Weighting catalogues.
//!
//! Catalogues are `;`-delimited CSV files with a header row. Acute catalogues
//! (`catalogue-acute.csv`) carry one [`WeightingRelation`] per DRG,
//! rehabilitation catalogues (`catalogue.csv`) one [`RehabWeightingRelation`]
//! per RCG.

use crate::error::{KernelError, KernelResult};
use crate::specification::Tariff;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

pub const ACUTE_CATALOGUE_FILE: &str = "catalogue-acute.csv";
pub const REHABILITATION_CATALOGUE_FILE: &str = "catalogue.csv";

/// Catalogue file name used by systems of the given tariff.
pub fn catalogue_file_name(tariff: Tariff) -> &'static str {
    match tariff {
        Tariff::Acute => ACUTE_CATALOGUE_FILE,
        Tariff::Rehabilitation => REHABILITATION_CATALOGUE_FILE,
    }
}

/// Acute weighting relation of one DRG.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeightingRelation {
    pub drg: String,
    #[serde(default)]
    pub description: String,
    pub cost_weight: f64,
    pub average_los: Option<f64>,
    /// First length-of-stay day (from below) that triggers a deduction
    pub first_day_discount: Option<u32>,
    pub discount_per_day: Option<f64>,
    /// First length-of-stay day that triggers a surcharge
    pub first_day_surcharge: Option<u32>,
    pub surcharge_per_day: Option<f64>,
    pub transfer_discount_per_day: Option<f64>,
    pub transfer_exempt: Option<bool>,
}

/// Rehabilitation weighting relation of one RCG.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RehabWeightingRelation {
    pub rcg: String,
    #[serde(default)]
    pub description: String,
    pub cost_weight_per_day: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Catalogue {
    Acute(HashMap<String, WeightingRelation>),
    Rehabilitation(HashMap<String, RehabWeightingRelation>),
}

impl Catalogue {
    pub fn tariff(&self) -> Tariff {
        match self {
            Self::Acute(_) => Tariff::Acute,
            Self::Rehabilitation(_) => Tariff::Rehabilitation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Acute(m) => m.len(),
            Self::Rehabilitation(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, code: &str) -> bool {
        match self {
            Self::Acute(m) => m.contains_key(code),
            Self::Rehabilitation(m) => m.contains_key(code),
        }
    }

    pub fn acute(&self, drg: &str) -> Option<&WeightingRelation> {
        match self {
            Self::Acute(m) => m.get(drg),
            Self::Rehabilitation(_) => None,
        }
    }

    pub fn rehabilitation(&self, rcg: &str) -> Option<&RehabWeightingRelation> {
        match self {
            Self::Rehabilitation(m) => m.get(rcg),
            Self::Acute(_) => None,
        }
    }
}

/// Reads catalogue files.
pub trait CatalogueLoader: Send + Sync {
    fn load(&self, path: &Path, tariff: Tariff) -> KernelResult<Catalogue>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCatalogueLoader;

impl CsvCatalogueLoader {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogueLoader for CsvCatalogueLoader {
    fn load(&self, path: &Path, tariff: Tariff) -> KernelResult<Catalogue> {
        let catalogue = match tariff {
            Tariff::Acute => {
                Catalogue::Acute(read_rows(path, |r: &WeightingRelation| r.drg.clone())?)
            }
            Tariff::Rehabilitation => {
                Catalogue::Rehabilitation(read_rows(path, |r: &RehabWeightingRelation| {
                    r.rcg.clone()
                })?)
            }
        };
        tracing::debug!(
            path = %path.display(),
            tariff = %tariff,
            entries = catalogue.len(),
            "Loaded catalogue"
        );
        Ok(catalogue)
    }
}

fn read_rows<T, F>(path: &Path, key: F) -> KernelResult<HashMap<String, T>>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> String,
{
    let file = File::open(path).map_err(|e| KernelError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = HashMap::new();
    for record in reader.deserialize::<T>() {
        let row = record.map_err(|e| KernelError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        let code = key(&row);
        if code.is_empty() {
            return Err(KernelError::catalogue(path, "row with empty class code"));
        }
        if rows.insert(code.clone(), row).is_some() {
            return Err(KernelError::catalogue(
                path,
                format!("duplicate class code {code}"),
            ));
        }
    }
    Ok(rows)
}
