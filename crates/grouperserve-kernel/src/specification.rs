//! Specification workspaces.
//!
//! A workspace directory holds `specification.json` with the grouping rules
//! and, for systems that bill supplements, `supplements.json`.

use crate::error::{KernelError, KernelResult};
use crate::grouper::{Grouper, RuleGrouper};
use crate::supplement::{RuleSupplementGrouper, SupplementGrouper};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const SPECIFICATION_FILE: &str = "specification.json";
pub const SUPPLEMENTS_FILE: &str = "supplements.json";

/// Tariff structure a specification is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tariff {
    Acute,
    Rehabilitation,
}

impl std::fmt::Display for Tariff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Acute => write!(f, "acute"),
            Self::Rehabilitation => write!(f, "rehabilitation"),
        }
    }
}

/// Engines built from one specification workspace.
#[derive(Clone)]
pub struct Specification {
    pub grouper: Arc<dyn Grouper>,
    pub supplement_grouper: Option<Arc<dyn SupplementGrouper>>,
}

impl std::fmt::Debug for Specification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Specification")
            .field("supplement_grouper", &self.supplement_grouper.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds engines from a workspace directory.
pub trait SpecificationLoader: Send + Sync {
    fn load(&self, workspace: &Path, tariff: Tariff) -> KernelResult<Specification>;
}

/// Grouping rules as stored in `specification.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrouperRules {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tariff: Option<Tariff>,
    /// Class code assigned when a case cannot be grouped
    pub error_drg: String,
    #[serde(default)]
    pub mdcs: Vec<MdcRule>,
    /// Complication level per secondary diagnosis (code or code prefix)
    #[serde(default)]
    pub ccl: HashMap<String, u8>,
    /// Ordered class rules; rules without `mdc` are pre-MDC rules
    pub drgs: Vec<DrgRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdcRule {
    pub code: String,
    pub principal_diagnoses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrgRule {
    pub drg: String,
    #[serde(default)]
    pub mdc: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub principal_diagnoses: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default)]
    pub min_age_years: Option<u16>,
    #[serde(default)]
    pub max_age_years: Option<u16>,
    #[serde(default)]
    pub min_pccl: Option<u8>,
    #[serde(default)]
    pub min_ventilation_hours: Option<u32>,
}

/// Supplement rules as stored in `supplements.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplementRules {
    pub supplements: Vec<SupplementRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementRule {
    pub code: String,
    /// Procedure code prefixes that trigger the supplement
    pub procedures: Vec<String>,
    pub amount: f64,
    /// Bill once per matching procedure instead of once per case
    #[serde(default)]
    pub per_occurrence: bool,
}

/// Loads `specification.json` / `supplements.json` from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSpecificationLoader;

impl JsonSpecificationLoader {
    pub fn new() -> Self {
        Self
    }
}

impl SpecificationLoader for JsonSpecificationLoader {
    fn load(&self, workspace: &Path, tariff: Tariff) -> KernelResult<Specification> {
        if !workspace.is_dir() {
            return Err(KernelError::FileNotFound(workspace.to_path_buf()));
        }

        let spec_path = workspace.join(SPECIFICATION_FILE);
        let rules: GrouperRules = read_json(&spec_path)?;
        if let Some(declared) = rules.tariff {
            if declared != tariff {
                return Err(KernelError::specification(
                    &spec_path,
                    format!("specification is for {declared} systems, requested {tariff}"),
                ));
            }
        }
        if rules.drgs.is_empty() {
            return Err(KernelError::specification(&spec_path, "no class rules defined"));
        }
        tracing::debug!(
            path = %spec_path.display(),
            name = rules.name.as_deref().unwrap_or(""),
            rules = rules.drgs.len(),
            "Loaded grouper rules"
        );

        let supplements_path = workspace.join(SUPPLEMENTS_FILE);
        let supplement_grouper: Option<Arc<dyn SupplementGrouper>> = if supplements_path.is_file()
        {
            let rules: SupplementRules = read_json(&supplements_path)?;
            Some(Arc::new(RuleSupplementGrouper::new(rules)))
        } else {
            None
        };

        Ok(Specification {
            grouper: Arc::new(RuleGrouper::new(rules)),
            supplement_grouper,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> KernelResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| KernelError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| KernelError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
