//! Registry of grouper systems
//!
//! The systems list (`grouperspecs/systems.json` by default) is a JSON array
//! with one object per system:
//!
//! ```json
//! [{ "version": "V11_A", "specs": "specs", "public": true }]
//! ```
//!
//! `version` names the workspace directory below the specs root, `specs` is an
//! optional sub-directory holding the specification files and `kind` may be
//! `acute` or `rehabilitation`. Any other fields are kept and served back
//! verbatim by `GET /systems`.

use crate::config::GrouperConfig;
use crate::error::RegistryError;
use grouperserve_kernel::{
    Catalogue, CatalogueLoader, CsvCatalogueLoader, Tariff, catalogue_file_name,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Marker in a version name that identifies a rehabilitation system when no
/// explicit `kind` is configured.
const REHABILITATION_MARKER: &str = "REHA";

/// Tariff family of a system, decided once when the registry is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Acute,
    Rehabilitation,
}

impl SystemKind {
    /// Kind implied by a version name.
    pub fn from_version(version: &str) -> Self {
        if version.to_ascii_uppercase().contains(REHABILITATION_MARKER) {
            Self::Rehabilitation
        } else {
            Self::Acute
        }
    }

    pub fn tariff(self) -> Tariff {
        match self {
            Self::Acute => Tariff::Acute,
            Self::Rehabilitation => Tariff::Rehabilitation,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SystemEntry {
    version: Option<String>,
    #[serde(default)]
    specs: Option<String>,
    #[serde(default)]
    kind: Option<SystemKind>,
}

/// A registered grouper system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDescriptor {
    pub version: String,
    /// Sub-directory of the version directory holding the specification files
    pub specs: Option<String>,
    pub kind: SystemKind,
}

impl SystemDescriptor {
    /// Directory of the version below the specs root.
    pub fn version_dir(&self, specs_dir: &Path) -> PathBuf {
        specs_dir.join(&self.version)
    }

    /// Directory the specification loader reads from.
    pub fn workspace(&self, specs_dir: &Path) -> PathBuf {
        let dir = self.version_dir(specs_dir);
        match &self.specs {
            Some(specs) if !specs.is_empty() => dir.join(specs),
            _ => dir,
        }
    }

    pub fn catalogue_path(&self, specs_dir: &Path) -> PathBuf {
        self.version_dir(specs_dir)
            .join(catalogue_file_name(self.kind.tariff()))
    }
}

#[derive(Debug)]
struct RegisteredSystem {
    descriptor: SystemDescriptor,
    catalogue: Arc<Catalogue>,
}

/// Read-only view of the configured systems and their catalogues.
#[derive(Debug)]
pub struct SystemRegistry {
    specs_dir: PathBuf,
    systems: HashMap<String, RegisteredSystem>,
    /// Versions in configuration order
    versions: Vec<String>,
    systems_json: String,
}

impl SystemRegistry {
    /// Load the systems list and every catalogue it references.
    pub fn load(config: &GrouperConfig) -> Result<Self, RegistryError> {
        Self::load_with(config, &CsvCatalogueLoader::new())
    }

    pub fn load_with(
        config: &GrouperConfig,
        catalogue_loader: &dyn CatalogueLoader,
    ) -> Result<Self, RegistryError> {
        let path = config.systems_path();
        let content = std::fs::read_to_string(&path).map_err(|source| RegistryError::Read {
            path: path.clone(),
            source,
        })?;
        let raw: Vec<Value> =
            serde_json::from_str(&content).map_err(|source| RegistryError::Malformed {
                path: path.clone(),
                source,
            })?;
        let systems_json =
            serde_json::to_string_pretty(&raw).map_err(|source| RegistryError::Malformed {
                path: path.clone(),
                source,
            })?;

        let mut systems = HashMap::with_capacity(raw.len());
        let mut versions = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            let entry: SystemEntry =
                serde_json::from_value(value).map_err(|source| RegistryError::Malformed {
                    path: path.clone(),
                    source,
                })?;
            let version = match entry.version {
                Some(version) if !version.trim().is_empty() => version,
                _ => {
                    return Err(RegistryError::Invalid {
                        path: path.clone(),
                        message: format!("entry {index} has no version"),
                    });
                }
            };
            if systems.contains_key(&version) {
                return Err(RegistryError::Invalid {
                    path: path.clone(),
                    message: format!("duplicate version {version}"),
                });
            }

            let descriptor = SystemDescriptor {
                kind: entry
                    .kind
                    .unwrap_or_else(|| SystemKind::from_version(&version)),
                specs: entry.specs,
                version: version.clone(),
            };
            let catalogue = catalogue_loader
                .load(
                    &descriptor.catalogue_path(&config.specs_dir),
                    descriptor.kind.tariff(),
                )
                .map_err(|source| RegistryError::Catalogue {
                    version: version.clone(),
                    source,
                })?;
            tracing::info!(
                version = %version,
                kind = ?descriptor.kind,
                entries = catalogue.len(),
                "Registered grouper system"
            );

            versions.push(version.clone());
            systems.insert(
                version,
                RegisteredSystem {
                    descriptor,
                    catalogue: Arc::new(catalogue),
                },
            );
        }

        Ok(Self {
            specs_dir: config.specs_dir.clone(),
            systems,
            versions,
            systems_json,
        })
    }

    pub fn describe(&self, version: &str) -> Option<&SystemDescriptor> {
        self.systems.get(version).map(|s| &s.descriptor)
    }

    pub fn catalogue(&self, version: &str) -> Option<Arc<Catalogue>> {
        self.systems.get(version).map(|s| s.catalogue.clone())
    }

    /// The configured systems list, pretty-printed.
    pub fn systems_json(&self) -> &str {
        &self.systems_json
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn specs_dir(&self) -> &Path {
        &self.specs_dir
    }

    /// Workspace directory of a registered system.
    pub fn workspace(&self, descriptor: &SystemDescriptor) -> PathBuf {
        descriptor.workspace(&self.specs_dir)
    }
}
