//! Specs directory fixtures shared by the unit tests.

use crate::config::GrouperConfig;
use crate::registry::SystemRegistry;
use grouperserve_kernel::{
    JsonSpecificationLoader, KernelResult, Specification, SpecificationLoader, Tariff,
};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ACUTE_VERSION: &str = "V1_A";
pub const REHA_VERSION: &str = "V1_REHA";

pub const ACUTE_RULES: &str = r#"{
    "name": "Acute fixture",
    "tariff": "acute",
    "errorDrg": "960Z",
    "mdcs": [
        {"code": "04", "principalDiagnoses": ["J"]},
        {"code": "05", "principalDiagnoses": ["I"]}
    ],
    "ccl": {"E11": 2, "N18": 4},
    "drgs": [
        {"drg": "F24A", "mdc": "05", "partition": "O", "procedures": ["8-837"]},
        {"drg": "F60A", "mdc": "05", "partition": "M", "minPccl": 3},
        {"drg": "F60B", "mdc": "05", "partition": "M"},
        {"drg": "E77A", "mdc": "04", "partition": "M"}
    ]
}"#;

/// E77A is left out on purpose so lookups for it fail.
pub const ACUTE_CATALOGUE: &str = "\
drg;description;cost_weight;average_los;first_day_discount;discount_per_day;first_day_surcharge;surcharge_per_day;transfer_discount_per_day;transfer_exempt
960Z;Ungroupable;0.0;;;;;;;
F24A;Percutaneous coronary intervention;1.204;3.2;;;9;0.087;;
F60A;Acute myocardial infarction, complex;1.512;8.1;2;0.301;17;0.112;0.141;false
F60B;Acute myocardial infarction;0.903;4.9;;;12;0.095;;
";

pub const SUPPLEMENTS: &str = r#"{
    "supplements": [
        {"code": "ZE01", "procedures": ["8-837.0"], "amount": 315.5, "perOccurrence": true}
    ]
}"#;

pub const REHA_RULES: &str = r#"{
    "name": "Rehabilitation fixture",
    "tariff": "rehabilitation",
    "errorDrg": "TR99Z",
    "mdcs": [{"code": "TR", "principalDiagnoses": ["S", "M", "T"]}],
    "drgs": [
        {"drg": "TR11A", "mdc": "TR", "minAgeYears": 65},
        {"drg": "TR11B", "mdc": "TR"}
    ]
}"#;

pub const REHA_CATALOGUE: &str = "\
rcg;description;cost_weight_per_day
TR11A;Musculoskeletal, elderly;0.125
TR11B;Musculoskeletal;0.1
TR99Z;Ungroupable;0.0
";

/// Acute case grouped to F60B, inlier.
pub const ACUTE_CASE: &str = "1;64;0;;M;20240102;01;20240110;00;8;0;I214|E119;";
/// Acute case with a coronary intervention: F24A plus one ZE01 supplement.
pub const ACUTE_PCI_CASE: &str = "2;58;0;;W;20240102;01;20240105;00;3;0;I214;8-837.00:L:20240102";
/// Acute case grouped to E77A, which has no catalogue entry.
pub const ACUTE_UNPRICED_CASE: &str = "3;40;0;;M;;01;;00;5;0;J189;";
/// Rehabilitation case grouped to TR11A, 21 days.
pub const REHA_CASE: &str = "4;70;0;;W;;01;;00;21;0;S7200;";

pub struct Fixture {
    dir: TempDir,
    pub config: GrouperConfig,
}

impl Fixture {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = GrouperConfig {
            specs_dir: dir.path().to_path_buf(),
            ..GrouperConfig::default()
        };
        Self { dir, config }
    }

    /// One acute system with supplements below `specs/` and one
    /// rehabilitation system.
    pub fn standard() -> Self {
        let fixture = Self::empty();
        fixture.write_acute_system(ACUTE_VERSION, Some("specs"), true);
        fixture.write_rehabilitation_system(REHA_VERSION);
        fixture.write_systems(&format!(
            r#"[
                {{"version": "{ACUTE_VERSION}", "specs": "specs", "label": "Acute test system", "public": true}},
                {{"version": "{REHA_VERSION}", "label": "Rehabilitation test system"}}
            ]"#
        ));
        fixture
    }

    /// `count` acute systems named `S1`, `S2`, ...
    pub fn acute_systems(count: usize) -> (Self, Vec<String>) {
        let fixture = Self::empty();
        let versions: Vec<String> = (1..=count).map(|i| format!("S{i}")).collect();
        for version in &versions {
            fixture.write_acute_system(version, None, false);
        }
        let entries: Vec<String> = versions
            .iter()
            .map(|v| format!(r#"{{"version": "{v}"}}"#))
            .collect();
        fixture.write_systems(&format!("[{}]", entries.join(",")));
        (fixture, versions)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_systems(&self, json: &str) {
        fs::write(self.config.systems_path(), json).unwrap();
    }

    pub fn write_acute_system(&self, version: &str, specs: Option<&str>, supplements: bool) {
        let version_dir = self.root().join(version);
        let workspace = match specs {
            Some(specs) => version_dir.join(specs),
            None => version_dir.clone(),
        };
        fs::create_dir_all(&workspace).unwrap();
        fs::write(version_dir.join("catalogue-acute.csv"), ACUTE_CATALOGUE).unwrap();
        fs::write(workspace.join("specification.json"), ACUTE_RULES).unwrap();
        if supplements {
            fs::write(workspace.join("supplements.json"), SUPPLEMENTS).unwrap();
        }
    }

    pub fn write_rehabilitation_system(&self, version: &str) {
        let version_dir = self.root().join(version);
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(version_dir.join("catalogue.csv"), REHA_CATALOGUE).unwrap();
        fs::write(version_dir.join("specification.json"), REHA_RULES).unwrap();
    }

    pub fn registry(&self) -> Arc<SystemRegistry> {
        Arc::new(SystemRegistry::load(&self.config).unwrap())
    }
}

/// Specification loader that records every load and can simulate slow builds.
#[derive(Default)]
pub struct CountingLoader {
    inner: JsonSpecificationLoader,
    loads: Mutex<Vec<PathBuf>>,
    delay: Option<Duration>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.loads.lock().len()
    }

    /// Number of loads whose workspace lies below `version`'s directory.
    pub fn loads_of(&self, version: &str) -> usize {
        self.loads
            .lock()
            .iter()
            .filter(|path| path.components().any(|c| c.as_os_str() == version))
            .count()
    }
}

impl SpecificationLoader for CountingLoader {
    fn load(&self, workspace: &Path, tariff: Tariff) -> KernelResult<Specification> {
        self.loads.lock().push(workspace.to_path_buf());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.inner.load(workspace, tariff)
    }
}
