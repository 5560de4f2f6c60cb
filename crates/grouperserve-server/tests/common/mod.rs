#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::Router;
use grouperserve_server::{AppConfig, AppState, router};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const ACUTE_VERSION: &str = "V1_A";
pub const REHA_VERSION: &str = "V1_REHA";

const ACUTE_RULES: &str = r#"{
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

// No E77A row: cases grouped there fail the cost-weight lookup.
const ACUTE_CATALOGUE: &str = "\
drg;description;cost_weight;average_los;first_day_discount;discount_per_day;first_day_surcharge;surcharge_per_day;transfer_discount_per_day;transfer_exempt
960Z;Ungroupable;0.0;;;;;;;
F24A;Percutaneous coronary intervention;1.204;3.2;;;9;0.087;;
F60A;Acute myocardial infarction, complex;1.512;8.1;2;0.301;17;0.112;0.141;false
F60B;Acute myocardial infarction;0.903;4.9;;;12;0.095;;
";

const SUPPLEMENTS: &str = r#"{
    "supplements": [
        {"code": "ZE01", "procedures": ["8-837.0"], "amount": 315.5, "perOccurrence": true}
    ]
}"#;

const REHA_RULES: &str = r#"{
    "name": "Rehabilitation fixture",
    "tariff": "rehabilitation",
    "errorDrg": "TR99Z",
    "mdcs": [{"code": "TR", "principalDiagnoses": ["S", "M", "T"]}],
    "drgs": [
        {"drg": "TR11A", "mdc": "TR", "minAgeYears": 65},
        {"drg": "TR11B", "mdc": "TR"}
    ]
}"#;

const REHA_CATALOGUE: &str = "\
rcg;description;cost_weight_per_day
TR11A;Musculoskeletal, elderly;0.125
TR11B;Musculoskeletal;0.1
TR99Z;Ungroupable;0.0
";

/// Groups to F60B, inlier.
pub const ACUTE_CASE: &str = "1;64;0;;M;20240102;01;20240110;00;8;0;I214|E119;";
/// Groups to F24A and bills one ZE01.
pub const ACUTE_PCI_CASE: &str = "2;58;0;;W;20240102;01;20240105;00;3;0;I214;8-837.00:L:20240102";
/// Groups to E77A, which has no catalogue entry.
pub const ACUTE_UNPRICED_CASE: &str = "3;40;0;;M;;01;;00;5;0;J189;";
/// Groups to TR11A for 21 days.
pub const REHA_CASE: &str = "4;70;0;;W;;01;;00;21;0;S7200;";

pub const SYSTEMS_JSON: &str = r#"[
    {"version": "V1_A", "specs": "specs", "label": "Acute test system", "public": true},
    {"version": "V1_REHA", "label": "Rehabilitation test system"}
]"#;

/// A temporary grouperspecs tree with one acute and one rehabilitation system.
pub struct Specs {
    pub dir: TempDir,
}

impl Specs {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tmp dir");
        let root = dir.path();

        let acute = root.join(ACUTE_VERSION);
        let acute_specs = acute.join("specs");
        fs::create_dir_all(&acute_specs).expect("create acute workspace");
        write(&acute.join("catalogue-acute.csv"), ACUTE_CATALOGUE);
        write(&acute_specs.join("specification.json"), ACUTE_RULES);
        write(&acute_specs.join("supplements.json"), SUPPLEMENTS);

        let reha = root.join(REHA_VERSION);
        fs::create_dir_all(&reha).expect("create rehabilitation workspace");
        write(&reha.join("catalogue.csv"), REHA_CATALOGUE);
        write(&reha.join("specification.json"), REHA_RULES);

        write(&root.join("systems.json"), SYSTEMS_JSON);
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.grouper.specs_dir = self.root().to_path_buf();
        cfg
    }

    pub fn state(&self) -> AppState {
        AppState::from_config(&self.config()).expect("load registry")
    }
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).expect("write fixture file");
}

pub struct TestServer {
    pub base: String,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

pub async fn start_server(app: Router) -> TestServer {
    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base: format!("http://{addr}"),
        shutdown: tx,
        handle,
    }
}

pub async fn start_default(specs: &Specs) -> TestServer {
    let cfg = specs.config();
    start_server(router(specs.state(), cfg.server.body_limit_bytes)).await
}
