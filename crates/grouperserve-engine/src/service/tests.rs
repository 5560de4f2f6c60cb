//! Unit tests for the grouping pipeline
//!
//! These run against a temporary specs directory. End-to-end HTTP tests live
//! in the server crate.

use super::*;
use crate::testing::{
    ACUTE_CASE, ACUTE_PCI_CASE, ACUTE_UNPRICED_CASE, ACUTE_VERSION, CountingLoader, Fixture,
    REHA_CASE, REHA_VERSION,
};
use grouperserve_kernel::{CostWeightAdjustment, GroupingStatus, UrlCaseParser};

struct TestService {
    service: GroupingService,
    loader: Arc<CountingLoader>,
    _fixture: Fixture,
}

fn create_test_service() -> TestService {
    let fixture = Fixture::standard();
    let registry = fixture.registry();
    let loader = Arc::new(CountingLoader::new());
    let cache = Arc::new(EngineCache::new(registry.clone(), loader.clone(), 8));
    TestService {
        service: GroupingService::new(registry, cache, Arc::new(UrlCaseParser::new())),
        loader,
        _fixture: fixture,
    }
}

fn single(version: &str, case: &str, options: GroupOptions) -> GroupRequest {
    GroupRequest {
        version: Some(version.to_string()),
        case: Some(case.to_string()),
        options,
    }
}

fn batch(version: &str, cases: &str, options: GroupOptions) -> GroupManyRequest {
    GroupManyRequest {
        version: Some(version.to_string()),
        cases: Some(cases.to_string()),
        options,
    }
}

#[tokio::test]
async fn test_group_acute_case() {
    let t = create_test_service();
    let result = t
        .service
        .group(&single(ACUTE_VERSION, ACUTE_CASE, GroupOptions::default()))
        .await
        .unwrap();

    assert_eq!(result.classification_result.drg, "F60B");
    assert_eq!(result.classification_result.pccl, 2);
    assert_eq!(result.classification_result.status, GroupingStatus::Normal);
    assert_eq!(result.cost_weight.class_code, "F60B");
    assert_eq!(result.cost_weight.effective_cost_weight, 0.903);
    assert_eq!(result.cost_weight.adjustment, CostWeightAdjustment::None);
    assert!(result.raw_case.is_none());
    assert!(result.supplement_result.is_none());
}

#[tokio::test]
async fn test_group_rehabilitation_case_uses_rehabilitation_catalogue() {
    let t = create_test_service();
    let result = t
        .service
        .group(&single(REHA_VERSION, REHA_CASE, GroupOptions::default()))
        .await
        .unwrap();

    assert_eq!(result.classification_result.drg, "TR11A");
    assert_eq!(result.cost_weight.adjustment, CostWeightAdjustment::PerDay);
    assert_eq!(result.cost_weight.effective_cost_weight, 2.625);
}

#[tokio::test]
async fn test_annotate_and_supplements() {
    let t = create_test_service();
    let options = GroupOptions {
        annotate: true,
        supplements: true,
    };
    let result = t
        .service
        .group(&single(ACUTE_VERSION, ACUTE_PCI_CASE, options))
        .await
        .unwrap();

    assert_eq!(result.classification_result.drg, "F24A");
    let raw = result.raw_case.unwrap();
    assert_eq!(raw.id, "2");
    assert_eq!(raw.grouper_result.unwrap().drg, "F24A");

    let supplements = result.supplement_result.unwrap();
    assert_eq!(supplements.entries.len(), 1);
    assert_eq!(supplements.entries[0].code, "ZE01");
    assert_eq!(supplements.total_amount, 315.5);
}

#[tokio::test]
async fn test_missing_and_unknown_version() {
    let t = create_test_service();

    let err = t
        .service
        .group(&GroupRequest {
            case: Some(ACUTE_CASE.to_string()),
            ..GroupRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MissingParameter(_)));
    assert_eq!(
        err.to_string(),
        "You have to provide a 'version' parameter. Choose one from /systems."
    );

    let err = t
        .service
        .group(&single("V0", ACUTE_CASE, GroupOptions::default()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "The provided version V0 does not exist.");
    assert!(err.is_client_error());
    assert_eq!(t.loader.total(), 0);
}

#[tokio::test]
async fn test_missing_case() {
    let t = create_test_service();
    let err = t
        .service
        .group(&GroupRequest {
            version: Some(ACUTE_VERSION.to_string()),
            ..GroupRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You have to provide a patient case in the 'pc' parameter!"
    );
    assert_eq!(t.loader.total(), 0);
}

#[tokio::test]
async fn test_malformed_case_is_client_error() {
    let t = create_test_service();
    let err = t
        .service
        .group(&single(ACUTE_VERSION, "not-a-case", GroupOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedCase(_)));
    assert!(err.to_string().contains("expected 13 fields"));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_supplements_unavailable() {
    let t = create_test_service();
    let options = GroupOptions {
        supplements: true,
        ..GroupOptions::default()
    };
    let err = t
        .service
        .group(&single(REHA_VERSION, REHA_CASE, options))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("There is no supplement grouper for system {REHA_VERSION}")
    );
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_cost_weight_lookup_failure_is_server_error() {
    let t = create_test_service();
    let err = t
        .service
        .group(&single(ACUTE_VERSION, ACUTE_UNPRICED_CASE, GroupOptions::default()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ServiceError::CostWeightLookup { ref class_code, .. } if class_code == "E77A")
    );
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_group_many_preserves_order_and_matches_single() {
    let t = create_test_service();
    let pcs = serde_json::to_string(&[ACUTE_PCI_CASE, ACUTE_CASE]).unwrap();
    let results = t
        .service
        .group_many(&batch(ACUTE_VERSION, &pcs, GroupOptions::default()))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].classification_result.drg, "F24A");
    assert_eq!(results[1].classification_result.drg, "F60B");

    let alone = t
        .service
        .group(&single(ACUTE_VERSION, ACUTE_CASE, GroupOptions::default()))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&results[1]).unwrap(),
        serde_json::to_value(&alone).unwrap()
    );
    assert_eq!(t.loader.loads_of(ACUTE_VERSION), 1);
}

#[tokio::test]
async fn test_group_many_empty_list() {
    let t = create_test_service();
    let results = t
        .service
        .group_many(&batch(ACUTE_VERSION, "[]", GroupOptions::default()))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_group_many_fails_fast() {
    let t = create_test_service();
    let pcs = serde_json::to_string(&[ACUTE_CASE, "garbage", ACUTE_PCI_CASE]).unwrap();
    let err = t
        .service
        .group_many(&batch(ACUTE_VERSION, &pcs, GroupOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedCase(_)));
}

#[tokio::test]
async fn test_group_many_parameter_errors() {
    let t = create_test_service();

    let err = t
        .service
        .group_many(&GroupManyRequest {
            version: Some(ACUTE_VERSION.to_string()),
            ..GroupManyRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You have to provide a list of patient cases in the 'pcs' parameter!"
    );

    let err = t
        .service
        .group_many(&batch(ACUTE_VERSION, "{\"pc\": 1}", GroupOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidParameter(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_group_many_supplements() {
    let t = create_test_service();
    let pcs = serde_json::to_string(&[ACUTE_PCI_CASE]).unwrap();
    let options = GroupOptions {
        annotate: false,
        supplements: true,
    };
    let results = t
        .service
        .group_many(&batch(ACUTE_VERSION, &pcs, options))
        .await
        .unwrap();
    assert_eq!(results[0].supplement_result.as_ref().unwrap().total_amount, 315.5);
}

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let t = create_test_service();
    t.service
        .group(&single(REHA_VERSION, REHA_CASE, GroupOptions::default()))
        .await
        .unwrap();
    assert_eq!(t.service.cache_stats().versions, vec![REHA_VERSION]);

    t.service.clear_cache();
    assert_eq!(t.service.cache_stats().size, 0);
}
