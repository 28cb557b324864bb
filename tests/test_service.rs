//! Integration tests for the expression service.

use std::time::Duration;

use tempfile::TempDir;

use symcalc::engine::Engine;
use symcalc::service::{ComputeError, ExpressionService};
use symcalc::store::{CalcType, HistoryStore};

// ── helpers ──────────────────────────────────────────────────────────────────

fn service() -> (TempDir, ExpressionService, HistoryStore) {
    let tmp = TempDir::new().expect("tempdir");
    let store = HistoryStore::open(tmp.path().join("calculations.db")).expect("open store");
    let service = ExpressionService::new(Engine::default(), Duration::from_secs(5), store.clone());
    (tmp, service, store)
}

// ── evaluate ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn evaluate_simplifies_trig_identity_to_one() {
    let (_tmp, service, _store) = service();
    let out = service
        .evaluate("sin(x)**2 + cos(x)**2".into(), false)
        .await
        .unwrap();
    assert_eq!(out.result, "1");
    assert!(out.saved_id.is_none());
}

#[tokio::test]
async fn evaluate_with_save_persists_original_input() {
    let (_tmp, service, store) = service();
    let out = service.evaluate("2 + 3".into(), true).await.unwrap();
    assert_eq!(out.result, "5");

    let id = out.saved_id.expect("saved_id should be present");
    let listed = store.list_recent(1).unwrap();
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].input_expr, "2 + 3");
    assert_eq!(listed[0].result, "5");
    assert_eq!(listed[0].calc_type, CalcType::Evaluate);
}

#[tokio::test]
async fn save_false_never_creates_a_record() {
    let (_tmp, service, store) = service();
    let before = store.list_recent(100).unwrap().len();
    service.evaluate("1 + 1".into(), false).await.unwrap();
    service
        .differentiate("x**2".into(), "x".into(), 1, false)
        .await
        .unwrap();
    service
        .integrate("x".into(), "x".into(), None, None, false)
        .await
        .unwrap();
    assert_eq!(store.list_recent(100).unwrap().len(), before);
}

#[tokio::test]
async fn malformed_expression_is_a_descriptive_error() {
    let (_tmp, service, _store) = service();
    let err = service.evaluate("(x + 1".into(), false).await.unwrap_err();
    match err {
        ComputeError::Evaluation(msg) => assert!(!msg.is_empty()),
        other => panic!("expected Evaluation, got {other:?}"),
    }
}

// ── differentiate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_derivative_of_square() {
    let (_tmp, service, _store) = service();
    let out = service
        .differentiate("x**2".into(), "x".into(), 1, false)
        .await
        .unwrap();
    assert_eq!(out.result, "2*x");
}

#[tokio::test]
async fn second_derivative_of_cube() {
    let (_tmp, service, _store) = service();
    let out = service
        .differentiate("x**3".into(), "x".into(), 2, false)
        .await
        .unwrap();
    assert_eq!(out.result, "6*x");
}

#[tokio::test]
async fn derivative_label_is_annotated() {
    let (_tmp, service, store) = service();
    service
        .differentiate("x**2".into(), "x".into(), 1, true)
        .await
        .unwrap();
    service
        .differentiate("x**3".into(), "x".into(), 2, true)
        .await
        .unwrap();

    let listed = store.list_recent(2).unwrap();
    assert_eq!(listed[0].input_expr, "d^2/dx^2 x**3");
    assert_eq!(listed[1].input_expr, "d/dx x**2");
    assert_eq!(listed[0].calc_type, CalcType::Differentiate);
}

#[tokio::test]
async fn invalid_variable_name_is_rejected() {
    let (_tmp, service, _store) = service();
    let err = service
        .differentiate("x**2".into(), "2x".into(), 1, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("2x"));
}

// ── integrate ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn indefinite_integral_of_x() {
    let (_tmp, service, _store) = service();
    let out = service
        .integrate("x".into(), "x".into(), None, None, false)
        .await
        .unwrap();
    assert_eq!(out.result, "x**2/2");
}

#[tokio::test]
async fn definite_integral_of_x() {
    let (_tmp, service, _store) = service();
    let out = service
        .integrate(
            "x".into(),
            "x".into(),
            Some("0".into()),
            Some("2".into()),
            false,
        )
        .await
        .unwrap();
    assert_eq!(out.result, "2");
}

#[tokio::test]
async fn single_bound_behaves_as_indefinite() {
    // Regression for the bounds-presence edge case: one bound means no
    // bounds, identical to the fully indefinite call.
    let (_tmp, service, _store) = service();
    let only_lower = service
        .integrate("x".into(), "x".into(), Some("0".into()), None, false)
        .await
        .unwrap();
    let only_upper = service
        .integrate("x".into(), "x".into(), None, Some("2".into()), false)
        .await
        .unwrap();
    let neither = service
        .integrate("x".into(), "x".into(), None, None, false)
        .await
        .unwrap();
    assert_eq!(only_lower.result, neither.result);
    assert_eq!(only_upper.result, neither.result);
}

#[tokio::test]
async fn integral_labels_annotate_bounds_only_when_definite() {
    let (_tmp, service, store) = service();
    service
        .integrate("x".into(), "x".into(), None, None, true)
        .await
        .unwrap();
    service
        .integrate(
            "x".into(),
            "x".into(),
            Some("0".into()),
            Some("2".into()),
            true,
        )
        .await
        .unwrap();

    let listed = store.list_recent(2).unwrap();
    assert_eq!(listed[0].input_expr, "∫[0,2] x dx");
    assert_eq!(listed[1].input_expr, "∫ x dx");
    assert_eq!(listed[0].calc_type, CalcType::Integrate);
}

#[tokio::test]
async fn unintegrable_expression_is_an_evaluation_error() {
    let (_tmp, service, _store) = service();
    let err = service
        .integrate("sin(x)*cos(x)".into(), "x".into(), None, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ComputeError::Evaluation(_)));
    assert!(!err.to_string().is_empty());
}

// ── resource bounds and persistence degradation ──────────────────────────────

#[tokio::test]
async fn zero_deadline_times_out() {
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::open(tmp.path().join("calculations.db")).unwrap();
    let service = ExpressionService::new(Engine::default(), Duration::ZERO, store);
    let err = service.evaluate("x**2".into(), false).await.unwrap_err();
    assert!(matches!(err, ComputeError::Timeout(_)));
}

#[tokio::test]
async fn persistence_failure_degrades_to_unsaved_result() {
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::open(tmp.path().join("calculations.db")).unwrap();
    let service = ExpressionService::new(Engine::default(), Duration::from_secs(5), store);

    // Pull the database out from under the store; the insert will fail but
    // the computed result must still come back, without a saved_id.
    std::fs::remove_dir_all(tmp.path()).unwrap();

    let out = service.evaluate("1 + 1".into(), true).await.unwrap();
    assert_eq!(out.result, "2");
    assert!(out.saved_id.is_none());
}
