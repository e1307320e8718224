use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::lifecycle::closure::ApproverDirectory;
use crate::lifecycle::domain::{LifecycleArtifact, PdcaStage, UserId};
use crate::lifecycle::router::{
    closure_handler, lifecycle_router, lifecycle_router_with_approvers, ClosureRequest,
    LifecycleSettings, LifecycleState,
};

struct OnlyApprover(&'static str);

impl ApproverDirectory for OnlyApprover {
    fn is_authorized_approver(&self, user: &UserId) -> bool {
        user.as_str() == self.0
    }
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn advance_payload(artifact: LifecycleArtifact, notes: &str) -> Value {
    json!({
        "artifact": artifact,
        "notes": notes,
        "attachments": ["doc-evidence"],
        "actorId": "user-quality-lead",
        "now": "2025-03-04T12:00:00Z",
    })
}

#[tokio::test]
async fn advance_route_returns_the_advanced_artifact() {
    let router = lifecycle_router(LifecycleSettings::default());
    let payload = advance_payload(LifecycleArtifact::Cycle(plan_cycle("cycle-http")), "plan signed");

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["kind"], "cycle");
    assert_eq!(body["currentStage"], "Do");
    assert_eq!(body["stageHistory"][0]["stage"], "Plan");
    assert_eq!(body["stageHistory"][0]["completedBy"], "user-quality-lead");
    assert_eq!(body["stageHistory"][0]["attachments"][0], "doc-evidence");
}

#[tokio::test]
async fn advance_route_rejects_blank_notes() {
    let router = lifecycle_router(LifecycleSettings::default());
    let payload = advance_payload(LifecycleArtifact::Capa(complete_capa("capa-http")), "  ");

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["code"], "notesRequired");
    assert_eq!(
        body["error"],
        "stage transition rejected: notes are required to advance a lifecycle stage"
    );
}

#[tokio::test]
async fn advance_route_reports_completed_artifacts_as_conflict() {
    let router = lifecycle_router(LifecycleSettings::default());
    let mut capa = complete_capa("capa-closed");
    capa.pdca_stage = Some(PdcaStage::Completed);
    let payload = advance_payload(LifecycleArtifact::Capa(capa), "again");

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["code"], "alreadyCompleted");
}

#[tokio::test]
async fn advance_route_keeps_fields_it_does_not_model() {
    let router = lifecycle_router(LifecycleSettings::default());
    let payload = json!({
        "artifact": {
            "kind": "cycle",
            "id": "cycle-linked",
            "title": "Shorten discharge time",
            "owner": "user-ward-lead",
            "currentStage": "Do",
            "createdAt": "2025-03-01T09:00:00Z",
            "projectId": "proj-ward-3",
            "improvementMetrics": [{ "name": "discharge hours", "target": 4 }],
            "linkedCAPAIds": ["capa-7", "capa-9"],
            "stageHistory": [{
                "stage": "Plan",
                "enteredAt": "2025-03-01T09:00:00Z",
                "completedAt": "2025-03-02T09:00:00Z",
                "notes": "baseline",
                "reviewedBy": "user-auditor"
            }]
        },
        "notes": "pilot finished",
        "actorId": "user-quality-lead",
        "now": "2025-03-04T12:00:00Z",
    });

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["currentStage"], "Check");
    assert_eq!(body["projectId"], "proj-ward-3");
    assert_eq!(body["improvementMetrics"][0]["target"], 4);
    assert_eq!(body["linkedCAPAIds"], json!(["capa-7", "capa-9"]));
    assert_eq!(body["stageHistory"][0]["reviewedBy"], "user-auditor");
    assert_eq!(body["stageHistory"][1]["enteredAt"], "2025-03-02T09:00:00Z");
}

#[tokio::test]
async fn advance_route_keeps_unknown_capa_fields() {
    let router = lifecycle_router(LifecycleSettings::default());
    let mut artifact = serde_json::to_value(complete_capa("capa-extra")).unwrap();
    artifact["kind"] = json!("capa");
    artifact["projectId"] = json!("proj-ward-3");
    artifact["attachments"] = json!(["doc-root-cause"]);
    let payload = json!({
        "artifact": artifact,
        "notes": "investigation closed",
        "actorId": "user-quality-lead",
    });

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["pdcaStage"], "Do");
    assert_eq!(body["projectId"], "proj-ward-3");
    assert_eq!(body["attachments"][0], "doc-root-cause");
}

#[tokio::test]
async fn completeness_route_includes_closure_readiness_for_capa() {
    let router = lifecycle_router(LifecycleSettings::default());
    let mut payload = serde_json::to_value(capa_with_effectiveness("capa-eff", true, false)).unwrap();
    payload["kind"] = json!("capa");

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/completeness", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["completenessScore"], 100);
    assert_eq!(body["effectivenessGatePassed"], false);
    assert_eq!(body["isClosureReady"], false);
}

#[tokio::test]
async fn completeness_route_scores_documents() {
    let router = lifecycle_router(LifecycleSettings::default());
    let mut payload = serde_json::to_value(controlled_document("doc-http")).unwrap();
    payload["kind"] = json!("document");
    payload["currentVersion"] = json!("draft");

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/completeness", &payload))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["completenessScore"], 80);
    assert_eq!(body["missingFields"], json!(["currentVersion"]));
}

#[tokio::test]
async fn closure_handler_falls_back_to_configured_mode() {
    let lenient = Arc::new(LifecycleState {
        settings: LifecycleSettings {
            strict_capa_closure: false,
        },
        approvers: None,
    });
    let request = ClosureRequest {
        capa: capa_missing_due_date("capa-lenient"),
        strict_validation_enabled: None,
    };

    let response = closure_handler(State(lenient), axum::Json(request)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["basis"], "lenient_mode");
}

#[tokio::test]
async fn closure_route_honours_request_override() {
    let router = lifecycle_router(LifecycleSettings {
        strict_capa_closure: false,
    });
    let payload = json!({
        "capa": capa_missing_due_date("capa-strict"),
        "strictValidationEnabled": true,
    });

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/capa/closure", &payload))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "Missing required closure evidence: dueDate");
}

#[tokio::test]
async fn closure_route_checks_exception_signer_against_directory() {
    let mut capa = capa_missing_due_date("capa-signed");
    capa.closure_exception = Some(approved_exception());
    let payload = json!({ "capa": capa });

    let trusting = lifecycle_router(LifecycleSettings::default());
    let response = trusting
        .oneshot(post_json("/api/v1/lifecycle/capa/closure", &payload))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["allowed"], true);

    let checking = lifecycle_router_with_approvers(
        LifecycleSettings::default(),
        Arc::new(OnlyApprover("user-cmo")),
    );
    let response = checking
        .oneshot(post_json("/api/v1/lifecycle/capa/closure", &payload))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["basis"], "missing_evidence");
}

#[tokio::test]
async fn readiness_route_scores_empty_snapshot() {
    let router = lifecycle_router(LifecycleSettings::default());

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/readiness", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["readinessScore"], 100);
    assert_eq!(body["criticalOpenFindings"], 0);
}

#[tokio::test]
async fn board_route_groups_project_artifacts() {
    let router = lifecycle_router(LifecycleSettings::default());
    let mut ward = project("p-http", crate::lifecycle::domain::ProjectStatus::InProgress);
    ward.pdca_cycles.push(tracked_cycle("cycle-board"));
    let payload = serde_json::to_value(&ward).unwrap();

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/board", &payload))
        .await
        .unwrap();

    let body = read_json(response).await;
    let columns = body["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[1]["stageLabel"], "Do");
    assert_eq!(columns[1]["cards"][0]["id"], "cycle-board");
}

#[tokio::test]
async fn malformed_payload_is_rejected_by_extractor() {
    let router = lifecycle_router(LifecycleSettings::default());

    let response = router
        .oneshot(post_json("/api/v1/lifecycle/advance", &json!({ "notes": "x" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
