use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::autocomplete::Autocomplete;
use crate::service::{
    ClientOptions, ConfirmedResult, CustomerIdService, CustomerRequest, HttpService,
    PreviewResult, ServiceError, SuggestContext, SuggestKind,
};
use crate::workflow::policy::{
    DEFAULT_CONSOLIDATED_INVOICE, DEFAULT_RELATED_ENTERPRISE, DEFAULT_SEPARATE_INVOICE,
};
use crate::workflow::view::{self, Action};
use crate::workflow::{
    BranchHandling, CategoryPolicy, FormSelection, ValidationError, Workflow, WorkflowError,
    WorkflowState,
};
use crate::i18n::Message;

#[derive(Default)]
struct ScriptedService {
    previews: Mutex<VecDeque<Result<PreviewResult, ServiceError>>>,
    commits: Mutex<VecDeque<Result<ConfirmedResult, ServiceError>>>,
    calls: Mutex<Vec<(&'static str, CustomerRequest)>>,
}

impl ScriptedService {
    fn preview_ok(self, id: &str) -> Self {
        self.previews.lock().unwrap().push_back(Ok(PreviewResult {
            customer_id: id.to_string(),
        }));
        self
    }

    fn commit_ok(self, id: &str) -> Self {
        self.commits.lock().unwrap().push_back(Ok(ConfirmedResult {
            customer_id: id.to_string(),
            status: Some("confirmed".to_string()),
        }));
        self
    }

    fn commit_err(self, status: u16, detail: &str) -> Self {
        self.commits.lock().unwrap().push_back(Err(ServiceError::Remote {
            path: "/generate_customer_id".to_string(),
            status,
            detail: detail.to_string(),
        }));
        self
    }

    fn calls(&self) -> Vec<(&'static str, CustomerRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CustomerIdService for ScriptedService {
    async fn preview(&self, request: &CustomerRequest) -> Result<PreviewResult, ServiceError> {
        self.calls.lock().unwrap().push(("preview", request.clone()));
        self.previews
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted preview")
    }

    async fn commit(&self, request: &CustomerRequest) -> Result<ConfirmedResult, ServiceError> {
        self.calls.lock().unwrap().push(("commit", request.clone()));
        self.commits
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted commit")
    }
}

fn related_enterprise_selection() -> FormSelection {
    let mut selection = FormSelection::new("北投", DEFAULT_RELATED_ENTERPRISE, "Acme");
    selection.extra_region_code = "07".to_string();
    selection.branch_name = "North".to_string();
    selection
}

#[tokio::test]
async fn related_enterprise_without_branch_name_is_rejected_locally() {
    let service = ScriptedService::default().preview_ok("R07-001");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    let mut selection = FormSelection::new("北投", DEFAULT_RELATED_ENTERPRISE, "Acme");
    selection.extra_region_code = "07".to_string();

    let err = workflow.submit(&selection).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::MissingBranchName)
    ));
    assert_eq!(workflow.state(), &WorkflowState::Idle);
    assert!(workflow.service().calls().is_empty());
}

#[tokio::test]
async fn related_enterprise_preview_shows_id_with_actions() {
    let service = ScriptedService::default().preview_ok("R07-001");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());

    let preview = workflow.submit(&related_enterprise_selection()).await.unwrap();
    assert_eq!(preview.customer_id, "R07-001");

    let calls = workflow.service().calls();
    assert_eq!(calls.len(), 1);
    let body = serde_json::to_value(&calls[0].1).unwrap();
    assert_eq!(
        body,
        json!({
            "region": "北投",
            "category": DEFAULT_RELATED_ENTERPRISE,
            "company_name": "Acme",
            "extra_region_code": "07",
            "branch_name": "North",
        })
    );

    let shown = view::project(workflow.state());
    assert_eq!(shown.label, Some(Message::PreviewLabel));
    assert_eq!(shown.customer_id.as_deref(), Some("R07-001"));
    assert_eq!(shown.actions, vec![Action::Confirm, Action::Cancel]);
}

#[tokio::test]
async fn cancel_never_commits() {
    let service = ScriptedService::default().preview_ok("R07-001");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    workflow.submit(&related_enterprise_selection()).await.unwrap();

    let discarded = workflow.cancel().unwrap();
    assert_eq!(discarded.customer_id, "R07-001");
    assert_eq!(workflow.state(), &WorkflowState::Idle);
    assert!(view::project(workflow.state()).customer_id.is_none());
    assert!(workflow
        .service()
        .calls()
        .iter()
        .all(|(kind, _)| *kind == "preview"));
}

#[tokio::test]
async fn failed_commit_keeps_preview_and_retry_succeeds() {
    let service = ScriptedService::default()
        .preview_ok("R07-001")
        .commit_err(500, "database locked")
        .commit_ok("R07-001");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    workflow.submit(&related_enterprise_selection()).await.unwrap();

    let err = workflow.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Confirm(ServiceError::Remote { status: 500, .. })
    ));
    match workflow.state() {
        WorkflowState::Previewed { preview, .. } => assert_eq!(preview.customer_id, "R07-001"),
        other => panic!("unexpected state {}", other.name()),
    }
    assert_eq!(
        view::project(workflow.state()).actions,
        vec![Action::Confirm, Action::Cancel]
    );

    let confirmed = workflow.confirm().await.unwrap();
    assert_eq!(confirmed.customer_id, "R07-001");
    let shown = view::project(workflow.state());
    assert_eq!(shown.label, Some(Message::GeneratedLabel));
    assert!(shown.actions.is_empty());

    // both commits carry the body captured at preview time
    let calls = workflow.service().calls();
    let commits: Vec<_> = calls.iter().filter(|(k, _)| *k == "commit").collect();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].1, calls[0].1);
    assert_eq!(commits[1].1, calls[0].1);
}

#[tokio::test]
async fn plain_category_strips_stale_branch_fields() {
    let service = ScriptedService::default().preview_ok("S01-014");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    let mut selection = related_enterprise_selection();
    selection.category = "單一客戶".to_string();
    selection.branch_handling = Some(BranchHandling::AssignSequentialBranchNumber);

    workflow.submit(&selection).await.unwrap();
    let body = serde_json::to_value(&workflow.service().calls()[0].1).unwrap();
    assert_eq!(
        body,
        json!({ "region": "北投", "category": "單一客戶", "company_name": "Acme" })
    );
}

#[tokio::test]
async fn sequential_branch_numbering_sends_mode_and_branch() {
    let service = ScriptedService::default().preview_ok("C02-003");
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    let mut selection = FormSelection::new("台南", DEFAULT_CONSOLIDATED_INVOICE, "Chain Co");
    selection.set_branch_handling(
        BranchHandling::AssignSequentialBranchNumber,
        workflow.policy(),
    );
    selection.branch_name = "Station Rd".to_string();

    workflow.submit(&selection).await.unwrap();
    let body = serde_json::to_value(&workflow.service().calls()[0].1).unwrap();
    assert_eq!(body["branch_handling"], "assign-sequential-branch-number");
    assert_eq!(body["branch_name"], "Station Rd");
    assert!(body.get("extra_region_code").is_none());
}

#[tokio::test]
async fn missing_branch_name_blocks_the_request() {
    let service = ScriptedService::default();
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    let selection = FormSelection::new("高雄", DEFAULT_SEPARATE_INVOICE, "Acme");

    let err = workflow.submit(&selection).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::MissingBranchName)
    ));
    assert_eq!(workflow.state(), &WorkflowState::Idle);
    assert!(workflow.service().calls().is_empty());
}

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
    queries: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

async fn spawn(app: Router) -> HttpService {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpService::new(&ClientOptions {
        base_url: format!("http://{addr}/"),
        timeout_seconds: 5,
        proxy: None,
    })
    .unwrap()
}

async fn preview_handler(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    captured
        .bodies
        .lock()
        .unwrap()
        .push(("preview".to_string(), body));
    Json(json!({ "customer_id": "R07-001" }))
}

async fn generate_handler(
    State(captured): State<Captured>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    captured
        .queries
        .lock()
        .unwrap()
        .push(("generate".to_string(), query.clone()));
    captured
        .bodies
        .lock()
        .unwrap()
        .push(("generate".to_string(), body));
    if query.get("confirm").map(String::as_str) != Some("true") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "confirm flag missing" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "customer_id": "R07-001", "status": "confirmed" })),
    )
}

fn customer_router(captured: Captured) -> Router {
    Router::new()
        .route("/preview_customer_id", post(preview_handler))
        .route("/generate_customer_id", post(generate_handler))
        .with_state(captured)
}

#[tokio::test]
async fn http_preview_and_commit_wire_format() {
    let captured = Captured::default();
    let service = spawn(customer_router(captured.clone())).await;
    let mut workflow = Workflow::new(service, CategoryPolicy::default());

    workflow.submit(&related_enterprise_selection()).await.unwrap();
    let confirmed = workflow.confirm().await.unwrap();
    assert_eq!(confirmed.customer_id, "R07-001");
    assert_eq!(confirmed.status.as_deref(), Some("confirmed"));

    let bodies = captured.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].0, "preview");
    assert!(bodies[0].1.get("branch_handling").is_none());
    assert_eq!(bodies[0].1["extra_region_code"], "07");
    assert_eq!(bodies[1].1, bodies[0].1);

    let queries = captured.queries.lock().unwrap().clone();
    assert_eq!(queries[0].1.get("confirm").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn http_commit_failure_surfaces_detail() {
    let app = Router::new()
        .route(
            "/preview_customer_id",
            post(|| async { Json(json!({ "customer_id": "R07-001" })) }),
        )
        .route(
            "/generate_customer_id",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "database locked" })),
                )
            }),
        );
    let service = spawn(app).await;
    let mut workflow = Workflow::new(service, CategoryPolicy::default());
    workflow.submit(&related_enterprise_selection()).await.unwrap();

    match workflow.confirm().await.unwrap_err() {
        WorkflowError::Confirm(ServiceError::Remote { status, detail, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "database locked");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(matches!(workflow.state(), WorkflowState::Previewed { .. }));
}

async fn query_handler(Path(name): Path<String>) -> Json<Value> {
    if name == "Acme 公司" {
        Json(json!({
            "data": [{
                "Region": "北投",
                "Category": "單一客戶",
                "CompanyName": "Acme 公司",
                "ExtraRegionCode": null,
                "BranchName": null,
                "BranchHandling": null,
                "CustomerID": 1900001
            }]
        }))
    } else {
        Json(json!({ "detail": "Customer ID not found" }))
    }
}

#[tokio::test]
async fn http_query_decodes_rows_and_maps_not_found() {
    let app = Router::new().route("/query_customer_id/:name", get(query_handler));
    let service = spawn(app).await;

    let rows = service.query_by_name("Acme 公司").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer_id, "1900001");
    assert_eq!(rows[0].branch_name, "");

    let err = service.query_by_name("Nobody").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn http_delete_and_update_map_404() {
    let app = Router::new()
        .route(
            "/delete_customer_id/:id",
            delete(|Path(id): Path<String>| async move {
                if id == "1900001" {
                    (
                        StatusCode::OK,
                        Json(json!({ "detail": "Customer ID 1900001 deleted" })),
                    )
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "detail": "Customer ID not found" })),
                    )
                }
            }),
        )
        .route(
            "/update_customer_info/:id",
            axum::routing::put(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": "Customer ID not found" })),
                )
            }),
        );
    let service = spawn(app).await;

    let detail = service.delete_by_id("1900001").await.unwrap();
    assert_eq!(detail, "Customer ID 1900001 deleted");
    assert!(service.delete_by_id("404").await.unwrap_err().is_not_found());

    let update = crate::service::UpdateRequest {
        new_branch_name: Some("South".to_string()),
        ..Default::default()
    };
    assert!(service
        .update_by_id("404", &update)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn http_options_skip_null_categories() {
    let app = Router::new()
        .route("/regions", get(|| async { Json(json!(["北投", "台南", "高雄"])) }))
        .route(
            "/categories",
            get(|| async { Json(json!(["單一客戶", null, DEFAULT_RELATED_ENTERPRISE])) }),
        )
        .route("/extra_region_codes", get(|| async { Json(json!(["07"])) }));
    let service = spawn(app).await;

    let options = service.load_options().await.unwrap();
    assert_eq!(options.regions.len(), 3);
    assert_eq!(
        options.categories,
        vec!["單一客戶".to_string(), DEFAULT_RELATED_ENTERPRISE.to_string()]
    );
    assert_eq!(options.extra_region_codes, vec!["07".to_string()]);
}

#[tokio::test]
async fn branch_suggestions_send_context_filters() {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/search_branch_name/",
            get(
                |State(captured): State<Captured>,
                 Query(query): Query<HashMap<String, String>>| async move {
                    captured
                        .queries
                        .lock()
                        .unwrap()
                        .push(("branch".to_string(), query));
                    Json(json!({ "branch_names": ["North", "North", "Station Rd"] }))
                },
            ),
        )
        .with_state(captured.clone());
    let service = spawn(app).await;

    let context = SuggestContext {
        region: Some("北投".to_string()),
        category: Some(DEFAULT_RELATED_ENTERPRISE.to_string()),
        company_name: Some("Acme".to_string()),
    };
    let mut completer = Autocomplete::new(service, SuggestKind::Branch);
    let items = completer.lookup("No", &context).await.unwrap().to_vec();
    assert_eq!(items, vec!["North".to_string(), "Station Rd".to_string()]);

    let queries = captured.queries.lock().unwrap().clone();
    let sent = &queries[0].1;
    assert_eq!(sent.get("keyword").map(String::as_str), Some("No"));
    assert_eq!(sent.get("region").map(String::as_str), Some("北投"));
    assert_eq!(sent.get("company_name").map(String::as_str), Some("Acme"));
}
