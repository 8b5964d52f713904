use actix_web::{web, HttpResponse, Responder};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{MatchError, Matcher, RunSpec};
use crate::models::{
    Client, ErrorResponse, HealthResponse, RunMatchRequest, ScorePairRequest, ScorePairResponse,
    SnapshotData, SnapshotResponse,
};
use crate::services::{SnapshotError, SnapshotStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<SnapshotStore>,
    pub matcher: Matcher,
    pub matching: MatchingSettings,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/run", web::post().to(run_match))
        .route("/matches/score", web::post().to(score_pair))
        .route("/snapshot", web::put().to(replace_snapshot));
}

fn error_response(
    status: actix_web::http::StatusCode,
    error: &str,
    message: String,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn match_error_response(err: &MatchError) -> HttpResponse {
    use actix_web::http::StatusCode;
    match err {
        MatchError::EmptyCandidatePool => {
            error_response(StatusCode::CONFLICT, "no_eligible_advisors", err.to_string())
        }
        MatchError::InvalidTaxonomy(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_taxonomy", err.to_string())
        }
        MatchError::Worker(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "match_failed", err.to_string())
        }
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.snapshots.current().await;

    let status = if snapshot.advisors.is_empty() { "degraded" } else { "healthy" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        advisors: snapshot.advisors.len(),
        clients: snapshot.clients.len(),
        subtopics: snapshot.taxonomy.subtopic_count(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run a batch match
///
/// POST /api/v1/matches/run
///
/// Request body:
/// ```json
/// {
///   "clientIds": ["string"],
///   "roles": ["lead", "backup", "support"],
///   "topK": 5,
///   "includeExcluded": false,
///   "prospectsOnly": false
/// }
/// ```
async fn run_match(state: web::Data<AppState>, req: web::Json<RunMatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for run_match request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let snapshot = state.snapshots.current().await;

    let clients: Vec<Client> = if req.client_ids.is_empty() {
        if !req.prospects_only {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: "clientIds is required unless prospectsOnly is set".to_string(),
                status_code: 400,
            });
        }
        snapshot.prospects().cloned().collect()
    } else {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(req.client_ids.len());
        for client_id in req.client_ids.iter().filter(|id| seen.insert(id.as_str())) {
            match snapshot.client(client_id) {
                Some(client) if req.prospects_only && !client.is_prospect => {}
                Some(client) => selected.push(client.clone()),
                None => {
                    return HttpResponse::NotFound().json(ErrorResponse {
                        error: "Client not found".to_string(),
                        message: format!("Unknown client id {}", client_id),
                        status_code: 404,
                    });
                }
            }
        }
        selected
    };

    let top_k = req
        .top_k
        .unwrap_or(state.matching.default_top_k)
        .min(state.matching.max_top_k) as usize;
    let spec = RunSpec {
        roles: req.roles.clone(),
        top_k,
        include_excluded: req.include_excluded,
    };

    tracing::info!(
        "Running match for {} clients, roles {:?}, top_k {}",
        clients.len(),
        spec.roles,
        top_k
    );

    match state
        .matcher
        .run_match_concurrent(Arc::clone(&snapshot.taxonomy), clients, &snapshot.advisors, spec)
        .await
    {
        Ok(run) => HttpResponse::Ok().json(run),
        Err(e) => {
            tracing::error!("Match run failed: {}", e);
            match_error_response(&e)
        }
    }
}

/// Score a single pair
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "clientId": "string",
///   "advisorId": "string",
///   "role": "lead|backup|support"
/// }
/// ```
async fn score_pair(
    state: web::Data<AppState>,
    req: web::Json<ScorePairRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let snapshot = state.snapshots.current().await;

    let found = (snapshot.client(&req.client_id), snapshot.advisor(&req.advisor_id));
    let (client, advisor) = match found {
        (Some(client), Some(advisor)) => (client, advisor),
        (client, _) => {
            let missing = if client.is_none() {
                format!("Unknown client id {}", req.client_id)
            } else {
                format!("Unknown advisor id {}", req.advisor_id)
            };
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Not found".to_string(),
                message: missing,
                status_code: 404,
            });
        }
    };

    let evaluation = state
        .matcher
        .score_pair(&snapshot.taxonomy, client, advisor, req.role);

    tracing::debug!(
        "Scored {} -> {} as {}: {}",
        evaluation.client_id,
        evaluation.advisor_id,
        evaluation.role,
        evaluation.score()
    );

    HttpResponse::Ok().json(ScorePairResponse {
        score: evaluation.score(),
        eligible: evaluation.is_eligible(),
        raw_score: evaluation.pair.raw_score,
        segment_multiplier: evaluation.pair.segment_multiplier,
        capacity_pct: evaluation.capacity_pct,
        contributions: evaluation.pair.contributions,
        explanation: evaluation.explanation,
        warnings: evaluation.warnings,
        client_id: evaluation.client_id,
        advisor_id: evaluation.advisor_id,
        role: evaluation.role,
    })
}

/// Replace the snapshot
///
/// PUT /api/v1/snapshot
async fn replace_snapshot(
    state: web::Data<AppState>,
    data: web::Json<SnapshotData>,
) -> impl Responder {
    match state.snapshots.replace(data.into_inner()).await {
        Ok(snapshot) => HttpResponse::Ok().json(SnapshotResponse {
            advisors: snapshot.advisors.len(),
            clients: snapshot.clients.len(),
            subtopics: snapshot.taxonomy.subtopic_count(),
        }),
        Err(SnapshotError::Build(e)) => {
            tracing::warn!("Rejected snapshot: {}", e);
            match_error_response(&e)
        }
        Err(e) => {
            tracing::error!("Failed to replace snapshot: {}", e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "snapshot_failed",
                e.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use crate::core::DataWarning;
    use crate::models::MatchRun;
    use crate::services::Snapshot;

    async fn app_state() -> AppState {
        let store = SnapshotStore::load_file("data/sample_snapshot.json").await.unwrap();
        AppState {
            snapshots: Arc::new(store),
            matcher: Matcher::with_default_params(),
            matching: MatchingSettings::default(),
        }
    }

    fn small_snapshot(with_advisor: bool) -> serde_json::Value {
        let advisors = if with_advisor {
            serde_json::json!([{
                "id": "adv-new",
                "maxFamilies": 10,
                "currentFamilies": 3,
                "targetSegment": "traditional",
                "skills": [{ "subtopicId": "tax-planning", "skillLevel": 6 }]
            }])
        } else {
            serde_json::json!([])
        };
        serde_json::json!({
            "domains": [{ "id": "tax", "name": "Tax" }],
            "subtopics": [{ "id": "tax-planning", "domainId": "tax", "name": "Tax planning" }],
            "advisors": advisors,
            "clients": [{
                "id": "cli-new",
                "segment": "traditional",
                "complexityTier": "standard",
                "isProspect": true,
                "needs": [{
                    "subtopicId": "tax-planning",
                    "importance": 4,
                    "urgency": 2,
                    "horizon": "one_year"
                }]
            }]
        })
    }

    #[actix_web::test]
    async fn test_health_reports_snapshot() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.advisors, 4);
    }

    #[actix_web::test]
    async fn test_run_match_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/run")
            .set_json(serde_json::json!({ "clientIds": ["cli-101"], "roles": ["lead"], "topK": 2 }))
            .to_request();
        let run: MatchRun = test::call_and_read_body_json(&app, req).await;

        assert!(run.results.len() <= 2);
        assert!(run.results.iter().all(|r| r.advisor_id != "adv-002"));
    }

    #[actix_web::test]
    async fn test_unknown_client_is_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/score")
            .set_json(serde_json::json!({ "clientId": "nobody", "advisorId": "adv-001" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_invalid_snapshot_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/v1/snapshot")
            .set_json(serde_json::json!({
                "domains": [],
                "subtopics": [{ "id": "s", "domainId": "missing", "name": "S" }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
    }

    #[actix_web::test]
    async fn test_prospects_only_run_targets_all_prospects() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/run")
            .set_json(serde_json::json!({ "prospectsOnly": true, "roles": ["backup"] }))
            .to_request();
        let run: MatchRun = test::call_and_read_body_json(&app, req).await;

        let mut clients: Vec<&str> = run.results.iter().map(|r| r.client_id.as_str()).collect();
        clients.dedup();
        assert_eq!(clients, vec!["cli-101", "cli-102"]);
    }

    #[actix_web::test]
    async fn test_run_without_clients_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/run")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_empty_advisor_pool_is_409() {
        let data: SnapshotData = serde_json::from_value(small_snapshot(false)).unwrap();
        let state = AppState {
            snapshots: Arc::new(SnapshotStore::new(Snapshot::build(data).unwrap())),
            matcher: Matcher::with_default_params(),
            matching: MatchingSettings::default(),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/run")
            .set_json(serde_json::json!({ "clientIds": ["cli-new"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "no_eligible_advisors");
    }

    #[actix_web::test]
    async fn test_replace_snapshot() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/v1/snapshot")
            .set_json(small_snapshot(true))
            .to_request();
        let resp: SnapshotResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!((resp.advisors, resp.clients, resp.subtopics), (1, 1, 1));

        // Later requests see only the new snapshot
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.advisors, 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/run")
            .set_json(serde_json::json!({ "clientIds": ["cli-101"] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_score_pair_reports_warnings() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/matches/score")
            .set_json(serde_json::json!({
                "clientId": "cli-100",
                "advisorId": "adv-004",
                "role": "backup"
            }))
            .to_request();
        let resp: ScorePairResponse = test::call_and_read_body_json(&app, req).await;

        assert!(resp.eligible);
        assert!(resp
            .warnings
            .iter()
            .any(|w| matches!(w, DataWarning::InactiveSubtopic { .. })));
    }
}
