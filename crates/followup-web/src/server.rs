//! Web服务器

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use followup_core::{FollowUpError, Result};
use followup_workflow::IncidentService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::handlers::{
    add_suivi, api_root, create_incident, delete_incident, get_incident, get_patient_incidents,
    get_suivis, health, list_incidents, update_incident,
};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: IncidentService,
    pub service_name: Arc<str>,
    pub version: Arc<str>,
}

impl AppState {
    pub fn new(service: IncidentService, service_name: &str, version: &str) -> Self {
        Self {
            service,
            service_name: Arc::from(service_name),
            version: Arc::from(version),
        }
    }
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState, allowed_origins: &[String]) -> Self {
        let app = create_app(state, allowed_origins);
        Self { addr, app }
    }

    /// 运行直到收到关闭信号
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| FollowUpError::Internal(format!("Web server failed: {}", e)))?;

        info!("Web server stopped");
        Ok(())
    }
}

/// 构建完整应用（路由 + 中间件）
pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))
        // 健康检查
        .route("/health", get(health))
        // API路由
        .nest("/api", api_routes())
        .with_state(state)
        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
}

/// API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/incidents", get(list_incidents).post(create_incident))
        .route("/incidents/", get(list_incidents).post(create_incident))
        .route(
            "/incidents/:id",
            get(get_incident).put(update_incident).delete(delete_incident),
        )
        .route("/incidents/:id/suivis", get(get_suivis).post(add_suivi))
        .route("/patients/:id/incidents", get(get_patient_incidents))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use followup_database::{create_tables, insert_patient, DatabasePool, NewPatient};
    use followup_workflow::PaginationLimits;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn setup() -> (Router, i64) {
        let db = DatabasePool::in_memory().await.unwrap();
        create_tables(&db).await.unwrap();
        let patient_id = {
            let mut conn = db.pool().acquire().await.unwrap();
            insert_patient(&mut conn, &NewPatient::new("Dupont", "Jean").with_implant(3))
                .await
                .unwrap()
        };
        let service = IncidentService::new(db, PaginationLimits::default());
        let state = AppState::new(service, "FollowUp API", "1.0.0");
        (create_app(state, &["*".to_string()]), patient_id)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn incident_body(patient_id: i64) -> Value {
        json!({
            "incidentDate": "2024-03-20",
            "incidentTime": "14:30:00",
            "severity": "Minor",
            "description": "desc",
            "patientId": patient_id,
            "clinicianId": null
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = setup().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "FollowUp API");
        assert_eq!(body["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_incident_lifecycle_over_http() {
        let (app, patient_id) = setup().await;

        let (status, created) =
            send(&app, Method::POST, "/api/incidents", Some(incident_body(patient_id))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "Open");
        assert!(created.get("deleted").is_none());
        let id = created["id"].as_i64().unwrap();

        let (status, suivi) = send(
            &app,
            Method::POST,
            &format!("/api/incidents/{}/suivis", id),
            Some(json!({ "followUpDate": "2024-03-25", "actionsTaken": "Ajustement du volume" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(suivi["incidentId"], id);

        let (_, fetched) = send(&app, Method::GET, &format!("/api/incidents/{}", id), None).await;
        assert_eq!(fetched["status"], "InProgress");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/incidents/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Method::GET, &format!("/api/incidents/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/incidents/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, Method::GET, &format!("/api/incidents/{}/suivis", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_rejections_are_bad_request() {
        let (app, patient_id) = setup().await;

        let (status, _) = send(&app, Method::POST, "/api/incidents", Some(incident_body(99999))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut mismatch = incident_body(patient_id);
        mismatch["implantId"] = json!(4);
        let (status, _) = send(&app, Method::POST, "/api/incidents", Some(mismatch)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_severity = incident_body(patient_id);
        bad_severity["severity"] = json!("Mineur");
        let (status, _) = send(&app, Method::POST, "/api/incidents", Some(bad_severity)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut blank = incident_body(patient_id);
        blank["description"] = json!("    ");
        let (status, body) = send(&app, Method::POST, "/api/incidents", Some(blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_partial_update_over_http() {
        let (app, patient_id) = setup().await;
        let (_, created) =
            send(&app, Method::POST, "/api/incidents", Some(incident_body(patient_id))).await;
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/incidents/{}", id),
            Some(json!({ "status": "Resolved" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "Resolved");
        assert_eq!(updated["description"], "desc");
        assert_eq!(updated["severity"], "Minor");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/incidents/99999",
            Some(json!({ "status": "Closed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_pagination_bounds() {
        let (app, patient_id) = setup().await;
        send(&app, Method::POST, "/api/incidents", Some(incident_body(patient_id))).await;

        let (status, list) = send(&app, Method::GET, "/api/incidents?skip=0&limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/api/incidents?limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/api/incidents?limit=501", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/api/incidents?skip=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patient_incidents() {
        let (app, patient_id) = setup().await;

        let mut morning = incident_body(patient_id);
        morning["incidentTime"] = json!("09:00:00");
        send(&app, Method::POST, "/api/incidents", Some(morning)).await;
        send(&app, Method::POST, "/api/incidents", Some(incident_body(patient_id))).await;

        let (status, list) = send(
            &app,
            Method::GET,
            &format!("/api/patients/{}/incidents", patient_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list[0]["incidentTime"], "14:30:00");
        assert_eq!(list[1]["incidentTime"], "09:00:00");

        let (status, _) = send(&app, Method::GET, "/api/patients/99999/incidents", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_follow_up_errors() {
        let (app, patient_id) = setup().await;
        let (_, created) =
            send(&app, Method::POST, "/api/incidents", Some(incident_body(patient_id))).await;
        let id = created["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/incidents/{}/suivis", id),
            Some(json!({ "followUpDate": "2024-03-25", "actionsTaken": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/incidents/99999/suivis",
            Some(json!({ "followUpDate": "2024-03-25", "actionsTaken": "Action" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, list) =
            send(&app, Method::GET, &format!("/api/incidents/{}/suivis", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list.as_array().unwrap().is_empty());
    }
}
