//! REST views over the current cycle report and the cycle history.

use crate::models::{CycleInfo, DailyUsageReport, LineInfo};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

/// `GET /current-cycle-report?userId=..&mdn=..`
#[tracing::instrument(skip(state, line), fields(user_id = %line.user_id, mdn = %line.mdn))]
pub async fn current_cycle_report(
    State(state): State<AppState>,
    Query(line): Query<LineInfo>,
) -> Result<Json<Vec<DailyUsageReport>>, AppError> {
    let reports = state.cycles.get_current_cycle_report(&line).await?;
    Ok(Json(reports))
}

/// `GET /cycle-history?userId=..&mdn=..`
#[tracing::instrument(skip(state, line), fields(user_id = %line.user_id, mdn = %line.mdn))]
pub async fn cycle_history(
    State(state): State<AppState>,
    Query(line): Query<LineInfo>,
) -> Result<Json<Vec<CycleInfo>>, AppError> {
    let cycles = state.cycles.get_cycle_history(&line).await?;
    Ok(Json(cycles))
}

#[cfg(test)]
mod tests {
    use crate::config::{DatabaseConfig, UsageConfig};
    use crate::models::SubscriberKey;
    use crate::services::{init_metrics, CycleService, Database, InMemoryStore};
    use crate::startup::{build_router, AppState};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chrono::Utc;
    use service_core::config::Config as CoreConfig;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    const DAY: i64 = 24 * 60 * 60 * 1000;
    const UNUSED_DB: &str = "postgres://postgres@127.0.0.1:1/unused";

    fn router(store: Arc<InMemoryStore>) -> Router {
        let config = UsageConfig {
            common: CoreConfig {
                port: 0,
                grpc_port: None,
            },
            service_name: "usage-service-test".to_string(),
            service_version: "0.1.0".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: UNUSED_DB.to_string(),
                max_connections: 1,
                min_connections: 0,
            },
        };
        // Never connected: the cycle routes below run on the in-memory store.
        let pool = PgPoolOptions::new()
            .connect_lazy(UNUSED_DB)
            .expect("lazy pool");

        build_router(AppState {
            config,
            db: Arc::new(Database::from_pool(pool)),
            cycles: Arc::new(CycleService::new(store.clone(), store)),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn current_cycle_report_returns_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        let now = Utc::now().timestamp_millis();
        store.insert_cycle(&key, now - 10 * DAY, now + 20 * DAY);
        store.insert_usage(&key, now - 3 * DAY, 100);
        store.insert_usage(&key, now - DAY, 128);

        let (status, body) = get(router(store), "/current-cycle-report?userId=U1&mdn=M1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["dailyUsage"], 128);
        assert_eq!(body[0]["date"], now - DAY);
        assert_eq!(body[1]["dailyUsage"], 100);
    }

    #[tokio::test]
    async fn current_cycle_report_without_cycle_is_404() {
        let (status, body) = get(
            router(Arc::new(InMemoryStore::new())),
            "/current-cycle-report?userId=U1&mdn=M1",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "No current cycle found for this user: U1 and mdn: M1."
        );
    }

    #[tokio::test]
    async fn cycle_history_lists_cycles() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        let older = store.insert_cycle(&key, 0, DAY);
        let newer = store.insert_cycle(&key, 2 * DAY, 3 * DAY);

        let (status, body) = get(router(store), "/cycle-history?userId=U1&mdn=M1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["cycleId"], newer.to_string());
        assert_eq!(body[1]["cycleId"], older.to_string());
        assert_eq!(body[1]["startDate"], 0);
    }

    #[tokio::test]
    async fn cycle_history_for_unknown_line_is_404() {
        let (status, _) = get(
            router(Arc::new(InMemoryStore::new())),
            "/cycle-history?userId=U2&mdn=M2",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_parameter_is_400() {
        let (status, body) = get(
            router(Arc::new(InMemoryStore::new())),
            "/cycle-history?userId=U1&mdn=",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
    }

    #[tokio::test]
    async fn missing_parameter_is_400() {
        let (status, _) = get(
            router(Arc::new(InMemoryStore::new())),
            "/current-cycle-report?userId=U1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn request_counters_reach_metrics_endpoint() {
        init_metrics();
        let store = Arc::new(InMemoryStore::new());

        let (status, _) = get(router(store.clone()), "/cycle-history?userId=U7&mdn=M7").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = router(store)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains("http_requests_total"));
        assert!(text.contains("path=\"/cycle-history\""));
        assert!(text.contains("usage_cycle_lookups_total"));
    }
}
