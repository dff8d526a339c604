use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{
    database::DataAccessState,
    models::{DashboardStats, DatabaseHealth, HealthState},
    session::{Session, SessionResolverState},
};

/// health
///
/// [Public Route] Liveness check for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// database_health
///
/// [Public Route] Pings the data access handle. Returns 503 when the database is unreachable.
#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = DatabaseHealth),
        (status = 503, description = "Database unreachable", body = DatabaseHealth)
    )
)]
pub async fn database_health(
    State(db): State<DataAccessState>,
) -> (StatusCode, Json<DatabaseHealth>) {
    let backend = db.backend().to_string();
    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DatabaseHealth {
                status: HealthState::Ok,
                backend,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DatabaseHealth {
                    status: HealthState::Unavailable,
                    backend,
                }),
            )
        }
    }
}

/// current_session
///
/// [Public Route] Echoes the session resolved for this request, or `null`. A resolver
/// failure is reported as `null` as well.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Resolved session, or null when there is none", body = Session))
)]
pub async fn current_session(
    State(sessions): State<SessionResolverState>,
    headers: HeaderMap,
) -> Json<Option<Session>> {
    match sessions.get_session(&headers).await {
        Ok(session) => Json(session),
        Err(e) => {
            tracing::warn!(error = %e, "session resolution failed");
            Json(None)
        }
    }
}

/// dashboard_stats
///
/// [Admin Route] Placeholder dashboard counts. Only reachable through the access gate.
#[utoipa::path(
    get,
    path = "/admin/api/stats",
    responses(
        (status = 200, description = "Dashboard counts", body = DashboardStats),
        (status = 307, description = "Redirect to the access denied page")
    )
)]
pub async fn dashboard_stats() -> Json<DashboardStats> {
    Json(DashboardStats::placeholder())
}
