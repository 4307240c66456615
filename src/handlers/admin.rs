use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Appointment;
use crate::services::scheduling;
use crate::state::AppState;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let appointments = {
        let db = state.db.lock().unwrap();
        queries::get_all_appointments(&db, status_filter, limit)
            .map_err(|e| AppError::Database(e).into_response())?
    };

    Ok(Json(appointments))
}

// POST /api/admin/appointments/:id/confirm
#[derive(Deserialize, Default)]
pub struct ConfirmRequest {
    /// `YYYY-MM-DD HH:MM` in IST.
    pub confirmed_time: Option<String>,
    pub notes: Option<String>,
}

pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<ConfirmRequest>>,
) -> Result<Json<Appointment>, Response> {
    check_auth(&headers, &state.config.admin_token)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let confirmed_time = match request.confirmed_time.as_deref() {
        Some(raw) => Some(
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
                .map_err(|e| {
                    AppError::BadRequest(format!("invalid confirmed_time '{raw}': {e}"))
                        .into_response()
                })?,
        ),
        None => None,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        scheduling::confirm_appointment(&db, &id, confirmed_time, request.notes)
            .map_err(IntoResponse::into_response)?
    };

    tracing::info!(appointment_id = %id, "appointment confirmed");
    Ok(Json(updated))
}

// POST /api/admin/appointments/:id/reject
#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub notes: Option<String>,
}

pub async fn reject_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Appointment>, Response> {
    check_auth(&headers, &state.config.admin_token)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let updated = {
        let db = state.db.lock().unwrap();
        scheduling::reject_appointment(&db, &id, request.notes)
            .map_err(IntoResponse::into_response)?
    };

    tracing::info!(appointment_id = %id, "appointment rejected");
    Ok(Json(updated))
}

// POST /api/admin/appointments/:id/complete
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db.lock().unwrap();
        scheduling::complete_appointment(&db, &id).map_err(IntoResponse::into_response)?
    };

    tracing::info!(appointment_id = %id, "appointment completed");
    Ok(Json(updated))
}
