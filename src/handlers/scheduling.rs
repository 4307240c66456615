use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Appointment, TimeWindow};
use crate::services::scheduling;
use crate::state::AppState;

// Booking dates are interpreted in IST (no DST, so a fixed offset is exact).
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

/// GET /scheduling/lead/:lead_id — the booking page uses this to resolve who
/// the visitor is and where their booking stands.
pub async fn get_lead_status(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = {
        let db = state.db.lock().unwrap();
        scheduling::latest_appointment_for_lead(&db, &lead_id)?
    };

    match appointment {
        Some(appt) => Ok(Json(appt)),
        None => Err(AppError::NotFound(format!(
            "no appointment for lead {lead_id}"
        ))),
    }
}

#[derive(Deserialize)]
pub struct WindowSelectionRequest {
    pub appointment_id: String,
    /// `YYYY-MM-DD`, interpreted as midnight IST.
    pub date_str: String,
    pub window: TimeWindow,
}

/// POST /scheduling/select-window
pub async fn select_window(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WindowSelectionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = NaiveDate::parse_from_str(&request.date_str, "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("invalid date '{}': {e}", request.date_str)))?;

    let ist = FixedOffset::east_opt(IST_OFFSET_SECS).expect("valid offset");
    let midnight = date.and_hms_opt(0, 0, 0).expect("valid midnight");
    let date_utc = ist
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .ok_or_else(|| AppError::BadRequest(format!("ambiguous date '{}'", request.date_str)))?;

    let updated = {
        let db = state.db.lock().unwrap();
        scheduling::select_window(&db, &request.appointment_id, date_utc, request.window)?
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated,
    })))
}
