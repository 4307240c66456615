use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Lead, TimeWindow};

/// Looks a lead up by phone number, creating one on first contact.
/// Idempotent: repeated calls with the same phone return the same lead.
pub fn find_or_create_lead(conn: &Connection, phone: &str) -> Result<Lead, AppError> {
    if let Some(lead) = queries::get_lead_by_phone(conn, phone)? {
        return Ok(lead);
    }

    let lead = Lead {
        id: Uuid::new_v4().to_string(),
        phone: phone.to_string(),
        name: None,
        created_at: Utc::now().naive_utc(),
    };
    queries::insert_lead(conn, &lead)?;
    tracing::info!(lead_id = %lead.id, phone = %lead.phone, "created lead");
    Ok(lead)
}

pub fn find_open_appointment(
    conn: &Connection,
    lead_id: &str,
) -> Result<Option<Appointment>, AppError> {
    Ok(queries::get_open_appointment(conn, lead_id)?)
}

/// Creates a fresh Initiated appointment. The caller is expected to have
/// checked for an open appointment first; the unique open-appointment index
/// rejects the insert if one slipped in anyway.
pub fn create_initial_appointment(
    conn: &Connection,
    lead_id: &str,
) -> Result<Appointment, AppError> {
    let now = Utc::now().naive_utc();
    let appt = Appointment {
        id: Uuid::new_v4().to_string(),
        lead_id: lead_id.to_string(),
        status: AppointmentStatus::Initiated,
        preferred_date: None,
        preferred_window: None,
        confirmed_time: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_appointment(conn, &appt)?;
    tracing::info!(appointment_id = %appt.id, lead_id = %lead_id, "created appointment");
    Ok(appt)
}

/// Records the lead's preferred date and time-of-day window.
///
/// Allowed from Initiated and WindowSelected (re-selection is idempotent).
/// A Confirmed appointment is frozen, and terminal appointments cannot be
/// revived through this path.
pub fn select_window(
    conn: &Connection,
    appointment_id: &str,
    date: NaiveDateTime,
    window: TimeWindow,
) -> Result<Appointment, AppError> {
    let mut appt = queries::get_appointment_by_id(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    match appt.status {
        AppointmentStatus::Initiated | AppointmentStatus::WindowSelected => {}
        AppointmentStatus::Confirmed => {
            return Err(AppError::InvalidTransition(
                "cannot reschedule a confirmed appointment without agent approval".to_string(),
            ));
        }
        other => {
            return Err(AppError::InvalidTransition(format!(
                "cannot select a window for a {} appointment",
                other.as_str()
            )));
        }
    }

    appt.preferred_date = Some(date);
    appt.preferred_window = Some(window);
    appt.status = AppointmentStatus::WindowSelected;
    appt.updated_at = Utc::now().naive_utc();
    queries::update_appointment(conn, &appt)?;
    Ok(appt)
}

/// Agent-side transition: lock the time. Only a WindowSelected appointment
/// can be confirmed.
pub fn confirm_appointment(
    conn: &Connection,
    appointment_id: &str,
    confirmed_time: Option<NaiveDateTime>,
    notes: Option<String>,
) -> Result<Appointment, AppError> {
    let mut appt = queries::get_appointment_by_id(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    if appt.status != AppointmentStatus::WindowSelected {
        return Err(AppError::InvalidTransition(format!(
            "cannot confirm a {} appointment",
            appt.status.as_str()
        )));
    }

    appt.status = AppointmentStatus::Confirmed;
    appt.confirmed_time = confirmed_time;
    if notes.is_some() {
        appt.notes = notes;
    }
    appt.updated_at = Utc::now().naive_utc();
    queries::update_appointment(conn, &appt)?;
    Ok(appt)
}

/// Agent-side transition: reject. Allowed from any non-terminal state.
pub fn reject_appointment(
    conn: &Connection,
    appointment_id: &str,
    notes: Option<String>,
) -> Result<Appointment, AppError> {
    let mut appt = queries::get_appointment_by_id(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    if appt.status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "cannot reject a {} appointment",
            appt.status.as_str()
        )));
    }

    appt.status = AppointmentStatus::Rejected;
    if notes.is_some() {
        appt.notes = notes;
    }
    appt.updated_at = Utc::now().naive_utc();
    queries::update_appointment(conn, &appt)?;
    Ok(appt)
}

/// Agent-side transition: the call happened. Only from Confirmed.
pub fn complete_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> Result<Appointment, AppError> {
    let mut appt = queries::get_appointment_by_id(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    if appt.status != AppointmentStatus::Confirmed {
        return Err(AppError::InvalidTransition(format!(
            "cannot complete a {} appointment",
            appt.status.as_str()
        )));
    }

    appt.status = AppointmentStatus::Completed;
    appt.updated_at = Utc::now().naive_utc();
    queries::update_appointment(conn, &appt)?;
    Ok(appt)
}

/// Newest appointment for a lead regardless of status. Used by the booking
/// front-end to resolve who the visitor is and where their booking stands.
pub fn latest_appointment_for_lead(
    conn: &Connection,
    lead_id: &str,
) -> Result<Option<Appointment>, AppError> {
    Ok(queries::get_latest_appointment(conn, lead_id)?)
}
