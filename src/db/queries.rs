use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Appointment, AppointmentStatus, Lead, TimeWindow};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Leads ──

pub fn get_lead_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Lead>> {
    let result = conn.query_row(
        "SELECT id, phone, name, created_at FROM leads WHERE phone = ?1",
        params![phone],
        |row| {
            Ok(Lead {
                id: row.get(0)?,
                phone: row.get(1)?,
                name: row.get(2)?,
                created_at: parse_dt(&row.get::<_, String>(3)?),
            })
        },
    );

    match result {
        Ok(lead) => Ok(Some(lead)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_lead(conn: &Connection, lead: &Lead) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO leads (id, phone, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![lead.id, lead.phone, lead.name, fmt_dt(&lead.created_at)],
    )?;
    Ok(())
}

// ── Appointments ──

const APPOINTMENT_COLS: &str = "id, lead_id, status, preferred_date, preferred_window, \
     confirmed_time, notes, created_at, updated_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, lead_id, status, preferred_date, preferred_window, confirmed_time, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id,
            appt.lead_id,
            appt.status.as_str(),
            appt.preferred_date.as_ref().map(fmt_dt),
            appt.preferred_window.map(|w| w.as_str()),
            appt.confirmed_time.as_ref().map(fmt_dt),
            appt.notes,
            fmt_dt(&appt.created_at),
            fmt_dt(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, preferred_date = ?2, preferred_window = ?3,
             confirmed_time = ?4, notes = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            appt.status.as_str(),
            appt.preferred_date.as_ref().map(fmt_dt),
            appt.preferred_window.map(|w| w.as_str()),
            appt.confirmed_time.as_ref().map(fmt_dt),
            appt.notes,
            fmt_dt(&appt.updated_at),
            appt.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLS} FROM appointments WHERE id = ?1"),
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The single open appointment for a lead, if any. If the invariant has been
/// violated and several exist, the first row in default order is returned.
pub fn get_open_appointment(conn: &Connection, lead_id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!(
            "SELECT {APPOINTMENT_COLS} FROM appointments
             WHERE lead_id = ?1 AND status IN ('initiated', 'window_selected', 'confirmed')"
        ),
        params![lead_id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Newest appointment for a lead regardless of status.
pub fn get_latest_appointment(
    conn: &Connection,
    lead_id: &str,
) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!(
            "SELECT {APPOINTMENT_COLS} FROM appointments
             WHERE lead_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"
        ),
        params![lead_id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {APPOINTMENT_COLS} FROM appointments
                 WHERE status = ?1 ORDER BY updated_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {APPOINTMENT_COLS} FROM appointments ORDER BY updated_at DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: String = row.get(0)?;
    let lead_id: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let preferred_date: Option<String> = row.get(3)?;
    let preferred_window: Option<String> = row.get(4)?;
    let confirmed_time: Option<String> = row.get(5)?;
    let notes: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Appointment {
        id,
        lead_id,
        status: AppointmentStatus::parse(&status_str),
        preferred_date: preferred_date.as_deref().map(parse_dt),
        preferred_window: preferred_window.as_deref().and_then(TimeWindow::parse),
        confirmed_time: confirmed_time.as_deref().map(parse_dt),
        notes,
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}
