use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub lead_id: String,
    pub status: AppointmentStatus,
    pub preferred_date: Option<NaiveDateTime>,
    pub preferred_window: Option<TimeWindow>,
    pub confirmed_time: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Lifecycle: Initiated → WindowSelected → Confirmed → Completed, with
/// Rejected reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Initiated,
    WindowSelected,
    Confirmed,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    /// Statuses that count as an open appointment for a lead.
    pub const OPEN: [AppointmentStatus; 3] = [
        AppointmentStatus::Initiated,
        AppointmentStatus::WindowSelected,
        AppointmentStatus::Confirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Initiated => "initiated",
            AppointmentStatus::WindowSelected => "window_selected",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "window_selected" => AppointmentStatus::WindowSelected,
            "confirmed" => AppointmentStatus::Confirmed,
            "rejected" => AppointmentStatus::Rejected,
            "completed" => AppointmentStatus::Completed,
            _ => AppointmentStatus::Initiated,
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected | AppointmentStatus::Completed
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Morning,
    Afternoon,
    Evening,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Morning => "morning",
            TimeWindow::Afternoon => "afternoon",
            TimeWindow::Evening => "evening",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(TimeWindow::Morning),
            "afternoon" => Some(TimeWindow::Afternoon),
            "evening" => Some(TimeWindow::Evening),
            _ => None,
        }
    }
}
