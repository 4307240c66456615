use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
    pub created_at: NaiveDateTime,
}
