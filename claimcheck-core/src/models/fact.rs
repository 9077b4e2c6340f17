use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the fact corpus. Rows are written by the offline index build and
/// are read-only for the lifetime of the serving process.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FactRecord {
    pub id: i64,
    pub summary: String,
    pub full_text: Option<String>,
    pub indexed_at: DateTime<Utc>,
}
