//! Usage metering records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable record of one metered API call.
///
/// Written exactly once per accepted, non-demo request, after the true
/// outcome (status, latency) is known. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Record id.
    pub id: Uuid,
    /// The key that made the call.
    pub key_id: Uuid,
    /// Endpoint path.
    pub path: String,
    /// Request parameters as captured.
    pub params: serde_json::Value,
    /// Handler latency in milliseconds, when measured.
    pub latency_ms: Option<i64>,
    /// HTTP status of the response.
    pub status_code: i32,
    /// Caller class (e.g. `api`).
    pub source: String,
    /// When the call happened.
    pub created_at: DateTime<Utc>,
}

/// Fields for appending a usage record.
#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    /// The key that made the call.
    pub key_id: Uuid,
    /// Endpoint path.
    pub path: String,
    /// Request parameters as captured.
    pub params: serde_json::Value,
    /// Handler latency in milliseconds, when measured.
    pub latency_ms: Option<i64>,
    /// HTTP status of the response.
    pub status_code: i32,
    /// Caller class.
    pub source: String,
}
