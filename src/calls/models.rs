//! Call Models
//! Mission: Owned call records and their two-state lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Call lifecycle state. Every call starts `Open`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Open => "open",
            CallStatus::Closed => "closed",
        }
    }

    /// Exact match against the closed set; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(CallStatus::Open),
            "closed" => Some(CallStatus::Closed),
            _ => None,
        }
    }
}

/// A logged call, owned by the account that created it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    pub id: Uuid,
    pub client_name: String,
    pub phone_number: String,
    pub description: String,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid, // owner; set once at creation
}

/// Create call request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCallRequest {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub description: String,
}

impl CreateCallRequest {
    /// Name of the first required field left empty, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.client_name.is_empty() {
            Some("client_name")
        } else if self.phone_number.is_empty() {
            Some("phone_number")
        } else if self.description.is_empty() {
            Some("description")
        } else {
            None
        }
    }
}

/// Status update request body. Kept as a raw string so unknown values reach
/// the service and are rejected there, after the ownership checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCallStatusRequest {
    #[serde(default)]
    pub status: String,
}
