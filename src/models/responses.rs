use serde::{Deserialize, Serialize};
use crate::models::domain::{ChatState, MatchOutcome};

/// Outbound message handed to the transport after an engine call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
    pub text: String,
}

/// Response for the search, swap and reset events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub outcome: MatchOutcome,
    /// Notifications dispatched to the transport while handling the event.
    pub notifications: Vec<Notification>,
}

/// Response for cancel, end, relay and unreachable events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    /// False when the event was a no-op (not searching, not in a chat).
    pub applied: bool,
    pub state: ChatState,
    pub notifications: Vec<Notification>,
}

/// Response for profile updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub state: ChatState,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
