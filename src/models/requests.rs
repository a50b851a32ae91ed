use serde::{Deserialize, Serialize};
use validator::Validate;

/// Event carrying only the originating user id (search, cancel, end, swap,
/// reset, unreachable)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserEventRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Request to relay a message to the current partner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Request to set a user's gender
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetGenderRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    pub gender: crate::models::Gender,
}

/// Request to set a user's partner preference
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetPreferenceRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(alias = "preferred_gender", rename = "preferredGender")]
    pub preferred_gender: crate::models::PreferredGender,
}
