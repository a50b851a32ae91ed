use serde::{Deserialize, Serialize};

/// Self-declared gender of a user.
///
/// `Unset` is the default before the user picks one; an unset gender is only
/// acceptable to partners whose preference is `Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unset,
}

/// Which gender a user wants to be paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreferredGender {
    Male,
    Female,
    #[default]
    Any,
}

impl PreferredGender {
    /// Whether a candidate's gender satisfies this preference.
    pub fn accepts(&self, gender: Gender) -> bool {
        match self {
            PreferredGender::Any => true,
            PreferredGender::Male => gender == Gender::Male,
            PreferredGender::Female => gender == Gender::Female,
        }
    }
}

/// Where a user currently is in the chat lifecycle.
///
/// Transitions happen only inside the matchmaker; handlers never set this
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    #[default]
    Idle,
    Searching,
    Chatting,
}

/// Per-user profile and pairing state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "preferredGender", default)]
    pub preferred_gender: PreferredGender,
    #[serde(default)]
    pub state: ChatState,
    #[serde(default)]
    pub partner: Option<String>,
}

impl UserProfile {
    /// Fresh profile with defaults: idle, no partner, unset gender, any preference.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            gender: Gender::Unset,
            preferred_gender: PreferredGender::Any,
            state: ChatState::Idle,
            partner: None,
        }
    }

    pub fn is_chatting(&self) -> bool {
        self.state == ChatState::Chatting
    }
}

/// Result of a search attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "result", content = "partnerId")]
pub enum MatchOutcome {
    /// Paired with the given partner; both sides are now chatting.
    Matched(String),
    /// No compatible candidate was waiting; the caller joined the pool.
    Waiting,
}

/// Result of a partner swap: teardown of the old pair plus a fresh search,
/// performed as a single engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Partner of the chat that was torn down, if there was one.
    pub previous_partner: Option<String>,
    pub outcome: MatchOutcome,
}

/// Result of a session reset (the "start over" command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Former partner to notify about the disconnect, if a pair was torn down.
    pub notified_partner: Option<String>,
    /// Whether the user was removed from the waiting pool.
    pub left_pool: bool,
}
