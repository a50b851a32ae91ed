// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{UserProfile, Gender, PreferredGender, ChatState, MatchOutcome, SwapOutcome, ResetOutcome};
pub use requests::{UserEventRequest, RelayRequest, SetGenderRequest, SetPreferenceRequest};
pub use responses::{SearchResponse, EventResponse, ProfileResponse, HealthResponse, ErrorResponse, Notification};
