//! Message templates and notification construction.
//!
//! The engine never formats or sends anything; route handlers build
//! notifications here and hand them to the transport after the engine call
//! returns.

use crate::models::Notification;

pub const CONNECTED: &str = "💬 You're now connected! Say hi!";
pub const SEARCHING: &str = "🔍 Searching for a partner...";
pub const SEARCH_CANCELED: &str = "❌ Search canceled.";
pub const CHAT_ENDED: &str = "❌ Chat ended.";
pub const CHAT_ENDED_BY_PARTNER: &str = "❌ Chat ended by partner.";
pub const PARTNER_LEFT: &str = "⚠️ Your partner left the chat.";
pub const PARTNER_DISCONNECTED: &str = "⚠️ Your partner disconnected.";
pub const PARTNER_UNAVAILABLE: &str = "⚠️ Partner is unavailable. Ending chat.";
pub const NO_ACTIVE_PARTNER: &str = "⚠️ No active partner found.";

pub fn notify(recipient_id: &str, text: &str) -> Notification {
    Notification {
        recipient_id: recipient_id.to_string(),
        text: text.to_string(),
    }
}

/// Both sides of a fresh pairing get the same connected message.
pub fn connected_pair(a: &str, b: &str) -> Vec<Notification> {
    vec![notify(a, CONNECTED), notify(b, CONNECTED)]
}

/// Relayed messages are anonymized behind a generic sender tag.
pub fn relay(recipient_id: &str, content: &str) -> Notification {
    notify(recipient_id, &format!("👤: {}", content))
}
