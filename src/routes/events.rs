use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use crate::core::{EngineError, Matchmaker};
use crate::models::{
    ChatState, ErrorResponse, EventResponse, HealthResponse, MatchOutcome, Notification,
    ProfileResponse, RelayRequest, SearchResponse, SetGenderRequest, SetPreferenceRequest,
    UserEventRequest,
};
use crate::services::{notifier, TransportClient};

/// Application state shared across all handlers.
///
/// The engine sits behind a single lock; every handler performs its engine
/// call under the lock and releases it before any transport I/O, so engine
/// operations are serialized and never block on the network.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<Matchmaker>>,
    pub transport: Arc<TransportClient>,
}

/// Configure all event and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/profile/gender", web::post().to(set_gender))
        .route("/profile/preference", web::post().to(set_preference))
        .route("/events/search", web::post().to(search))
        .route("/events/cancel", web::post().to(cancel))
        .route("/events/end", web::post().to(end))
        .route("/events/swap", web::post().to(swap))
        .route("/events/reset", web::post().to(reset))
        .route("/events/relay", web::post().to(relay))
        .route("/events/unreachable", web::post().to(unreachable));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let engine = state.engine.lock().await;
    tracing::debug!(
        "Health check: {} waiting, {} active pairs",
        engine.waiting_count(),
        engine.active_pair_count()
    );

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Set a user's gender
///
/// POST /api/v1/profile/gender
async fn set_gender(
    state: web::Data<AppState>,
    req: web::Json<SetGenderRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let mut engine = state.engine.lock().await;
    engine.registry_mut().set_gender(&req.user_id, req.gender);
    let profile_state = engine
        .registry()
        .get(&req.user_id)
        .map(|p| p.state)
        .unwrap_or(ChatState::Idle);

    HttpResponse::Ok().json(ProfileResponse {
        user_id: req.user_id.clone(),
        state: profile_state,
    })
}

/// Set a user's partner preference
///
/// POST /api/v1/profile/preference
async fn set_preference(
    state: web::Data<AppState>,
    req: web::Json<SetPreferenceRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let mut engine = state.engine.lock().await;
    engine
        .registry_mut()
        .set_preference(&req.user_id, req.preferred_gender);
    let profile_state = engine
        .registry()
        .get(&req.user_id)
        .map(|p| p.state)
        .unwrap_or(ChatState::Idle);

    HttpResponse::Ok().json(ProfileResponse {
        user_id: req.user_id.clone(),
        state: profile_state,
    })
}

/// Deliver the "connected" notices to both sides of a fresh pairing.
///
/// If either side turns out to be unreachable the pairing is torn down again,
/// mirroring how a chat bot handles a blocked recipient at connect time.
async fn connect_pair(
    state: &AppState,
    user_id: &str,
    partner_id: &str,
) -> Result<Vec<Notification>, HttpResponse> {
    let notifications = notifier::connected_pair(user_id, partner_id);

    if let Err(e) = state.transport.deliver_all(&notifications).await {
        tracing::warn!(
            "Failed to connect {} and {}: {}",
            user_id,
            partner_id,
            e
        );
        let mut engine = state.engine.lock().await;
        engine.end_chat(user_id);
        return Err(HttpResponse::BadGateway().json(ErrorResponse {
            error: "partner_unreachable".to_string(),
            message: "Chat could not be established; both users were released".to_string(),
            status_code: 502,
        }));
    }

    Ok(notifications)
}

/// Search for a partner
///
/// POST /api/v1/events/search
async fn search(state: web::Data<AppState>, req: web::Json<UserEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.start_search(&req.user_id)
    };

    match outcome {
        Ok(MatchOutcome::Matched(partner_id)) => {
            let notifications = match connect_pair(&state, &req.user_id, &partner_id).await {
                Ok(n) => n,
                Err(response) => return response,
            };
            HttpResponse::Ok().json(SearchResponse {
                outcome: MatchOutcome::Matched(partner_id),
                notifications,
            })
        }
        Ok(MatchOutcome::Waiting) => {
            let notifications = vec![notifier::notify(&req.user_id, notifier::SEARCHING)];
            dispatch_best_effort(&state, &notifications).await;
            HttpResponse::Ok().json(SearchResponse {
                outcome: MatchOutcome::Waiting,
                notifications,
            })
        }
        Err(EngineError::AlreadyInChat(user_id)) => {
            tracing::debug!("Rejected re-entrant search from {}", user_id);
            HttpResponse::Conflict().json(ErrorResponse {
                error: "already_in_chat".to_string(),
                message: format!("User {} is already in an active chat", user_id),
                status_code: 409,
            })
        }
    }
}

/// Cancel an ongoing search
///
/// POST /api/v1/events/cancel
async fn cancel(state: web::Data<AppState>, req: web::Json<UserEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let (applied, profile_state) = {
        let mut engine = state.engine.lock().await;
        let applied = engine.cancel_search(&req.user_id);
        (applied, state_of(&engine, &req.user_id))
    };

    let notifications = if applied {
        vec![notifier::notify(&req.user_id, notifier::SEARCH_CANCELED)]
    } else {
        vec![]
    };
    dispatch_best_effort(&state, &notifications).await;

    HttpResponse::Ok().json(EventResponse {
        applied,
        state: profile_state,
        notifications,
    })
}

/// End the current chat
///
/// POST /api/v1/events/end
async fn end(state: web::Data<AppState>, req: web::Json<UserEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let (former_partner, profile_state) = {
        let mut engine = state.engine.lock().await;
        let former_partner = engine.end_chat(&req.user_id);
        (former_partner, state_of(&engine, &req.user_id))
    };

    let mut notifications = Vec::new();
    if let Some(partner_id) = &former_partner {
        notifications.push(notifier::notify(partner_id, notifier::CHAT_ENDED_BY_PARTNER));
        notifications.push(notifier::notify(&req.user_id, notifier::CHAT_ENDED));
    }
    dispatch_best_effort(&state, &notifications).await;

    HttpResponse::Ok().json(EventResponse {
        applied: former_partner.is_some(),
        state: profile_state,
        notifications,
    })
}

/// Leave the current chat and search again in one step
///
/// POST /api/v1/events/swap
async fn swap(state: web::Data<AppState>, req: web::Json<UserEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let swap = {
        let mut engine = state.engine.lock().await;
        engine.swap_partner(&req.user_id)
    };

    let mut notifications = Vec::new();
    if let Some(partner_id) = &swap.previous_partner {
        notifications.push(notifier::notify(partner_id, notifier::PARTNER_LEFT));
    }
    dispatch_best_effort(&state, &notifications).await;

    match swap.outcome {
        MatchOutcome::Matched(partner_id) => {
            match connect_pair(&state, &req.user_id, &partner_id).await {
                Ok(connected) => notifications.extend(connected),
                Err(response) => return response,
            }
            HttpResponse::Ok().json(SearchResponse {
                outcome: MatchOutcome::Matched(partner_id),
                notifications,
            })
        }
        MatchOutcome::Waiting => {
            let waiting = vec![notifier::notify(&req.user_id, notifier::SEARCHING)];
            dispatch_best_effort(&state, &waiting).await;
            notifications.extend(waiting);
            HttpResponse::Ok().json(SearchResponse {
                outcome: MatchOutcome::Waiting,
                notifications,
            })
        }
    }
}

/// Reset a user's session entirely (the "start over" command)
///
/// POST /api/v1/events/reset
async fn reset(state: web::Data<AppState>, req: web::Json<UserEventRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let reset = {
        let mut engine = state.engine.lock().await;
        engine.reset(&req.user_id)
    };

    let mut notifications = Vec::new();
    if let Some(partner_id) = &reset.notified_partner {
        notifications.push(notifier::notify(partner_id, notifier::PARTNER_DISCONNECTED));
    }
    dispatch_best_effort(&state, &notifications).await;

    HttpResponse::Ok().json(EventResponse {
        applied: reset.notified_partner.is_some() || reset.left_pool,
        state: ChatState::Idle,
        notifications,
    })
}

/// Relay a message to the caller's current partner
///
/// POST /api/v1/events/relay
async fn relay(state: web::Data<AppState>, req: web::Json<RelayRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let partner_id = {
        let engine = state.engine.lock().await;
        engine.partner_of(&req.user_id).map(str::to_string)
    };

    let Some(partner_id) = partner_id else {
        // A relay with no pairing means the caller's session is stale; put
        // them back to idle before answering.
        let mut engine = state.engine.lock().await;
        engine.reset(&req.user_id);
        drop(engine);

        let notifications = vec![notifier::notify(&req.user_id, notifier::NO_ACTIVE_PARTNER)];
        dispatch_best_effort(&state, &notifications).await;
        return HttpResponse::Ok().json(EventResponse {
            applied: false,
            state: ChatState::Idle,
            notifications,
        });
    };

    let notification = notifier::relay(&partner_id, &req.content);
    match state.transport.deliver(&notification).await {
        Ok(()) => HttpResponse::Ok().json(EventResponse {
            applied: true,
            state: ChatState::Chatting,
            notifications: vec![notification],
        }),
        Err(e) if e.is_unreachable() => {
            tracing::warn!("Relay to {} failed, ending chat: {}", partner_id, e);
            let mut engine = state.engine.lock().await;
            engine.end_chat(&req.user_id);
            drop(engine);

            let notifications =
                vec![notifier::notify(&req.user_id, notifier::PARTNER_UNAVAILABLE)];
            dispatch_best_effort(&state, &notifications).await;
            HttpResponse::Ok().json(EventResponse {
                applied: false,
                state: ChatState::Idle,
                notifications,
            })
        }
        Err(e) => {
            tracing::error!("Relay delivery failed transiently: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "delivery_failed".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}

/// Transport reports a user as gone (blocked the bot, deleted account)
///
/// POST /api/v1/events/unreachable
async fn unreachable(
    state: web::Data<AppState>,
    req: web::Json<UserEventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let reset = {
        let mut engine = state.engine.lock().await;
        engine.reset(&req.user_id)
    };

    let mut notifications = Vec::new();
    if let Some(partner_id) = &reset.notified_partner {
        notifications.push(notifier::notify(partner_id, notifier::PARTNER_UNAVAILABLE));
    }
    dispatch_best_effort(&state, &notifications).await;

    HttpResponse::Ok().json(EventResponse {
        applied: reset.notified_partner.is_some() || reset.left_pool,
        state: ChatState::Idle,
        notifications,
    })
}

fn state_of(engine: &Matchmaker, user_id: &str) -> ChatState {
    engine
        .registry()
        .get(user_id)
        .map(|p| p.state)
        .unwrap_or(ChatState::Idle)
}

/// Fire-and-forget delivery for notices where a failure must not fail the
/// event (a former partner who blocked the bot is simply not told).
async fn dispatch_best_effort(state: &AppState, notifications: &[Notification]) {
    for notification in notifications {
        if let Err(e) = state.transport.deliver(notification).await {
            tracing::warn!(
                "Failed to notify {}: {}",
                notification.recipient_id,
                e
            );
        }
    }
}
