//! Pairmatch - pairing service for anonymous one-to-one chat
//!
//! This library implements the matchmaking engine behind an anonymous chat
//! service: it tracks searching users in a FIFO pool, forms mutually
//! exclusive pairs, and releases them cleanly on disconnect or explicit
//! termination.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matchmaker, EngineError, Registry, WaitingPool, mutually_compatible};
pub use crate::models::{UserProfile, Gender, PreferredGender, ChatState, MatchOutcome, SwapOutcome, ResetOutcome};
