// Service exports
pub mod notifier;
pub mod transport;

pub use transport::{TransportClient, TransportError};
