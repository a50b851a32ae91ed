// Core engine exports
pub mod compat;
pub mod matchmaker;
pub mod pool;
pub mod registry;

pub use compat::mutually_compatible;
pub use matchmaker::{EngineError, Matchmaker};
pub use pool::WaitingPool;
pub use registry::Registry;
