//! Application services sitting between the HTTP handlers and the stores.

pub mod account;
pub mod conversation;
pub mod registry;
pub mod review;
pub mod turns;

pub use review::ReviewOrchestrator;
pub use turns::TurnLocks;
