//! Focused manager types extracted from the engine facade so each owns one
//! concern: `BroadcastChannelManager` owns tokio broadcast channel
//! lifecycle for the three outbound subscriptions.

pub mod broadcast_manager;

pub use broadcast_manager::{BarChangeEvent, BroadcastChannelManager, StateEvent};
