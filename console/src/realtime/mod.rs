//! Real-time entity updates
//!
//! One shared socket per session. Views hold [`hub::RoomSubscription`]
//! guards for the ids they display; events arrive on a broadcast channel and
//! are treated as hints to merge, never as authoritative state.

pub mod hub;
pub mod room;
