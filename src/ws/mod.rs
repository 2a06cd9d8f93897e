//! WebSocket transport for the event relay

pub mod handler;
pub mod protocol;
