//! Event relay between connected clients

pub mod hub;
pub mod registry;

pub use hub::RelayHub;
