//! Registry of live connection ids

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::ws::protocol::ConnectionId;

/// Bookkeeping kept for each live connection
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    pub connected_at: DateTime<Utc>,
}

/// Set of connections currently open. Relay logic only writes to it.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, id: ConnectionId) {
        self.connections.insert(
            id,
            ConnectionRecord {
                connected_at: Utc::now(),
            },
        );
    }

    /// Remove an id, returning its record if it was present
    pub fn remove(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.connections.remove(id).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn clear(&self) {
        self.connections.clear();
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let id = Uuid::new_v4();

        registry.insert(id);
        assert_eq!(registry.len(), 1);

        let record = registry.remove(&id).unwrap();
        assert!(record.connected_at <= Utc::now());
        assert!(registry.remove(&id).is_none());
        assert_eq!(registry.len(), 0);
    }
}
