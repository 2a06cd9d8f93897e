//! Relay hub - peer handles and event fan-out

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::util::time::unix_millis;
use crate::ws::protocol::{
    ClientEvent, ConnectionId, Outbound, PlayerJoined, ServerEvent, Welcome,
};

use super::registry::ConnectionRegistry;

/// Handle used to push framed messages to one connection's writer
#[derive(Debug, Clone)]
pub struct PeerHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl PeerHandle {
    /// Queue a message without waiting. Only a closed writer drops it.
    fn push(&self, id: &ConnectionId, msg: Outbound) -> bool {
        if self.tx.send(msg).is_err() {
            debug!(connection_id = %id, "Outbound queue closed, dropping message");
            return false;
        }
        true
    }
}

/// Fans client events out to every other connected client
pub struct RelayHub {
    peers: DashMap<ConnectionId, PeerHandle>,
    registry: ConnectionRegistry,
}

impl RelayHub {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Register a new connection and return the receiving end of its outbound queue.
    /// The queue starts with a `connected` message addressed to the new client.
    pub fn connect(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        let peer = PeerHandle { tx };

        peer.push(
            &id,
            Outbound::system(ServerEvent::Connected(Welcome {
                id,
                server_time: unix_millis(),
            })),
        );

        self.registry.insert(id);
        self.peers.insert(id, peer);

        info!(connection_id = %id, peers = self.peer_count(), "Client connected");
        rx
    }

    /// Handle one decoded event from `from`. Returns the number of peers targeted.
    pub fn dispatch(&self, from: ConnectionId, event: ClientEvent) -> usize {
        let relayed = match event {
            ClientEvent::Join(payload) => ServerEvent::PlayerJoined(PlayerJoined {
                id: from,
                position: payload.position,
                team: payload.team,
            }),
            ClientEvent::TankMove(data) => ServerEvent::TankMove(data),
            ClientEvent::TankFire(data) => ServerEvent::TankFire(data),
            ClientEvent::TankDestroyed(data) => ServerEvent::TankDestroyed(data),
            ClientEvent::BombPlanted(data) => ServerEvent::BombPlanted(data),
            ClientEvent::BombDefused(data) => ServerEvent::BombDefused(data),
            ClientEvent::BombExploded(data) => ServerEvent::BombExploded(data),
            ClientEvent::Unknown { event } => {
                warn!(connection_id = %from, event = %event, "Ignoring unknown event");
                return 0;
            }
        };

        self.broadcast(Some(from), Outbound::relayed(from, relayed))
    }

    /// Drop a connection and tell everyone left. A second call for the same id does nothing.
    pub fn disconnect(&self, id: ConnectionId) -> usize {
        let record = self.registry.remove(&id);

        if self.peers.remove(&id).is_none() {
            return 0;
        }

        let connected_secs = record
            .map(|r| (Utc::now() - r.connected_at).num_seconds())
            .unwrap_or(0);
        info!(
            connection_id = %id,
            connected_secs,
            peers = self.peer_count(),
            "Client disconnected"
        );
        self.broadcast(None, Outbound::system(ServerEvent::PlayerLeft(id)))
    }

    /// Push `msg` to every peer except `except`. Returns the number of peers targeted.
    pub fn broadcast(&self, except: Option<ConnectionId>, msg: Outbound) -> usize {
        let mut targeted = 0;

        for entry in self.peers.iter() {
            if Some(*entry.key()) == except {
                continue;
            }
            targeted += 1;
            entry.value().push(entry.key(), msg.clone());
        }

        targeted
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn registered_connections(&self) -> usize {
        self.registry.len()
    }

    /// Forget every connection, closing all outbound queues
    pub fn shutdown(&self) {
        let open = self.peers.len();
        self.peers.clear();
        self.registry.clear();
        info!(closed = open, "Relay hub cleared");
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}
