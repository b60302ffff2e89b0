//! Network statistics and observability types.
//!
//! [`NetworkStats`] provides a point-in-time snapshot of the network state.
//! Obtain one via [`Network::stats`](crate::network::Network::stats).

use crate::{
    measure::{Cost, Percent},
    network::Tick,
    router::RouterId,
};

/// Snapshot of statistics for a single router.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterStats {
    /// The router's identifier.
    pub id: RouterId,
    /// Sum of the sizes of the packets waiting in the queue.
    pub queue_size: u64,
    /// Admission capacity of the queue.
    pub max_queue_size: u64,
    /// Number of packets waiting in the queue.
    pub queued_packets: usize,
    /// Whether a packet is currently in flight.
    pub transmitting: bool,
    /// Ticks since the router last advertised its routing table.
    pub time_since_broadcast: u64,
}

/// Snapshot of statistics for one direction of a link.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStats {
    /// The router owning the connection.
    pub from: RouterId,
    /// The neighbour on the other side.
    pub to: RouterId,
    /// Current routing cost of the connection.
    pub cost: Cost,
    /// Current effective throughput, per tick.
    pub throughput: f64,
    /// Degradation from forced failure.
    pub throughput_percent: Percent,
    /// Degradation from congestion backpressure.
    pub throttle_percent: Percent,
}

/// Point-in-time snapshot of the entire network state.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    /// The clock at the time of the snapshot.
    pub time: Tick,
    /// Per-router statistics, in id order.
    pub routers: Vec<RouterStats>,
    /// Per-connection statistics, grouped by owning router.
    pub connections: Vec<ConnectionStats>,
}

impl NetworkStats {
    /// Sum of the queue sizes of every router.
    pub fn total_queue_size(&self) -> u64 {
        self.routers.iter().map(|r| r.queue_size).sum()
    }

    /// Connections currently under congestion backpressure.
    pub fn throttled_connections(&self) -> impl Iterator<Item = &ConnectionStats> {
        self.connections
            .iter()
            .filter(|c| !c.throttle_percent.is_full())
    }
}
