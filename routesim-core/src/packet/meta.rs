use super::PacketId;
use crate::{
    measure::{Cost, Percent},
    router::RouterId,
    routing_table::RoutingTable,
};
use std::fmt;

/// Routing control information carried by a [`Packet`].
///
/// [`Packet`]: super::Packet
#[derive(Debug, Clone, PartialEq)]
pub enum MetaPayload {
    /// ask the destination for its route toward `router`.
    ///
    /// Crafted by [`Packet::routing_info`] but not consumed by routers.
    ///
    /// [`Packet::routing_info`]: super::Packet::routing_info
    RoutingRequest { router: RouterId },
    /// answer to a [`MetaPayload::RoutingRequest`].
    ///
    /// Crafted by [`Packet::routing_info`] but not consumed by routers.
    ///
    /// [`Packet::routing_info`]: super::Packet::routing_info
    RoutingResponse { router: RouterId, cost: Cost },
    /// snapshot of the sender's routing table, sent to every direct
    /// neighbour.
    Broadcast { table: RoutingTable },
    /// records the routers a packet transits through and the cost of
    /// the path so far.
    Trace(Trace),
    /// asks the destination to throttle its connection back to the
    /// sender by `factor`.
    Throttle { factor: Percent },
}

/// Discriminant of a [`MetaPayload`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    RoutingInfo,
    Broadcast,
    Trace,
    Throttle,
}

/// The path accumulated by a [`MetaPayload::Trace`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    visited: Vec<RouterId>,
    cost: Cost,
}

/// The outcome of a trace packet that reached its destination.
///
/// `visited` lists every router that transmitted the packet, starting
/// with its source, followed by the destination itself; `cost` is the
/// sum of the costs of the connections it was transmitted on, as they
/// were when it left each router.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceReport {
    pub packet: PacketId,
    pub source: RouterId,
    pub destination: RouterId,
    pub visited: Vec<RouterId>,
    pub cost: Cost,
}

impl MetaPayload {
    pub fn kind(&self) -> MetaKind {
        match self {
            Self::RoutingRequest { .. } | Self::RoutingResponse { .. } => MetaKind::RoutingInfo,
            Self::Broadcast { .. } => MetaKind::Broadcast,
            Self::Trace(_) => MetaKind::Trace,
            Self::Throttle { .. } => MetaKind::Throttle,
        }
    }

    /// `true` if every router on the way must process this payload,
    /// `false` if only the destination does.
    pub fn requires_inspection(&self) -> bool {
        matches!(self, Self::Trace(_))
    }
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> &[RouterId] {
        &self.visited
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub(crate) fn visit(&mut self, router: RouterId) {
        self.visited.push(router);
    }

    pub(crate) fn add_cost(&mut self, cost: Cost) {
        self.cost = self.cost + cost;
    }

    pub(crate) fn into_report(
        self,
        packet: PacketId,
        source: RouterId,
        destination: RouterId,
    ) -> TraceReport {
        TraceReport {
            packet,
            source,
            destination,
            visited: self.visited,
            cost: self.cost,
        }
    }
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoutingInfo => f.write_str("routing-info"),
            Self::Broadcast => f.write_str("broadcast"),
            Self::Trace => f.write_str("trace"),
            Self::Throttle => f.write_str("throttle"),
        }
    }
}
