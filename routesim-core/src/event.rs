//! What the simulation reports to its caller.

use crate::{
    packet::{Packet, TraceReport},
    router::RouterId,
};
use std::fmt;

/// Observable outcome of a router's work.
///
/// Control packets (broadcasts, throttles) are consumed by the routers
/// and are not reported; data packets are handed back once they reach
/// their destination or are dropped on the way.
#[derive(Debug)]
pub enum Event<T> {
    /// a packet without [`MetaPayload`] reached its destination
    ///
    /// [`MetaPayload`]: crate::packet::MetaPayload
    Delivered { router: RouterId, packet: Packet<T> },
    /// a trace packet reached its destination
    TraceCompleted(TraceReport),
    /// a packet was discarded by `router`
    Dropped {
        router: RouterId,
        packet: Packet<T>,
        reason: DropReason,
    },
}

/// Why a packet was dropped. None of these stop the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// the routing table has no next hop for the destination
    Unroutable,
    /// admitting the packet would exceed the router's queue capacity
    QueueFull,
    /// the next hop is not a direct neighbour of the router
    NoConnection,
}

impl<T> Event<T> {
    /// the trace report, if this event completes a trace
    pub fn as_trace(&self) -> Option<&TraceReport> {
        match self {
            Self::TraceCompleted(report) => Some(report),
            _ => None,
        }
    }

    /// the drop reason, if this event is a drop
    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Self::Dropped { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unroutable => f.write_str("no route found"),
            Self::QueueFull => f.write_str("queue size exceeded"),
            Self::NoConnection => f.write_str("no connection to next hop"),
        }
    }
}
