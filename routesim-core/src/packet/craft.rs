use super::{MetaPayload, Packet, PacketIdGenerator, Trace};
use crate::{
    measure::{Cost, Percent},
    router::RouterId,
    routing_table::RoutingTable,
};
use thiserror::Error;

/// size of a bare routing information packet
pub const ROUTING_INFO_SIZE: u64 = 2;

/// size of a routing table broadcast
pub const BROADCAST_SIZE: u64 = ROUTING_INFO_SIZE + 1;

/// size of a trace packet
pub const TRACE_SIZE: u64 = ROUTING_INFO_SIZE + 2;

/// size of a throttle packet
pub const THROTTLE_SIZE: u64 = ROUTING_INFO_SIZE + 1;

/// Error returned when a control packet cannot be crafted.
#[derive(Debug, Error)]
pub enum CraftError {
    /// A routing response must carry the cost of the path it answers
    /// for.
    #[error("Cannot craft a routing response about {router}: no path cost provided")]
    MissingPathCost { router: RouterId },
}

impl<T> Packet<T> {
    /// Craft a routing information request (`is_response == false`) or
    /// response about `router`.
    ///
    /// # Errors
    ///
    /// [`CraftError::MissingPathCost`] if a response is requested
    /// without a `path_cost`.
    ///
    /// ```
    /// # use routesim_core::{packet::{Packet, PacketIdGenerator, CraftError}, router::RouterId};
    /// let ids = PacketIdGenerator::new();
    /// let (a, b, c) = (RouterId::new(0), RouterId::new(1), RouterId::new(2));
    ///
    /// let request = Packet::<()>::routing_info(&ids, a, b, c, false, None);
    /// assert!(request.is_ok());
    ///
    /// let response = Packet::<()>::routing_info(&ids, b, a, c, true, None);
    /// assert!(matches!(response, Err(CraftError::MissingPathCost { .. })));
    /// ```
    pub fn routing_info(
        generator: &PacketIdGenerator,
        source: RouterId,
        destination: RouterId,
        router: RouterId,
        is_response: bool,
        path_cost: Option<Cost>,
    ) -> Result<Self, CraftError> {
        let meta = if is_response {
            let Some(cost) = path_cost else {
                return Err(CraftError::MissingPathCost { router });
            };
            MetaPayload::RoutingResponse { router, cost }
        } else {
            MetaPayload::RoutingRequest { router }
        };

        Ok(Self::control(
            generator,
            source,
            destination,
            ROUTING_INFO_SIZE,
            meta,
            is_response,
        ))
    }

    /// Craft the broadcast of `table` from `source` to its direct
    /// neighbour `destination`.
    pub fn routing_broadcast(
        generator: &PacketIdGenerator,
        source: RouterId,
        destination: RouterId,
        table: RoutingTable,
    ) -> Self {
        Self::control(
            generator,
            source,
            destination,
            BROADCAST_SIZE,
            MetaPayload::Broadcast { table },
            true,
        )
    }

    /// Craft an empty trace packet from `source` to `destination`.
    pub fn routing_trace(
        generator: &PacketIdGenerator,
        source: RouterId,
        destination: RouterId,
    ) -> Self {
        Self::control(
            generator,
            source,
            destination,
            TRACE_SIZE,
            MetaPayload::Trace(Trace::new()),
            true,
        )
    }

    /// Craft a throttle packet asking `destination` to scale its
    /// connection to `source` by `factor`.
    pub fn routing_throttle(
        generator: &PacketIdGenerator,
        source: RouterId,
        destination: RouterId,
        factor: Percent,
    ) -> Self {
        Self::control(
            generator,
            source,
            destination,
            THROTTLE_SIZE,
            MetaPayload::Throttle { factor },
            true,
        )
    }
}
