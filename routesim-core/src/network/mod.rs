mod tick;

use crate::{
    SimConfiguration,
    connection::ConnectionError,
    defaults::DEFAULT_LINK_BANDWIDTH,
    event::Event,
    measure::FailureRate,
    packet::{Packet, PacketIdGenerator},
    router::{Context, Delivery, Router, RouterId},
    stats::{ConnectionStats, NetworkStats, RouterStats},
};
use rand_chacha::ChaChaRng;
use rand_core::{Rng as _, SeedableRng as _};
use thiserror::Error;
use tracing::{debug, trace};

pub use self::tick::Tick;

/// This is the entry point for all activities with [`routesim_core`].
///
/// The [`Network`] owns every [`Router`] of the simulation, addressed by
/// [`RouterId`], and drives the single global clock: each call to
/// [`Network::tick_with`] advances every router by one [`Tick`], in a
/// deterministic and configurable order.
///
/// Routers never hold references to each other. Whatever a router sends
/// is handed by the network to the recipient before the next router is
/// ticked, depth first, so a packet forwarded by a router earlier in the
/// tick order is seen by a router later in the order within the same
/// tick.
///
/// # Example
///
/// ```
/// use routesim_core::{network::Network, packet::Packet, router::RouterId};
///
/// let (a, b, c) = (RouterId::new(0), RouterId::new(1), RouterId::new(2));
///
/// let mut network: Network<()> = Network::new(3);
/// network.configure_link(a, b).set_bandwidth(10.0).apply().unwrap();
/// network.configure_link(b, c).set_bandwidth(10.0).apply().unwrap();
///
/// // let the routing tables converge
/// network.run_with(30, |_| {});
///
/// let trace = Packet::routing_trace(network.packet_id_generator(), a, c);
/// network.send(trace).unwrap();
///
/// let mut reports = Vec::new();
/// network.run_with(10, |event| {
///     if let Some(report) = event.as_trace() {
///         reports.push(report.clone());
///     }
/// });
///
/// assert_eq!(reports[0].visited, vec![a, b, c]);
/// assert_eq!(reports[0].cost.to_string(), "20");
/// ```
///
/// [`routesim_core`]: crate
pub struct Network<T> {
    packet_id_generator: PacketIdGenerator,

    configuration: SimConfiguration,

    routers: Vec<Router<T>>,

    /// order in which routers are ticked, a permutation of the ids
    tick_order: Vec<RouterId>,

    time: Tick,

    /// events raised outside of a tick, handed over at the start of the
    /// next one
    pending_events: Vec<Event<T>>,

    /// Centralised RNG for desynchronized ticking and the connection
    /// success sampler.
    ///
    /// A single source guarantees that the simulation is reproducible when
    /// seeded via [`Network::set_seed`].
    rng: ChaChaRng,
}

/// Builder for configuring a router of the network.
///
/// Obtained via [`Network::configure_router`]. Call
/// [`RouterBuilder::apply`] to commit the configuration.
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | Max queue size | [`SimConfiguration::default_max_queue_size`] |
pub struct RouterBuilder<'a, T> {
    id: RouterId,
    max_queue_size: Option<u64>,
    network: &'a mut Network<T>,
}

/// Builder for configuring a link between two routers.
///
/// Obtained via [`Network::configure_link`]. Call [`LinkBuilder::apply`] to
/// commit the configuration.
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | Bandwidth | [`DEFAULT_LINK_BANDWIDTH`] |
/// | Failure rate | [`FailureRate::NONE`] |
pub struct LinkBuilder<'a, T> {
    a: RouterId,
    b: RouterId,
    bandwidth: f64,
    failure_rate: FailureRate,
    network: &'a mut Network<T>,
}

/// Error returned when an operation names a router the network does not
/// have.
#[derive(Debug, Error)]
#[error("Router ({router}) Not Found")]
pub struct RouterNotFound {
    pub router: RouterId,
}

/// Error returned when [`Network::send`] or [`Network::queue_packet_at`]
/// fails.
#[derive(Debug, Error)]
pub enum SendError {
    /// The router the packet is handed to was not found in the network.
    #[error("{0}")]
    Router(#[from] RouterNotFound),
    /// The sending router was not found in the network.
    #[error("Sender ({sender}) Not Found")]
    SenderNotFound { sender: RouterId },
    /// The destination of the packet was not found in the network.
    #[error("Recipient ({recipient}) Not Found")]
    RecipientNotFound { recipient: RouterId },
}

/// Error returned when [`Network::set_tick_order`] is not given a
/// permutation of the routers of the network.
#[derive(Debug, Error)]
pub enum TickOrderError {
    #[error("Tick order has {len} entries, the network has {num_routers} routers")]
    Length { len: usize, num_routers: usize },
    #[error("Router ({router}) Not Found in the network")]
    UnknownRouter { router: RouterId },
    #[error("Router ({router}) appears more than once in the tick order")]
    Duplicate { router: RouterId },
}

impl<T> RouterBuilder<'_, T> {
    /// Set the admission capacity of the router's queue.
    ///
    /// A packet is admitted only if the queue size after admission stays
    /// strictly below this value. Packets addressed to the router itself
    /// are never queued and are not subject to it.
    pub fn set_max_queue_size(mut self, max_queue_size: u64) -> Self {
        self.max_queue_size = Some(max_queue_size);
        self
    }

    /// Commit the router configuration to the network.
    ///
    /// # Errors
    ///
    /// [`RouterNotFound`] if the router is not part of the network.
    pub fn apply(self) -> Result<(), RouterNotFound> {
        let Self {
            id,
            max_queue_size,
            network,
        } = self;

        let router = network.router_mut(id)?;
        if let Some(max_queue_size) = max_queue_size {
            router.set_max_queue_size(max_queue_size);
        }
        Ok(())
    }
}

impl<T> LinkBuilder<'_, T> {
    /// Set the base throughput of this link.
    ///
    /// The same base throughput applies to both directions, each
    /// direction then degrades independently.
    pub fn set_bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Set the failure rate of both directions of this link.
    pub fn set_failure_rate(mut self, failure_rate: FailureRate) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    /// Commit the link configuration to the network, creating the
    /// connections `a -> b` and `b -> a`.
    ///
    /// If the routers are already linked the connections are replaced.
    ///
    /// # Errors
    ///
    /// See [`ConnectionError`]. Nothing is changed on error.
    pub fn apply(self) -> Result<(), ConnectionError> {
        let Self {
            a,
            b,
            bandwidth,
            failure_rate,
            network,
        } = self;

        let num_routers = network.routers.len();
        if a == b {
            return Err(ConnectionError::SelfConnection { router: a });
        }
        for router in [a, b] {
            if router.index() >= num_routers {
                return Err(ConnectionError::UnknownRouter {
                    router,
                    num_routers,
                });
            }
        }

        network.routers[a.index()].create_connection(b, bandwidth, failure_rate)?;
        network.routers[b.index()].create_connection(a, bandwidth, failure_rate)?;
        Ok(())
    }
}

impl<T> Network<T> {
    /// Create a network of `num_routers` unconnected routers with the
    /// default [`SimConfiguration`].
    ///
    /// Routers are identified from `RouterId::new(0)` to
    /// `RouterId::new(num_routers - 1)`. Connect them with
    /// [`configure_link`](Network::configure_link).
    pub fn new(num_routers: usize) -> Self {
        Self::with_configuration(num_routers, SimConfiguration::default())
    }

    /// Create a network of `num_routers` unconnected routers.
    ///
    /// # Example
    ///
    /// ```
    /// use routesim_core::{network::Network, SimConfiguration};
    ///
    /// let configuration = SimConfiguration {
    ///     broadcast_interval: 5,
    ///     ..SimConfiguration::default()
    /// };
    /// let network: Network<()> = Network::with_configuration(16, configuration);
    /// assert_eq!(network.num_routers(), 16);
    /// ```
    pub fn with_configuration(num_routers: usize, configuration: SimConfiguration) -> Self {
        let mut routers = Vec::with_capacity(num_routers);
        let mut id = RouterId::ZERO;
        for _ in 0..num_routers {
            let mut router = Router::new(id, num_routers);
            router.set_max_queue_size(configuration.default_max_queue_size);
            routers.push(router);
            id = id.next();
        }
        let tick_order = routers.iter().map(Router::id).collect();

        Self {
            packet_id_generator: PacketIdGenerator::new(),
            configuration,
            routers,
            tick_order,
            time: Tick::ZERO,
            pending_events: Vec::new(),
            rng: ChaChaRng::seed_from_u64(0),
        }
    }

    /// Re-seed the network's random-number generator.
    ///
    /// Desynchronized ticking and the connection success sampler draw
    /// from a single, centralised [`ChaChaRng`]. The default seed is `0`.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaChaRng::seed_from_u64(seed);
    }

    /// Returns the shared [`PacketIdGenerator`] for this network.
    ///
    /// Pass this to [`Packet::builder`] or the control packet crafters
    /// when constructing packets to [`send`](Network::send).
    pub fn packet_id_generator(&self) -> &PacketIdGenerator {
        &self.packet_id_generator
    }

    pub fn configuration(&self) -> &SimConfiguration {
        &self.configuration
    }

    /// the current value of the clock, i.e. the number of ticks run
    pub fn time(&self) -> Tick {
        self.time
    }

    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    pub fn router(&self, id: RouterId) -> Option<&Router<T>> {
        self.routers.get(id.index())
    }

    pub fn routers(&self) -> &[Router<T>] {
        &self.routers
    }

    pub fn tick_order(&self) -> &[RouterId] {
        &self.tick_order
    }

    fn router_mut(&mut self, id: RouterId) -> Result<&mut Router<T>, RouterNotFound> {
        self.routers
            .get_mut(id.index())
            .ok_or(RouterNotFound { router: id })
    }

    /// Configure a router of the network.
    ///
    /// ```
    /// # use routesim_core::{network::Network, router::RouterId};
    /// let mut network: Network<()> = Network::new(2);
    /// network
    ///     .configure_router(RouterId::new(1))
    ///     .set_max_queue_size(200)
    ///     .apply()
    ///     .unwrap();
    /// # assert_eq!(network.router(RouterId::new(1)).unwrap().max_queue_size(), 200);
    /// ```
    pub fn configure_router(&mut self, id: RouterId) -> RouterBuilder<'_, T> {
        RouterBuilder {
            id,
            max_queue_size: None,
            network: self,
        }
    }

    /// Configure the link between two routers.
    ///
    /// Returns a [`LinkBuilder`] that allows setting the bandwidth and the
    /// failure rate. Call [`.apply()`](LinkBuilder::apply) to commit.
    pub fn configure_link(&mut self, a: RouterId, b: RouterId) -> LinkBuilder<'_, T> {
        LinkBuilder {
            a,
            b,
            bandwidth: DEFAULT_LINK_BANDWIDTH,
            failure_rate: FailureRate::NONE,
            network: self,
        }
    }

    /// Set the order in which routers are ticked.
    ///
    /// # Errors
    ///
    /// [`TickOrderError`] if `order` is not a permutation of the routers
    /// of the network. The order is unchanged on error.
    pub fn set_tick_order<I>(&mut self, order: I) -> Result<(), TickOrderError>
    where
        I: IntoIterator<Item = RouterId>,
    {
        let order: Vec<RouterId> = order.into_iter().collect();
        let num_routers = self.routers.len();

        if order.len() != num_routers {
            return Err(TickOrderError::Length {
                len: order.len(),
                num_routers,
            });
        }

        let mut seen = vec![false; num_routers];
        for &router in &order {
            let Some(slot) = seen.get_mut(router.index()) else {
                return Err(TickOrderError::UnknownRouter { router });
            };
            if *slot {
                return Err(TickOrderError::Duplicate { router });
            }
            *slot = true;
        }

        self.tick_order = order;
        Ok(())
    }

    /// Hand `packet` to its source router, as if the source sent it to
    /// itself.
    ///
    /// # Errors
    ///
    /// See [`Network::queue_packet_at`].
    pub fn send(&mut self, packet: Packet<T>) -> Result<(), SendError> {
        let source = packet.source();
        self.queue_packet_at(source, packet, source)
    }

    /// Hand `packet` to `router`, as if `sender` had just transmitted it.
    ///
    /// The router admits, drops or consumes the packet immediately. Any
    /// event this raises is handed over at the start of the next tick.
    ///
    /// # Errors
    ///
    /// - [`SendError::Router`] if `router` does not exist in the network.
    /// - [`SendError::SenderNotFound`] if `sender` does not exist.
    /// - [`SendError::RecipientNotFound`] if the destination of the packet
    ///   does not exist.
    pub fn queue_packet_at(
        &mut self,
        router: RouterId,
        packet: Packet<T>,
        sender: RouterId,
    ) -> Result<(), SendError> {
        if sender.index() >= self.routers.len() {
            return Err(SendError::SenderNotFound { sender });
        }
        let recipient = packet.destination();
        if recipient.index() >= self.routers.len() {
            return Err(SendError::RecipientNotFound { recipient });
        }

        let mut events = Vec::new();
        self.dispatch(
            vec![Delivery {
                to: router,
                sender,
                packet,
            }],
            &mut |event| events.push(event),
        )?;
        self.pending_events.extend(events);

        Ok(())
    }

    /// Advance every router by one tick, in the configured tick order.
    ///
    /// The provided `handle` closure is called once for each [`Event`]
    /// raised since the last tick, including the ones raised by
    /// [`send`](Network::send).
    pub fn tick_with<H>(&mut self, mut handle: H)
    where
        H: FnMut(Event<T>),
    {
        self.flush_pending_events(&mut handle);

        for position in 0..self.tick_order.len() {
            let id = self.tick_order[position];
            self.tick_router(id, &mut handle);
        }

        self.time = self.time.next();
    }

    /// Like [`tick_with`](Network::tick_with), but each router is only
    /// ticked with probability `tick_probability`.
    ///
    /// A skipped router does not notice the tick at all, as if its clock
    /// was running slower. The decisions are drawn from the network's
    /// RNG, see [`Network::set_seed`].
    pub fn tick_desynchronized_with<H>(&mut self, tick_probability: f64, mut handle: H)
    where
        H: FnMut(Event<T>),
    {
        self.flush_pending_events(&mut handle);

        for position in 0..self.tick_order.len() {
            let id = self.tick_order[position];
            if self.sample_unit() < tick_probability {
                self.tick_router(id, &mut handle);
            } else {
                trace!(router = %id, time = %self.time, "skipping tick");
            }
        }

        self.time = self.time.next();
    }

    /// Run `ticks` consecutive [`tick_with`](Network::tick_with).
    pub fn run_with<H>(&mut self, ticks: u64, mut handle: H)
    where
        H: FnMut(Event<T>),
    {
        for _ in 0..ticks {
            self.tick_with(&mut handle);
        }
    }

    /// Degrade every connection of the router, see
    /// [`Router::force_router_failure`].
    ///
    /// # Errors
    ///
    /// [`RouterNotFound`] if the router is not part of the network.
    pub fn force_router_failure(&mut self, id: RouterId) -> Result<(), RouterNotFound> {
        let router = self
            .routers
            .get_mut(id.index())
            .ok_or(RouterNotFound { router: id })?;
        router.force_router_failure(&self.configuration);
        Ok(())
    }

    /// Restore every connection of the router, see
    /// [`Router::force_full_throughput`].
    ///
    /// # Errors
    ///
    /// [`RouterNotFound`] if the router is not part of the network.
    pub fn force_full_throughput(&mut self, id: RouterId) -> Result<(), RouterNotFound> {
        self.router_mut(id)?.force_full_throughput();
        Ok(())
    }

    /// Sample the success of a transmission from `router` to its direct
    /// neighbour `neighbour`, using the network's RNG.
    ///
    /// The routers themselves never sample: transmissions always succeed
    /// once scheduled. Returns `None` if there is no such connection.
    pub fn sample_connection_success(
        &mut self,
        router: RouterId,
        neighbour: RouterId,
    ) -> Option<bool> {
        let connection = self.routers.get(router.index())?.connection_to(neighbour)?;
        Some(connection.connection_success(&mut self.rng))
    }

    /// Returns a point-in-time snapshot of the network state.
    pub fn stats(&self) -> NetworkStats {
        let routers = self
            .routers
            .iter()
            .map(|router| RouterStats {
                id: router.id(),
                queue_size: router.queue_size(),
                max_queue_size: router.max_queue_size(),
                queued_packets: router.queued_packets().len(),
                transmitting: !router.transmission().is_idle(),
                time_since_broadcast: router.time_since_broadcast(),
            })
            .collect();

        let connections = self
            .routers
            .iter()
            .flat_map(|router| {
                router
                    .connections()
                    .iter()
                    .map(move |connection| ConnectionStats {
                        from: router.id(),
                        to: connection.other(),
                        cost: connection.cost(),
                        throughput: connection.throughput(),
                        throughput_percent: connection.throughput_percent(),
                        throttle_percent: connection.throttle_percent(),
                    })
            })
            .collect();

        NetworkStats {
            time: self.time,
            routers,
            connections,
        }
    }

    fn flush_pending_events<H>(&mut self, handle: &mut H)
    where
        H: FnMut(Event<T>),
    {
        for event in std::mem::take(&mut self.pending_events) {
            handle(event);
        }
    }

    fn tick_router<H>(&mut self, id: RouterId, handle: &mut H)
    where
        H: FnMut(Event<T>),
    {
        let Some(router) = self.routers.get_mut(id.index()) else {
            return;
        };

        let mut ctx = Context::new(&self.configuration, &self.packet_id_generator);
        router.time_tick(self.time, &mut ctx);
        let (deliveries, events) = ctx.into_parts();

        for event in events {
            handle(event);
        }
        if let Err(error) = self.dispatch(deliveries, handle) {
            debug!(router = %id, %error, "delivery to unknown router");
        }
    }

    /// Hand every delivery to its recipient, depth first: the packets a
    /// recipient sends in response are delivered before the next
    /// delivery of the list.
    ///
    /// Stops at the first delivery to an unknown router.
    fn dispatch<H>(&mut self, deliveries: Vec<Delivery<T>>, handle: &mut H) -> Result<(), RouterNotFound>
    where
        H: FnMut(Event<T>),
    {
        let mut pending: Vec<Delivery<T>> = deliveries.into_iter().rev().collect();

        while let Some(Delivery { to, sender, packet }) = pending.pop() {
            let router = self
                .routers
                .get_mut(to.index())
                .ok_or(RouterNotFound { router: to })?;

            let mut ctx = Context::new(&self.configuration, &self.packet_id_generator);
            router.queue_packet(packet, sender, &mut ctx);
            let (deliveries, events) = ctx.into_parts();

            for event in events {
                handle(event);
            }
            pending.extend(deliveries.into_iter().rev());
        }

        Ok(())
    }

    /// uniform sample in `[0, 1)`
    fn sample_unit(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::DropReason,
        measure::{Cost, Percent},
        packet::TraceReport,
    };

    const A: RouterId = RouterId::new(0);
    const B: RouterId = RouterId::new(1);
    const C: RouterId = RouterId::new(2);

    // ------------------------------------------------------------------
    // 1. Convergence
    // ------------------------------------------------------------------

    #[test]
    fn line_converges() {
        let mut net = line_network();
        net.run_with(30, |_| {});

        let a = net.router(A).unwrap();
        assert_eq!(a.distance_to(B), Cost::new(10.0));
        assert_eq!(a.distance_to(C), Cost::new(20.0));
        assert_eq!(a.routing_table().next_hop(C), Some(B));

        let c = net.router(C).unwrap();
        assert_eq!(c.distance_to(A), Cost::new(20.0));
        assert_eq!(c.routing_table().next_hop(A), Some(B));
    }

    #[test]
    fn routes_with_next_hop_are_finite() {
        let mut net = line_network();
        net.run_with(30, |_| {});

        for router in net.routers() {
            for entry in router.routing_table().iter() {
                if entry.next_hop.is_some() {
                    assert!(entry.cost.is_finite(), "{} -> {}", router.id(), entry.destination);
                }
            }
        }
    }

    #[test]
    fn partition_stays_unreachable() {
        let mut net: Network<()> = Network::new(3);
        net.configure_link(A, B).apply().unwrap();
        net.run_with(30, |_| {});

        let a = net.router(A).unwrap();
        assert!(!a.does_route_exist(C));
        assert_eq!(a.distance_to(C), Cost::INFINITE);
    }

    // ------------------------------------------------------------------
    // 2. Traces and data
    // ------------------------------------------------------------------

    #[test]
    fn trace_records_path_and_cost() {
        let mut net = converged_line();
        let trace = Packet::routing_trace(net.packet_id_generator(), A, C);
        net.send(trace).unwrap();

        let reports = run_collecting_traces(&mut net, 10);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source, A);
        assert_eq!(reports[0].destination, C);
        assert_eq!(reports[0].visited, vec![A, B, C]);
        assert_eq!(reports[0].cost, Cost::new(20.0));
    }

    #[test]
    fn data_packet_is_delivered() {
        let mut net = converged_line();
        let packet = Packet::builder(net.packet_id_generator())
            .from(A)
            .to(C)
            .size(5)
            .payload("hello")
            .build()
            .unwrap();
        let id = packet.id();
        net.send(packet).unwrap();

        let mut delivered = Vec::new();
        net.run_with(10, |event| {
            if let Event::Delivered { router, packet } = event {
                delivered.push((router, packet.id(), packet.into_payload()));
            }
        });

        assert_eq!(delivered, vec![(C, id, Some("hello"))]);
    }

    #[test]
    fn local_delivery_bypasses_queue() {
        let mut net = converged_line();
        net.configure_router(B).set_max_queue_size(1).apply().unwrap();

        let packet = data(&net, A, B, 50);
        net.queue_packet_at(B, packet, A).unwrap();
        assert_eq!(net.router(B).unwrap().queue_size(), 0);

        let mut delivered = 0;
        net.tick_with(|event| {
            if matches!(event, Event::Delivered { router: B, .. }) {
                delivered += 1;
            }
        });
        assert_eq!(delivered, 1);
    }

    #[test]
    fn unroutable_packet_is_dropped() {
        let mut net: Network<&str> = Network::new(3);
        let packet = data(&net, A, C, 5);
        net.send(packet).unwrap();
        assert_eq!(net.router(A).unwrap().queue_size(), 5);

        let drops = run_collecting_drops(&mut net, 1);

        assert_eq!(drops, vec![(A, DropReason::Unroutable)]);
        assert_eq!(net.router(A).unwrap().queue_size(), 0);
    }

    // ------------------------------------------------------------------
    // 3. Congestion
    // ------------------------------------------------------------------

    #[test]
    fn queue_overflow_throttles_sender() {
        let mut net = converged_line();
        net.configure_router(B).set_max_queue_size(5).apply().unwrap();

        let packet = data(&net, A, C, 10);
        net.send(packet).unwrap();

        let mut drops = Vec::new();
        for _ in 0..10 {
            drops.extend(run_collecting_drops(&mut net, 1));
            if !drops.is_empty() {
                break;
            }
        }

        assert_eq!(drops, vec![(B, DropReason::QueueFull)]);
        let connection = net.router(A).unwrap().connection_to(B).unwrap();
        assert_eq!(connection.throttle_percent().value(), 0.5);
        assert_eq!(net.router(A).unwrap().distance_to(B), Cost::new(20.0));
    }

    #[test]
    fn queue_accounting() {
        let mut net = converged_line();
        for size in [3, 4, 5] {
            let packet = data(&net, A, C, size);
            net.send(packet).unwrap();
        }

        let a = net.router(A).unwrap();
        assert_eq!(a.queue_size(), 12);
        assert_eq!(a.queue_size(), a.queued_packets().map(Packet::size).sum::<u64>());

        for _ in 0..20 {
            net.tick_with(|_| {});
            for router in net.routers() {
                let queued: u64 = router.queued_packets().map(Packet::size).sum();
                assert_eq!(router.queue_size(), queued);
            }
        }
    }

    #[test]
    fn throttle_recovers_over_time() {
        let mut net = converged_line();
        net.configure_router(B).set_max_queue_size(5).apply().unwrap();
        let packet = data(&net, A, C, 10);
        net.send(packet).unwrap();
        net.run_with(10, |_| {});

        net.run_with(200, |_| {});

        let connection = net.router(A).unwrap().connection_to(B).unwrap();
        assert!(connection.throttle_percent().is_full());
        assert_eq!(net.router(A).unwrap().distance_to(C), Cost::new(20.0));
    }

    // ------------------------------------------------------------------
    // 4. Failures
    // ------------------------------------------------------------------

    #[test]
    fn failure_propagates_and_recovery_converges() {
        let mut net = converged_line();
        let baseline = net.router(A).unwrap().distance_to(C).into_f64();

        net.force_router_failure(B).unwrap();
        net.run_with(5, |_| {});
        let degraded = net.router(A).unwrap().distance_to(C).into_f64();
        assert!(degraded > baseline, "{degraded} <= {baseline}");

        net.force_full_throughput(B).unwrap();
        net.run_with(20, |_| {});
        let recovered = net.router(A).unwrap().distance_to(C).into_f64();
        assert!((recovered - baseline).abs() < 1e-6, "{recovered} != {baseline}");
    }

    #[test]
    fn failure_degrades_own_connections_only() {
        let mut net = converged_line();
        net.force_router_failure(B).unwrap();

        let stats = net.stats();
        for connection in &stats.connections {
            let expected = if connection.from == B { 0.01 } else { 1.0 };
            assert_eq!(connection.throughput_percent.value(), expected);
        }
    }

    #[test]
    fn failure_of_unknown_router() {
        let mut net = line_network();
        assert!(net.force_router_failure(RouterId::new(7)).is_err());
        assert!(net.force_full_throughput(RouterId::new(7)).is_err());
    }

    // ------------------------------------------------------------------
    // 5. Tick order
    // ------------------------------------------------------------------

    #[test]
    fn tick_order_decides_same_tick_forwarding() {
        let forward = ticks_until_trace_completes([A, B, C]);
        let reverse = ticks_until_trace_completes([C, B, A]);

        assert_eq!(forward, 3);
        assert_eq!(reverse, 4);
    }

    #[test]
    fn tick_order_must_be_a_permutation() {
        let mut net = line_network();

        assert!(matches!(
            net.set_tick_order([A, B]),
            Err(TickOrderError::Length { len: 2, num_routers: 3 })
        ));
        assert!(matches!(
            net.set_tick_order([A, B, B]),
            Err(TickOrderError::Duplicate { router: B })
        ));
        assert!(matches!(
            net.set_tick_order([A, B, RouterId::new(3)]),
            Err(TickOrderError::UnknownRouter { .. })
        ));
        assert_eq!(net.tick_order(), &[A, B, C]);

        net.set_tick_order([B, C, A]).unwrap();
        assert_eq!(net.tick_order(), &[B, C, A]);
    }

    // ------------------------------------------------------------------
    // 6. Desynchronized ticks
    // ------------------------------------------------------------------

    #[test]
    fn desynchronized_ticks_are_reproducible() {
        let run = |seed| {
            let mut net = line_network();
            net.set_seed(seed);
            for _ in 0..50 {
                net.tick_desynchronized_with(0.5, |_| {});
            }
            net.stats()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn desynchronized_with_certainty_is_synchronous() {
        let mut sync = line_network();
        let mut desync = line_network();
        for _ in 0..30 {
            sync.tick_with(|_| {});
            desync.tick_desynchronized_with(1.0, |_| {});
        }

        assert_eq!(sync.stats(), desync.stats());
    }

    #[test]
    fn skipped_routers_do_not_count_ticks() {
        let mut net = line_network();
        for _ in 0..5 {
            net.tick_desynchronized_with(0.0, |_| {});
        }

        assert_eq!(net.time(), Tick::new(5));
        assert!(net.routers().iter().all(|r| r.time_since_broadcast() == 0));
    }

    // ------------------------------------------------------------------
    // 7. Errors
    // ------------------------------------------------------------------

    #[test]
    fn send_from_unknown_sender() {
        let mut net = line_network();
        let packet = data(&net, RouterId::new(9), C, 1);
        let err = net.send(packet).unwrap_err();
        assert!(
            matches!(err, SendError::SenderNotFound { .. }),
            "expected SenderNotFound, got {err:?}"
        );
    }

    #[test]
    fn send_to_unknown_recipient() {
        let mut net = line_network();
        let packet = data(&net, A, RouterId::new(9), 1);
        let err = net.send(packet).unwrap_err();
        assert!(
            matches!(err, SendError::RecipientNotFound { .. }),
            "expected RecipientNotFound, got {err:?}"
        );
    }

    #[test]
    fn queue_at_unknown_router() {
        let mut net = line_network();
        let packet = data(&net, A, C, 1);
        let err = net.queue_packet_at(RouterId::new(9), packet, A).unwrap_err();
        assert!(matches!(err, SendError::Router(_)), "got {err:?}");
    }

    #[test]
    fn invalid_links_are_not_applied() {
        let mut net: Network<()> = Network::new(2);

        assert!(matches!(
            net.configure_link(A, A).apply(),
            Err(ConnectionError::SelfConnection { .. })
        ));
        assert!(matches!(
            net.configure_link(A, C).apply(),
            Err(ConnectionError::UnknownRouter { router: C, .. })
        ));
        assert!(matches!(
            net.configure_link(A, B).set_bandwidth(-1.0).apply(),
            Err(ConnectionError::InvalidThroughput { .. })
        ));
        assert!(net.stats().connections.is_empty());
    }

    #[test]
    fn configure_unknown_router() {
        let mut net = line_network();
        assert!(net.configure_router(RouterId::new(3)).apply().is_err());
    }

    // ------------------------------------------------------------------
    // 8. Observability
    // ------------------------------------------------------------------

    #[test]
    fn stats_snapshot() {
        let mut net = line_network();
        net.configure_router(A).set_max_queue_size(100).apply().unwrap();
        let packet = data(&net, A, C, 7);
        net.send(packet).unwrap();

        let stats = net.stats();
        assert_eq!(stats.time, Tick::ZERO);
        assert_eq!(stats.routers.len(), 3);
        assert_eq!(stats.connections.len(), 4);
        assert_eq!(stats.total_queue_size(), 7);
        assert_eq!(stats.routers[0].max_queue_size, 100);
        assert_eq!(stats.routers[0].queued_packets, 1);
        assert_eq!(stats.throttled_connections().count(), 0);
    }

    #[test]
    fn connection_success_sampler() {
        let mut net: Network<()> = Network::new(3);
        net.configure_link(A, B)
            .set_failure_rate(FailureRate::new(1.0).unwrap())
            .apply()
            .unwrap();
        net.configure_link(B, C).apply().unwrap();

        assert_eq!(net.sample_connection_success(A, B), Some(false));
        assert_eq!(net.sample_connection_success(B, C), Some(true));
        assert_eq!(net.sample_connection_success(A, C), None);
    }

    #[test]
    fn configuration_is_per_network() {
        let fast = SimConfiguration {
            congestion_throttle_factor: Percent::new(0.25).unwrap(),
            ..SimConfiguration::default()
        };
        let net: Network<()> = Network::with_configuration(2, fast.clone());
        let other: Network<()> = Network::new(2);

        assert_eq!(net.configuration(), &fast);
        assert_ne!(other.configuration(), &fast);
    }

    // ------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------

    /// A - B - C, every link at bandwidth 10
    fn line_network() -> Network<&'static str> {
        let mut net = Network::new(3);
        net.configure_link(A, B).set_bandwidth(10.0).apply().unwrap();
        net.configure_link(B, C).set_bandwidth(10.0).apply().unwrap();
        net
    }

    fn converged_line() -> Network<&'static str> {
        let mut net = line_network();
        net.run_with(30, |_| {});
        net
    }

    fn data(
        net: &Network<&'static str>,
        from: RouterId,
        to: RouterId,
        size: u64,
    ) -> Packet<&'static str> {
        Packet::builder(net.packet_id_generator())
            .from(from)
            .to(to)
            .size(size)
            .build()
            .unwrap()
    }

    fn run_collecting_traces(net: &mut Network<&'static str>, ticks: u64) -> Vec<TraceReport> {
        let mut reports = Vec::new();
        net.run_with(ticks, |event| {
            if let Event::TraceCompleted(report) = event {
                reports.push(report);
            }
        });
        reports
    }

    fn run_collecting_drops(
        net: &mut Network<&'static str>,
        ticks: u64,
    ) -> Vec<(RouterId, DropReason)> {
        let mut drops = Vec::new();
        net.run_with(ticks, |event| {
            if let Event::Dropped { router, reason, .. } = event {
                drops.push((router, reason));
            }
        });
        drops
    }

    fn ticks_until_trace_completes(order: [RouterId; 3]) -> u32 {
        let mut net = converged_line();
        net.set_tick_order(order).unwrap();
        let trace = Packet::routing_trace(net.packet_id_generator(), A, C);
        net.send(trace).unwrap();

        for ticks in 1..=10 {
            if !run_collecting_traces(&mut net, 1).is_empty() {
                return ticks;
            }
        }
        panic!("trace never completed");
    }
}
