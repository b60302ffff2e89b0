mod context;
mod id;
mod transmission;

pub use self::{
    context::{Context, Delivery},
    id::RouterId,
    transmission::Transmission,
};
use crate::{
    SimConfiguration,
    connection::{Connection, ConnectionError},
    defaults::{DEFAULT_MAX_QUEUE_SIZE, REBROADCAST_NOW},
    event::{DropReason, Event},
    measure::{Cost, FailureRate, Percent},
    network::Tick,
    packet::{MetaPayload, Packet},
    routing_table::RoutingTable,
};
use std::collections::VecDeque;
use tracing::{debug, info, trace};

/// A simulated store-and-forward router managed by the [`Network`].
///
/// A `Router` owns its outgoing [`Connection`]s, its [`RoutingTable`] and
/// a FIFO queue of packets waiting to be forwarded. At most one packet
/// is in flight at a time (see [`Transmission`]).
///
/// ## Data flow
///
/// ```text
/// queue_packet() ──► [ queue (max_queue_size) ] ──admit──► transmission
///      │                       │                               │
///      │ destination == self   └─► drop + throttle sender       │ connection throughput
///      ▼                                                        ▼
///  process meta / deliver                              queue_packet() of next hop
/// ```
///
/// Everything a router sends or reports while handling a call goes
/// through the given [`Context`]; the caller is responsible for handing
/// the collected [`Delivery`]s to their recipients.
///
/// [`Network`]: crate::network::Network
#[derive(Debug)]
pub struct Router<T> {
    id: RouterId,

    routing_table: RoutingTable,
    connections: Vec<Connection>,

    queue: VecDeque<Packet<T>>,
    /// sum of the sizes of the queued packets
    queue_size: u64,
    max_queue_size: u64,

    transmission: Transmission<T>,
    time_since_broadcast: u64,
}

impl<T> Router<T> {
    /// Create an isolated router in a network of `num_routers` routers.
    ///
    /// The queue is unbounded until [`Router::set_max_queue_size`] is
    /// called.
    pub fn new(id: RouterId, num_routers: usize) -> Self {
        Self {
            id,
            routing_table: RoutingTable::new(id, num_routers),
            connections: Vec::new(),
            queue: VecDeque::new(),
            queue_size: 0,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            transmission: Transmission::Idle,
            time_since_broadcast: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> RouterId {
        self.id
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// the direct connection toward `other`, if any
    pub fn connection_to(&self, other: RouterId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.other() == other)
    }

    /// sum of the sizes of the packets waiting in the queue
    #[inline]
    pub fn queue_size(&self) -> u64 {
        self.queue_size
    }

    #[inline]
    pub fn max_queue_size(&self) -> u64 {
        self.max_queue_size
    }

    pub fn set_max_queue_size(&mut self, max_queue_size: u64) {
        self.max_queue_size = max_queue_size;
    }

    /// the packets waiting in the queue, oldest first
    pub fn queued_packets(&self) -> impl ExactSizeIterator<Item = &Packet<T>> {
        self.queue.iter()
    }

    pub fn transmission(&self) -> &Transmission<T> {
        &self.transmission
    }

    #[inline]
    pub fn time_since_broadcast(&self) -> u64 {
        self.time_since_broadcast
    }

    pub fn does_route_exist(&self, destination: RouterId) -> bool {
        self.routing_table.has_route(destination)
    }

    /// current best known cost toward `destination`
    pub fn distance_to(&self, destination: RouterId) -> Cost {
        self.routing_table.cost(destination)
    }

    /// Add a connection toward `other`.
    ///
    /// If a connection toward `other` already exists it is replaced and
    /// the routes going through it follow the change of cost. The
    /// direct route to `other` is installed if the connection is cheaper
    /// than the route currently known.
    ///
    /// # Errors
    ///
    /// * [`ConnectionError::SelfConnection`] if `other` is this router;
    /// * [`ConnectionError::UnknownRouter`] if `other` is not part of the
    ///   network;
    /// * [`ConnectionError::InvalidThroughput`] if `throughput` is not
    ///   finite and strictly positive.
    pub fn create_connection(
        &mut self,
        other: RouterId,
        throughput: f64,
        failure_rate: FailureRate,
    ) -> Result<(), ConnectionError> {
        if other == self.id {
            return Err(ConnectionError::SelfConnection { router: other });
        }
        if other.index() >= self.routing_table.len() {
            return Err(ConnectionError::UnknownRouter {
                router: other,
                num_routers: self.routing_table.len(),
            });
        }

        let connection = Connection::new(other, throughput, failure_rate)?;
        let cost = connection.cost();

        if let Some(existing) = self.connections.iter_mut().find(|c| c.other() == other) {
            let delta = cost.delta(existing.cost());
            *existing = connection;
            self.routing_table.shift_routes_via(other, delta);
        } else {
            self.connections.push(connection);
        }

        if cost < self.routing_table.cost(other) {
            self.routing_table.update(other, cost, other);
        }

        debug!(router = %self.id, %other, throughput, %cost, "connection created");
        Ok(())
    }

    /// Accept `packet` from `sender`.
    ///
    /// Packets addressed to this router are consumed immediately. Others
    /// are appended to the queue unless doing so would reach the
    /// capacity of the queue, in which case the packet is dropped and a
    /// throttle is sent back to `sender` when it is a direct neighbour.
    pub fn queue_packet(&mut self, mut packet: Packet<T>, sender: RouterId, ctx: &mut Context<'_, T>) {
        if packet.destination() == self.id {
            self.process_meta(&mut packet, None, ctx);
            if packet.meta().is_none() {
                trace!(router = %self.id, packet = %packet.id(), "packet delivered");
                ctx.report(Event::Delivered {
                    router: self.id,
                    packet,
                });
            }
            return;
        }

        let size = packet.size();
        if self.queue_size.saturating_add(size) < self.max_queue_size {
            self.queue_size += size;
            self.queue.push_back(packet);
            return;
        }

        debug!(
            router = %self.id,
            %sender,
            size,
            queue_size = self.queue_size,
            max_queue_size = self.max_queue_size,
            reason = %DropReason::QueueFull,
            "dropping packet"
        );

        if self.connection_to(sender).is_some() {
            let throttle = Packet::routing_throttle(
                ctx.packet_ids,
                self.id,
                sender,
                ctx.config.congestion_throttle_factor,
            );
            ctx.deliver(sender, self.id, throttle);
        }

        ctx.report(Event::Dropped {
            router: self.id,
            packet,
            reason: DropReason::QueueFull,
        });
    }

    /// Advance this router by one tick.
    ///
    /// 1. broadcast the routing table to every neighbour if the
    ///    broadcast threshold is reached;
    /// 2. on decay ticks, let the throttled connections recover;
    /// 3. if nothing is in flight, admit the head of the queue;
    /// 4. progress the packet in flight, unless it was just admitted
    ///    and the queue is now empty.
    pub fn time_tick(&mut self, now: Tick, ctx: &mut Context<'_, T>) {
        let config = ctx.config;

        if self.time_since_broadcast >= config.broadcast_threshold(now) {
            self.broadcast_routing_table(ctx);
            self.time_since_broadcast = 0;
        } else {
            self.time_since_broadcast = self.time_since_broadcast.saturating_add(1);
        }

        if now.is_multiple_of(config.throttle_decay_interval) {
            self.decay_throttles(config);
        }

        let admitted = self.admit(ctx);

        if !self.transmission.is_idle() && (!admitted || !self.queue.is_empty()) {
            self.transmit(ctx);
        }
    }

    /// Degrade the throughput of every connection of this router to
    /// `config.failure_throughput_percent`.
    ///
    /// Only this side of the links is affected; the neighbours notice
    /// the failure through the costs this router advertises.
    pub fn force_router_failure(&mut self, config: &SimConfiguration) {
        info!(router = %self.id, percent = %config.failure_throughput_percent, "forcing router failure");
        for index in 0..self.connections.len() {
            self.update_connection_throughput(index, config.failure_throughput_percent);
        }
    }

    /// Restore the throughput of every connection of this router.
    pub fn force_full_throughput(&mut self) {
        info!(router = %self.id, "restoring full throughput");
        for index in 0..self.connections.len() {
            self.update_connection_throughput(index, Percent::FULL);
        }
    }

    fn broadcast_routing_table(&mut self, ctx: &mut Context<'_, T>) {
        trace!(router = %self.id, neighbours = self.connections.len(), "broadcasting routing table");
        for connection in &self.connections {
            let packet = Packet::routing_broadcast(
                ctx.packet_ids,
                self.id,
                connection.other(),
                self.routing_table.clone(),
            );
            ctx.deliver(connection.other(), self.id, packet);
        }
    }

    fn decay_throttles(&mut self, config: &SimConfiguration) {
        for index in 0..self.connections.len() {
            let throttle = self.connections[index].throttle_percent();
            if !throttle.is_full() {
                let recovered =
                    throttle.recover(config.throttle_decay_rate, config.throttle_snap_threshold);
                self.update_connection_throttle(index, recovered);
            }
        }
    }

    /// Returns `true` if a packet left the queue, even if it was then
    /// dropped for lack of a route.
    fn admit(&mut self, ctx: &mut Context<'_, T>) -> bool {
        if !self.transmission.is_idle() {
            return false;
        }
        let Some(packet) = self.queue.pop_front() else {
            return false;
        };
        self.queue_size = self.queue_size.saturating_sub(packet.size());

        match self.routing_table.next_hop(packet.destination()) {
            Some(next_hop) => self.transmission.admit(packet, next_hop),
            None => {
                debug!(
                    router = %self.id,
                    destination = %packet.destination(),
                    reason = %DropReason::Unroutable,
                    "dropping packet"
                );
                ctx.report(Event::Dropped {
                    router: self.id,
                    packet,
                    reason: DropReason::Unroutable,
                });
            }
        }

        true
    }

    fn transmit(&mut self, ctx: &mut Context<'_, T>) {
        let Some(destination) = self.transmission.packet().map(Packet::destination) else {
            return;
        };
        // routes may have changed since admission
        let next_hop = self
            .routing_table
            .next_hop(destination)
            .or(self.transmission.next_hop());

        let link = next_hop
            .and_then(|hop| self.connection_to(hop))
            .map(|connection| (connection.other(), connection.throughput()));

        let Some((next_hop, throughput)) = link else {
            if let Some(packet) = self.transmission.cancel() {
                debug!(
                    router = %self.id,
                    %destination,
                    reason = %DropReason::NoConnection,
                    "dropping packet"
                );
                ctx.report(Event::Dropped {
                    router: self.id,
                    packet,
                    reason: DropReason::NoConnection,
                });
            }
            return;
        };

        if let Some(mut packet) = self.transmission.advance(next_hop, throughput) {
            if packet.requires_inspection() {
                self.process_meta(&mut packet, Some(next_hop), ctx);
            }
            trace!(router = %self.id, %next_hop, packet = %packet.id(), "packet transmitted");
            ctx.deliver(next_hop, self.id, packet);
        }
    }

    /// Handle the [`MetaPayload`] of `packet`, either because it is
    /// addressed to this router or because it requires inspection on
    /// its way out to `next_hop`.
    fn process_meta(
        &mut self,
        packet: &mut Packet<T>,
        next_hop: Option<RouterId>,
        ctx: &mut Context<'_, T>,
    ) {
        let (id, source, destination) = (packet.id(), packet.source(), packet.destination());
        let Some(meta) = packet.meta_mut() else {
            return;
        };

        match meta {
            MetaPayload::Broadcast { table } => self.learn_routes(source, table),
            MetaPayload::Trace(route) => {
                route.visit(self.id);
                if destination == self.id {
                    let report = std::mem::take(route).into_report(id, source, destination);
                    info!(
                        router = %self.id,
                        %source,
                        cost = %report.cost,
                        hops = report.visited.len(),
                        "trace completed"
                    );
                    ctx.report(Event::TraceCompleted(report));
                } else if let Some(connection) = next_hop.and_then(|hop| self.connection_to(hop)) {
                    route.add_cost(connection.cost());
                }
            }
            MetaPayload::Throttle { factor } => {
                if destination == self.id {
                    let factor = *factor;
                    self.throttle_connection_to(source, factor);
                }
            }
            MetaPayload::RoutingRequest { .. } | MetaPayload::RoutingResponse { .. } => {
                trace!(router = %self.id, %source, "ignoring routing information packet");
            }
        }
    }

    fn learn_routes(&mut self, neighbour: RouterId, advertised: &RoutingTable) {
        let Some(link_cost) = self.connection_to(neighbour).map(Connection::cost) else {
            debug!(router = %self.id, %neighbour, "ignoring broadcast from a router that is not a neighbour");
            return;
        };

        if self.routing_table.relax(neighbour, link_cost, advertised) {
            trace!(router = %self.id, %neighbour, "routing table updated");
            self.time_since_broadcast = REBROADCAST_NOW;
        }
    }

    fn throttle_connection_to(&mut self, neighbour: RouterId, factor: Percent) {
        let Some(index) = self.connections.iter().position(|c| c.other() == neighbour) else {
            debug!(router = %self.id, %neighbour, "ignoring throttle from a router that is not a neighbour");
            return;
        };

        let throttle = self.connections[index].throttle_percent().compound(factor);
        debug!(router = %self.id, %neighbour, %throttle, "throttling connection");
        self.update_connection_throttle(index, throttle);
    }

    /// Set the throttle percent of a connection and shift the routes
    /// using it by the change of cost.
    fn update_connection_throttle(&mut self, index: usize, percent: Percent) {
        let connection = &mut self.connections[index];
        let previous = connection.cost();
        connection.update_throttle_percent(percent);
        let delta = connection.cost().delta(previous);
        let other = connection.other();

        self.routing_table.shift_routes_via(other, delta);
    }

    /// Set the throughput percent of a connection and shift the routes
    /// using it by the change of cost.
    fn update_connection_throughput(&mut self, index: usize, percent: Percent) {
        let connection = &mut self.connections[index];
        let previous = connection.cost();
        connection.update_throughput_percent(percent);
        let delta = connection.cost().delta(previous);
        let other = connection.other();

        self.routing_table.shift_routes_via(other, delta);
    }
}
