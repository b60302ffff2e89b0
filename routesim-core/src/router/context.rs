use crate::{
    SimConfiguration,
    event::Event,
    packet::{Packet, PacketIdGenerator},
    router::RouterId,
};

/// A packet handed by one router to another.
///
/// Routers never reach into each other; whatever they send is collected
/// in their [`Context`] and handed to the recipient's
/// [`Router::queue_packet`] by the caller, before anything else happens
/// in the network.
///
/// [`Router::queue_packet`]: crate::router::Router::queue_packet
#[derive(Debug)]
pub struct Delivery<T> {
    pub to: RouterId,
    pub sender: RouterId,
    pub packet: Packet<T>,
}

/// Everything a router needs from, and reports to, the rest of the
/// simulation during one call to [`Router::time_tick`] or
/// [`Router::queue_packet`].
///
/// [`Router::time_tick`]: crate::router::Router::time_tick
/// [`Router::queue_packet`]: crate::router::Router::queue_packet
pub struct Context<'a, T> {
    pub(crate) config: &'a SimConfiguration,
    pub(crate) packet_ids: &'a PacketIdGenerator,
    deliveries: Vec<Delivery<T>>,
    events: Vec<Event<T>>,
}

impl<'a, T> Context<'a, T> {
    pub fn new(config: &'a SimConfiguration, packet_ids: &'a PacketIdGenerator) -> Self {
        Self {
            config,
            packet_ids,
            deliveries: Vec::new(),
            events: Vec::new(),
        }
    }

    /// packets sent so far, in sending order
    pub fn deliveries(&self) -> &[Delivery<T>] {
        &self.deliveries
    }

    /// events reported so far
    pub fn events(&self) -> &[Event<T>] {
        &self.events
    }

    pub fn into_parts(self) -> (Vec<Delivery<T>>, Vec<Event<T>>) {
        (self.deliveries, self.events)
    }

    pub(crate) fn deliver(&mut self, to: RouterId, sender: RouterId, packet: Packet<T>) {
        self.deliveries.push(Delivery { to, sender, packet });
    }

    pub(crate) fn report(&mut self, event: Event<T>) {
        self.events.push(event);
    }
}
