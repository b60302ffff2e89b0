mod craft;
mod meta;

use crate::router::RouterId;
use anyhow::{Result, bail};
use std::{
    fmt,
    sync::{Arc, atomic::AtomicU64},
};

pub use self::{
    craft::{BROADCAST_SIZE, CraftError, ROUTING_INFO_SIZE, THROTTLE_SIZE, TRACE_SIZE},
    meta::{MetaKind, MetaPayload, Trace, TraceReport},
};

/// a generator for monotonicaly increasing **unique** [`PacketId`]
///
#[derive(Debug, Clone, Default)]
pub struct PacketIdGenerator(Arc<AtomicU64>);

/// # [`Packet`] Identifier
///
/// During the lifetime of the packet, this identifier can uniquely
/// identify the packet. It is only used to follow a packet in the
/// logs and in the [`Event`]s, routers never look at it.
///
/// [`Event`]: crate::network::Event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

/// # An addressed unit of transfer
///
/// A [`Packet`] goes from its `source` router to its `destination`
/// router, hop by hop. Its `size` is accounted against the queue of every
/// router it waits in and against the throughput of every connection it
/// is transmitted on. The `payload` is opaque to the simulation; routing
/// control information travels in the optional [`MetaPayload`].
///
#[derive(Clone)]
pub struct Packet<T> {
    id: PacketId,
    source: RouterId,
    destination: RouterId,
    size: u64,
    payload: Option<T>,
    meta: Option<MetaPayload>,
    is_response: bool,
}

pub struct PacketBuilder<'a, T> {
    generator: &'a PacketIdGenerator,
    source: Option<RouterId>,
    destination: Option<RouterId>,
    size: Option<u64>,
    payload: Option<T>,
    meta: Option<MetaPayload>,
    is_response: bool,
}

impl PacketIdGenerator {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }

    /// generate a new unique identifier
    pub fn generate(&self) -> PacketId {
        let id = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        debug_assert!(
            id != 0,
            "The only case this can be equal to 0 is if the generator overflowed. If this \
            happens it means we have generated `u64::MAX` unique packet identifier and we \
            wrapped around on overflow. This shouldn't happen!"
        );

        PacketId(id)
    }
}

impl PacketId {
    /// a _NULL_ packet identifier (i.e. doesn't have a packet to it)
    #[cfg(test)]
    pub(crate) const NULL: Self = Self(0);
}

impl<'a, T> PacketBuilder<'a, T> {
    pub fn new(generator: &'a PacketIdGenerator) -> Self {
        Self {
            generator,
            source: None,
            destination: None,
            size: None,
            payload: None,
            meta: None,
            is_response: false,
        }
    }

    pub fn from(mut self, source: RouterId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn to(mut self, destination: RouterId) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn meta(mut self, meta: MetaPayload) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn response(mut self, is_response: bool) -> Self {
        self.is_response = is_response;
        self
    }

    pub fn build(self) -> Result<Packet<T>> {
        let Some(source) = self.source else {
            bail!("Missing source information (`from')")
        };
        let Some(destination) = self.destination else {
            bail!("Missing destination information (`to')")
        };
        let Some(size) = self.size else {
            bail!("Missing packet size (`size')")
        };

        Ok(Packet {
            id: self.generator.generate(),
            source,
            destination,
            size,
            payload: self.payload,
            meta: self.meta,
            is_response: self.is_response,
        })
    }
}

impl<T> Packet<T> {
    pub fn builder(generator: &PacketIdGenerator) -> PacketBuilder<'_, T> {
        PacketBuilder::new(generator)
    }

    /// packets carrying routing control information only
    pub(crate) fn control(
        generator: &PacketIdGenerator,
        source: RouterId,
        destination: RouterId,
        size: u64,
        meta: MetaPayload,
        is_response: bool,
    ) -> Self {
        Self {
            id: generator.generate(),
            source,
            destination,
            size,
            payload: None,
            meta: Some(meta),
            is_response,
        }
    }

    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn source(&self) -> RouterId {
        self.source
    }

    pub fn destination(&self) -> RouterId {
        self.destination
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_response(&self) -> bool {
        self.is_response
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn meta(&self) -> Option<&MetaPayload> {
        self.meta.as_ref()
    }

    pub(crate) fn meta_mut(&mut self) -> Option<&mut MetaPayload> {
        self.meta.as_mut()
    }

    /// `true` if every router this packet transits through must look at
    /// its [`MetaPayload`], not only its destination.
    pub fn requires_inspection(&self) -> bool {
        self.meta
            .as_ref()
            .is_some_and(MetaPayload::requires_inspection)
    }

    /// consume the packet and get the inner payload, if any.
    ///
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<T> fmt::Debug for Packet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("Packet<{}>", std::any::type_name::<T>()))
            .field("id", &self.id)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("size", &self.size)
            .field("meta", &self.meta.as_ref().map(MetaPayload::kind))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_id_null() {
        let null = PacketId::NULL;

        assert_eq!(null, PacketId(0));
        assert_eq!(null.to_string(), "0x0000000000000000");
        assert_eq!(format!("{null:?}"), "PacketId(0)");
    }

    #[test]
    fn generator_is_shared_between_clones() {
        let generator = PacketIdGenerator::new();
        let clone = generator.clone();

        let a = generator.generate();
        let b = clone.generate();
        assert!(a < b);
    }

    #[test]
    fn builder_missing_from() {
        let Err(error) = Packet::<()>::builder(&PacketIdGenerator::new()).build() else {
            panic!("Expecting an error because missing the `from'")
        };

        assert_eq!(error.to_string(), "Missing source information (`from')");
    }

    #[test]
    fn builder_missing_to() {
        let Err(error) = Packet::<()>::builder(&PacketIdGenerator::new())
            .from(RouterId::ZERO)
            .build()
        else {
            panic!("Expecting an error because missing the `to'")
        };

        assert_eq!(error.to_string(), "Missing destination information (`to')");
    }

    #[test]
    fn builder_missing_size() {
        let Err(error) = Packet::<()>::builder(&PacketIdGenerator::new())
            .from(RouterId::ZERO)
            .to(RouterId::ONE)
            .build()
        else {
            panic!("Expecting an error because missing the `size'")
        };

        assert_eq!(error.to_string(), "Missing packet size (`size')");
    }

    #[test]
    fn builder_data_packet() {
        let packet = Packet::builder(&PacketIdGenerator::new())
            .from(RouterId::ZERO)
            .to(RouterId::ONE)
            .size(10)
            .payload("Test Packet")
            .build()
            .expect("Should be possible to build a data packet");

        assert_eq!(packet.source(), RouterId::ZERO);
        assert_eq!(packet.destination(), RouterId::ONE);
        assert_eq!(packet.size(), 10);
        assert!(packet.meta().is_none());
        assert!(!packet.requires_inspection());
        assert!(!packet.is_response());
        assert_eq!(packet.into_payload(), Some("Test Packet"));
    }

    #[test]
    fn builder_without_payload() {
        let packet = Packet::<()>::builder(&PacketIdGenerator::new())
            .from(RouterId::ZERO)
            .to(RouterId::ONE)
            .size(0)
            .build()
            .expect("Should be possible to build a packet without payload");

        assert!(packet.payload().is_none());
    }
}
