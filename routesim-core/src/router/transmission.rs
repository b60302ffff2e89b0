use crate::{packet::Packet, router::RouterId};

/// The at-most-one packet a router is sending toward its next hop.
///
/// ```text
///  Idle ──admit──► Admitted ──advance──► Transmitting ──advance──► (delivered) Idle
///                      │                                ▲    │
///                      └───────advance (completes)──────┼────┘
///                                                       └ advance (in progress)
/// ```
///
/// A packet is admitted when it leaves the queue. Each call to
/// [`Transmission::advance`] adds the throughput of the outgoing
/// connection to its progress, and the transmission completes once the
/// progress exceeds the size of the packet.
#[derive(Debug, Default)]
pub enum Transmission<T> {
    #[default]
    Idle,
    /// dequeued, no progress made yet
    Admitted { packet: Packet<T>, next_hop: RouterId },
    Transmitting {
        packet: Packet<T>,
        next_hop: RouterId,
        progress: f64,
    },
}

impl<T> Transmission<T> {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn packet(&self) -> Option<&Packet<T>> {
        match self {
            Self::Idle => None,
            Self::Admitted { packet, .. } | Self::Transmitting { packet, .. } => Some(packet),
        }
    }

    pub fn next_hop(&self) -> Option<RouterId> {
        match self {
            Self::Idle => None,
            Self::Admitted { next_hop, .. } | Self::Transmitting { next_hop, .. } => {
                Some(*next_hop)
            }
        }
    }

    /// throughput units accumulated toward the size of the packet
    pub fn progress(&self) -> f64 {
        match self {
            Self::Transmitting { progress, .. } => *progress,
            _ => 0.0,
        }
    }

    /// `Idle -> Admitted`
    ///
    /// Admitting while busy replaces the packet in flight; the router
    /// only admits when idle.
    pub(crate) fn admit(&mut self, packet: Packet<T>, next_hop: RouterId) {
        debug_assert!(self.is_idle(), "admitting a packet while transmitting");
        *self = Self::Admitted { packet, next_hop };
    }

    /// Add `throughput` to the progress of the packet in flight, sending
    /// it to `next_hop`.
    ///
    /// Returns the packet once the progress exceeds its size, leaving the
    /// transmission [`Idle`]. Does nothing when idle.
    ///
    /// [`Idle`]: Transmission::Idle
    pub(crate) fn advance(&mut self, next_hop: RouterId, throughput: f64) -> Option<Packet<T>> {
        let (packet, progress) = match std::mem::take(self) {
            Self::Idle => return None,
            Self::Admitted { packet, .. } => (packet, throughput),
            Self::Transmitting {
                packet, progress, ..
            } => (packet, progress + throughput),
        };

        if progress > packet.size() as f64 {
            Some(packet)
        } else {
            *self = Self::Transmitting {
                packet,
                next_hop,
                progress,
            };
            None
        }
    }

    /// abandon the packet in flight
    pub(crate) fn cancel(&mut self) -> Option<Packet<T>> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Admitted { packet, .. } | Self::Transmitting { packet, .. } => Some(packet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketIdGenerator;

    const HOP: RouterId = RouterId::ONE;

    #[test]
    fn default_is_idle() {
        let transmission = Transmission::<()>::default();
        assert!(transmission.is_idle());
        assert!(transmission.packet().is_none());
        assert_eq!(transmission.next_hop(), None);
    }

    #[test]
    fn advance_when_idle() {
        let mut transmission = Transmission::<()>::Idle;
        assert!(transmission.advance(HOP, 100.0).is_none());
        assert!(transmission.is_idle());
    }

    #[test]
    fn admit() {
        let mut transmission = Transmission::Idle;
        transmission.admit(packet(10), HOP);

        assert!(matches!(transmission, Transmission::Admitted { .. }));
        assert_eq!(transmission.next_hop(), Some(HOP));
        assert_eq!(transmission.progress(), 0.0);
    }

    #[test]
    fn completes_once_progress_exceeds_size() {
        let mut transmission = Transmission::Idle;
        transmission.admit(packet(10), HOP);

        assert!(transmission.advance(HOP, 4.0).is_none());
        assert_eq!(transmission.progress(), 4.0);

        // exactly the size is not enough
        assert!(transmission.advance(HOP, 6.0).is_none());
        assert_eq!(transmission.progress(), 10.0);

        let sent = transmission.advance(HOP, 0.5).expect("transmission complete");
        assert_eq!(sent.size(), 10);
        assert!(transmission.is_idle());
    }

    #[test]
    fn completes_on_first_advance_with_enough_throughput() {
        let mut transmission = Transmission::Idle;
        transmission.admit(packet(4), HOP);

        assert!(transmission.advance(HOP, 10.0).is_some());
        assert!(transmission.is_idle());
    }

    #[test]
    fn next_hop_follows_latest_advance() {
        let mut transmission = Transmission::Idle;
        transmission.admit(packet(100), HOP);
        transmission.advance(RouterId::new(5), 1.0);

        assert_eq!(transmission.next_hop(), Some(RouterId::new(5)));
    }

    #[test]
    fn cancel() {
        let mut transmission = Transmission::Idle;
        transmission.admit(packet(100), HOP);
        transmission.advance(HOP, 1.0);

        assert!(transmission.cancel().is_some());
        assert!(transmission.is_idle());
        assert!(transmission.cancel().is_none());
    }

    fn packet(size: u64) -> Packet<()> {
        Packet::builder(&PacketIdGenerator::new())
            .from(RouterId::ZERO)
            .to(RouterId::new(2))
            .size(size)
            .build()
            .unwrap()
    }
}
