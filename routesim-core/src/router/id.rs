use anyhow::anyhow;
use std::{fmt, str};

/// The identifier of a [`Router`] in the simulated [`Network`].
///
/// Router identifiers are dense: a network of `n` routers uses the
/// identifiers `0..n`, and the identifier doubles as the index of the
/// router's entry in every [`RoutingTable`].
///
/// [`Router`]: crate::router::Router
/// [`Network`]: crate::network::Network
/// [`RoutingTable`]: crate::routing_table::RoutingTable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct RouterId(u64);

impl RouterId {
    pub const ZERO: Self = RouterId::new(0);
    pub const ONE: Self = RouterId::new(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// the position of this router in the network's registry and
    /// in the routing tables.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn into_u64(self) -> u64 {
        self.0
    }

    #[must_use = "function does not modify the current value"]
    pub(crate) fn next(self) -> Self {
        Self::new(self.0 + 1)
    }
}

impl From<usize> for RouterId {
    fn from(index: usize) -> Self {
        Self(index as u64)
    }
}

impl str::FromStr for RouterId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('r').unwrap_or(s);
        s.parse().map(Self).map_err(|error| anyhow!("{error}"))
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
