//! Per-router distance-vector state.
//!
//! Every router keeps one [`RouteEntry`] per router of the network, in
//! id order. The table is updated from two sources:
//!
//! * the routing tables broadcast by direct neighbours, through
//!   [`RoutingTable::relax`];
//! * the router's own connections when their cost changes, through
//!   [`RoutingTable::shift_routes_via`].

use crate::{measure::Cost, router::RouterId};

/// best known path toward one destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEntry {
    pub destination: RouterId,
    pub cost: Cost,
    /// the direct neighbour packets for `destination` are handed to,
    /// `None` if the destination is unreachable or is the owner itself.
    pub next_hop: Option<RouterId>,
}

/// The routing table of one router, indexed by [`RouterId`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    owner: RouterId,
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// Create the table of `owner` in a network of `num_routers`.
    ///
    /// The owner's own entry has a cost of zero, every other destination
    /// starts unreachable.
    ///
    /// ```
    /// # use routesim_core::{routing_table::RoutingTable, router::RouterId, measure::Cost};
    /// let table = RoutingTable::new(RouterId::ONE, 3);
    ///
    /// assert_eq!(table.cost(RouterId::ONE), Cost::ZERO);
    /// assert_eq!(table.cost(RouterId::ZERO), Cost::INFINITE);
    /// assert_eq!(table.next_hop(RouterId::ZERO), None);
    /// ```
    pub fn new(owner: RouterId, num_routers: usize) -> Self {
        let entries = (0..num_routers)
            .map(RouterId::from)
            .map(|destination| RouteEntry {
                destination,
                cost: if destination == owner {
                    Cost::ZERO
                } else {
                    Cost::INFINITE
                },
                next_hop: None,
            })
            .collect();

        Self { owner, entries }
    }

    #[inline]
    pub fn owner(&self) -> RouterId {
        self.owner
    }

    /// number of destinations, i.e. number of routers in the network
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, destination: RouterId) -> Option<&RouteEntry> {
        self.entries.get(destination.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// best known cost toward `destination`, [`Cost::INFINITE`] if
    /// unknown.
    pub fn cost(&self, destination: RouterId) -> Cost {
        self.get(destination)
            .map(|entry| entry.cost)
            .unwrap_or(Cost::INFINITE)
    }

    pub fn next_hop(&self, destination: RouterId) -> Option<RouterId> {
        self.get(destination).and_then(|entry| entry.next_hop)
    }

    /// `true` if packets for `destination` can be forwarded.
    pub fn has_route(&self, destination: RouterId) -> bool {
        self.next_hop(destination).is_some()
    }

    /// Replace the entry for `destination`. Unknown destinations are
    /// ignored.
    pub fn update(&mut self, destination: RouterId, cost: Cost, next_hop: RouterId) {
        if let Some(entry) = self.entries.get_mut(destination.index()) {
            entry.cost = cost;
            entry.next_hop = Some(next_hop);
        }
    }

    /// Distance-vector relaxation against the table advertised by the
    /// direct neighbour `via`, reached over a link of cost `link_cost`.
    ///
    /// For every advertised destination other than the owner, the route
    /// through `via` is installed if it is strictly cheaper than the
    /// current one, or if the current route already goes through `via`
    /// (the advertisement refreshes the cost of a path in use, in either
    /// direction). Equal-cost alternatives never replace an established
    /// route. Unreachable advertisements are ignored.
    ///
    /// Returns `true` if at least one entry was accepted, in which case
    /// the owner should advertise its table again as soon as possible.
    pub fn relax(&mut self, via: RouterId, link_cost: Cost, advertised: &RoutingTable) -> bool {
        let mut accepted = false;

        for advert in advertised.iter() {
            if advert.destination == self.owner || !advert.cost.is_finite() {
                continue;
            }
            let Some(entry) = self.entries.get_mut(advert.destination.index()) else {
                continue;
            };

            let candidate = link_cost + advert.cost;
            let is_better = candidate < entry.cost;
            let is_refresh = entry.next_hop == Some(via);

            if is_better || is_refresh {
                entry.cost = candidate;
                entry.next_hop = Some(via);
                accepted = true;
            }
        }

        accepted
    }

    /// Shift the cost of every route whose next hop is `neighbour` by
    /// `delta`, following a change of the cost of the connection to
    /// that neighbour.
    ///
    /// Returns the number of routes affected.
    pub fn shift_routes_via(&mut self, neighbour: RouterId, delta: f64) -> usize {
        let mut affected = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| entry.next_hop == Some(neighbour))
        {
            entry.cost = entry.cost.adjust(delta);
            affected += 1;
        }
        affected
    }
}
