use crate::{
    measure::{Cost, FailureRate, Percent},
    router::RouterId,
};
use rand_core::Rng;
use thiserror::Error;

/// One direction of a link between two [`Router`]s.
///
/// A `Connection` is owned by the router it leaves from and names the
/// router on the other side by [`RouterId`] only; the neighbour owns its
/// own reciprocal `Connection` back. It carries the configured base
/// throughput and two independent degradation factors:
///
/// * the **throughput percent**, lowered to simulate a failed router
///   (see [`Router::force_router_failure`]);
/// * the **throttle percent**, lowered by congestion backpressure and
///   recovered over time.
///
/// Their product scales the effective throughput, and the routing
/// [`Cost`] of the connection is `100 / effective throughput`.
///
/// [`Router`]: crate::router::Router
/// [`Router::force_router_failure`]: crate::router::Router::force_router_failure
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    other: RouterId,
    base_throughput: f64,
    failure_rate: FailureRate,

    throughput_percent: Percent,
    throttle_percent: Percent,

    /// derived from the three values above, kept up to date by every
    /// setter.
    cost: Cost,
}

/// Error returned when a [`Connection`] cannot be created.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The base throughput must be a finite, strictly positive number.
    #[error("Invalid throughput ({throughput}) for the connection to {other}")]
    InvalidThroughput { other: RouterId, throughput: f64 },
    /// A router cannot be connected to itself.
    #[error("Router ({router}) cannot be connected to itself")]
    SelfConnection { router: RouterId },
    /// The router is not part of the network.
    #[error("Router ({router}) Not Found, the network has {num_routers} routers")]
    UnknownRouter { router: RouterId, num_routers: usize },
}

impl Connection {
    /// Create a connection toward `other` at full throughput.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::InvalidThroughput`] if `base_throughput` is not
    /// finite and strictly positive.
    ///
    /// ```
    /// # use routesim_core::{connection::Connection, measure::{Cost, FailureRate}, router::RouterId};
    /// let connection = Connection::new(RouterId::ONE, 10.0, FailureRate::NONE).unwrap();
    /// assert_eq!(connection.cost(), Cost::new(10.0));
    /// assert_eq!(connection.throughput(), 10.0);
    /// ```
    pub fn new(
        other: RouterId,
        base_throughput: f64,
        failure_rate: FailureRate,
    ) -> Result<Self, ConnectionError> {
        if !(base_throughput.is_finite() && base_throughput > 0.0) {
            return Err(ConnectionError::InvalidThroughput {
                other,
                throughput: base_throughput,
            });
        }

        let mut connection = Self {
            other,
            base_throughput,
            failure_rate,
            throughput_percent: Percent::FULL,
            throttle_percent: Percent::FULL,
            cost: Cost::ZERO,
        };
        connection.recompute_cost();
        Ok(connection)
    }

    /// The router on the other side of this connection.
    #[inline]
    pub fn other(&self) -> RouterId {
        self.other
    }

    #[inline]
    pub fn base_throughput(&self) -> f64 {
        self.base_throughput
    }

    #[inline]
    pub fn failure_rate(&self) -> FailureRate {
        self.failure_rate
    }

    #[inline]
    pub fn throughput_percent(&self) -> Percent {
        self.throughput_percent
    }

    #[inline]
    pub fn throttle_percent(&self) -> Percent {
        self.throttle_percent
    }

    /// `100 / (base throughput × throughput percent × throttle percent)`
    #[inline]
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// The effective throughput, in size units per tick. This is the
    /// amount of transmission progress a packet makes on every tick it
    /// spends on this connection.
    #[inline]
    pub fn throughput(&self) -> f64 {
        self.base_throughput * self.throughput_percent.value() * self.throttle_percent.value()
    }

    /// Replace the throughput percent and recompute the cost.
    pub fn update_throughput_percent(&mut self, percent: Percent) {
        self.throughput_percent = percent;
        self.recompute_cost();
    }

    /// Replace the throttle percent and recompute the cost.
    pub fn update_throttle_percent(&mut self, percent: Percent) {
        self.throttle_percent = percent;
        self.recompute_cost();
    }

    /// Sample whether one transmission over this connection succeeds,
    /// with probability `1 - failure rate`.
    ///
    /// Not consulted by the router's tick.
    pub fn connection_success<R: Rng>(&self, rng: &mut R) -> bool {
        self.failure_rate.sample_success(rng)
    }

    fn recompute_cost(&mut self) {
        self.cost = Cost::from_throughput(self.throughput());
    }
}
