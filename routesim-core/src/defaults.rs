//! Default values of the [`SimConfiguration`].
//!
//! [`SimConfiguration`]: crate::SimConfiguration

use crate::measure::Percent;

/// Default steady-state broadcast interval
///
/// Once the bootstrap window is over, a router advertises its routing
/// table to its neighbours every time this many ticks have elapsed since
/// its last broadcast.
///
/// ```
/// # use routesim_core::defaults::*;
/// assert_eq!(DEFAULT_BROADCAST_INTERVAL, 10);
/// ```
pub const DEFAULT_BROADCAST_INTERVAL: u64 = 10;

/// Default bootstrap broadcast interval
///
/// Used instead of [`DEFAULT_BROADCAST_INTERVAL`] while the clock is
/// within [`DEFAULT_INITIALIZATION_TICKS`], so that a fresh network
/// converges quickly.
pub const DEFAULT_INITIAL_BROADCAST_INTERVAL: u64 = 1;

/// Default length of the bootstrap window, in ticks.
pub const DEFAULT_INITIALIZATION_TICKS: u64 = 10;

/// Default throttle recovery rate
///
/// Every decay step moves a throttled connection this fraction of the
/// remaining distance back to full throughput.
pub const DEFAULT_THROTTLE_DECAY_RATE: f64 = 0.2;

/// Default cadence of the throttle decay, in ticks.
pub const DEFAULT_THROTTLE_DECAY_INTERVAL: u64 = 10;

/// Throttle percent above which a decay step restores the connection
/// to full throughput at once.
pub const DEFAULT_THROTTLE_SNAP_THRESHOLD: f64 = 0.95;

/// Factor carried by the throttle packets a congested router sends
/// back to the sender of a dropped packet.
///
/// ```
/// # use routesim_core::defaults::*;
/// assert_eq!(DEFAULT_CONGESTION_THROTTLE_FACTOR.to_string(), "50%");
/// ```
pub const DEFAULT_CONGESTION_THROTTLE_FACTOR: Percent = Percent::checked(0.5);

/// Throughput percent applied to every connection of a router forced
/// into failure.
pub const DEFAULT_FAILURE_THROUGHPUT_PERCENT: Percent = Percent::checked(0.01);

/// Default base throughput of a link
///
/// Used by [`LinkBuilder`] when no bandwidth is set. A link of this
/// throughput costs `10`.
///
/// [`LinkBuilder`]: crate::network::LinkBuilder
pub const DEFAULT_LINK_BANDWIDTH: f64 = 10.0;

/// Default maximum queue size
///
/// this is the router's admission capacity, in packet size units. By
/// default we have set a (virtually) infinite size for the queue.
///
/// See [`RouterBuilder::set_max_queue_size`] for more details
///
/// [`RouterBuilder::set_max_queue_size`]: crate::network::RouterBuilder::set_max_queue_size
pub const DEFAULT_MAX_QUEUE_SIZE: u64 = u64::MAX;

/// Value `time_since_broadcast` is set to when a router learns a route
/// change, so that it broadcasts on its very next tick.
pub(crate) const REBROADCAST_NOW: u64 = 1_000;
