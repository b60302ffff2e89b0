//! Discrete-time simulation of a distance-vector routed packet network.
//!
//! A [`Network`] owns a fixed set of [`Router`]s linked by bidirectional
//! connections. On every tick each router advertises its routing table
//! to its neighbours when due, lets throttled connections recover,
//! and forwards at most one packet at a time from its bounded queue.
//! Congested routers push back on their senders with throttle packets,
//! and trace packets report the path they took and its cost.
//!
//! ```
//! use routesim_core::{Event, network::Network, packet::Packet, router::RouterId};
//!
//! let (a, b) = (RouterId::new(0), RouterId::new(1));
//! let mut network: Network<&str> = Network::new(2);
//! network.configure_link(a, b).apply().unwrap();
//! network.run_with(10, |_| {});
//!
//! let packet = Packet::builder(network.packet_id_generator())
//!     .from(a)
//!     .to(b)
//!     .size(1)
//!     .payload("hello")
//!     .build()
//!     .unwrap();
//! network.send(packet).unwrap();
//!
//! let mut received = None;
//! network.run_with(5, |event| {
//!     if let Event::Delivered { packet, .. } = event {
//!         received = packet.into_payload();
//!     }
//! });
//! assert_eq!(received, Some("hello"));
//! ```
//!
//! [`Network`]: network::Network
//! [`Router`]: router::Router

mod config;
pub mod connection;
pub mod defaults;
mod event;
pub mod measure;
pub mod network;
pub mod packet;
pub mod router;
pub mod routing_table;
pub mod stats;

pub use self::{
    config::{ConfigurationError, SimConfiguration},
    event::{DropReason, Event},
};
