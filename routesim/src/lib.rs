/*!
# Routing simulator

Loading of flat-file topologies, scripted scenarios and textual
rendering on top of [`routesim_core`].

```
use routesim::{Scenario, Topology};
use routesim_core::SimConfiguration;

let topology = Topology::demonstration().unwrap();
let mut network = topology.build::<()>(SimConfiguration::default()).unwrap();

let report = Scenario::demonstration(topology.num_routers())
    .unwrap()
    .run(&mut network, &mut std::io::sink())
    .unwrap();
assert!(!report.traces.is_empty());
```
*/

pub mod render;
pub mod scenario;
pub mod topology;

// convenient re-export of `routesim_core` core objects
pub use routesim_core::{
    DropReason, Event, SimConfiguration,
    network::Network,
    packet::{Packet, TraceReport},
    router::RouterId,
};

pub use self::{
    render::{ReportDisplay, TraceDisplay},
    scenario::{Report, Scenario, Step},
    topology::{LinkSpec, Topology, TopologyError},
};
