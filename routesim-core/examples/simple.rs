use routesim_core::{
    Event,
    network::Network,
    packet::Packet,
    router::RouterId,
};

fn main() -> anyhow::Result<()> {
    let mut network = Network::<&'static str>::new(3);

    let sender: RouterId = "r0".parse()?;
    let relay: RouterId = "r1".parse()?;
    let receiver: RouterId = "r2".parse()?;

    network.configure_link(sender, relay).set_bandwidth(10.0).apply()?;
    network.configure_link(relay, receiver).set_bandwidth(5.0).apply()?;

    // Let the routing tables converge.
    network.run_with(20, |_| {});

    let packet = Packet::builder(network.packet_id_generator())
        .from(sender)
        .to(receiver)
        .size(8)
        .payload("Hello World!")
        .build()?;
    let id = packet.id();
    network.send(packet)?;

    let print = |event: Event<&str>| {
        if let Event::Delivered { router, packet } = event {
            assert_eq!(id, packet.id());
            println!(
                "[{id}]{from}->{router}: {msg}",
                id = packet.id(),
                from = packet.source(),
                msg = packet.into_payload().unwrap_or_default()
            );
        }
    };

    network.run_with(10, print);

    Ok(())
}
