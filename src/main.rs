use distsim::protocols::{Flood, MinIdElection};
use distsim::{
    AlgorithmBinding, CommunicationModel, EventRecorder, NetworkBuilder, SimResult, Simulation,
};
use tracing_subscriber::EnvFilter;

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("═══════════════════════════════════════════════════════");
    println!("  distsim: flooding and leader election on a 6x6 grid");
    println!("═══════════════════════════════════════════════════════");
    println!();

    let network = NetworkBuilder::new()
        .seed(42)
        .grid(6, 6, 10.0)
        .comm_range(15.0)
        .communication(CommunicationModel::unordered_random_delay())
        .memory(0, "greet", "Hello distributed world")
        .algorithm(AlgorithmBinding::node::<Flood>().param(Flood::INFORMATION_KEY, "greet"))
        .algorithm(AlgorithmBinding::node::<MinIdElection>())
        .build()?;

    println!(
        "  {} nodes, {} edges, average degree {:.2}",
        network.len(),
        network.edge_count(),
        network.avg_degree()
    );

    let recorder = EventRecorder::new();
    let mut sim = Simulation::new(network);
    sim.add_observer(Box::new(recorder.clone()));

    let steps = sim.run(0)?;
    println!(
        "  {} steps, {} messages sent, {} delivered",
        steps,
        recorder.count("message_sent"),
        recorder.count("message_delivered")
    );
    println!();

    let network = sim.network();
    for node in network.nodes() {
        let greeting = node.memory.get("greet").and_then(|v| v.as_str()).unwrap_or("-");
        println!(
            "    {:>4}  {:<8}  {}",
            node.id(),
            node.status().unwrap_or("-"),
            greeting
        );
    }
    println!();
    println!("  ✓ Simulation halted.");
    Ok(())
}
