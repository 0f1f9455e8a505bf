//! # distsim: step-synchronous distributed algorithm testbed
//!
//! A simulation kernel for prototyping, running and verifying distributed
//! message-passing algorithms. Nodes talk only through mailboxes; a
//! configurable transport adds delay, loss and reordering; restrictions
//! check that an algorithm's assumptions hold on the network it runs on.
//! Single-threaded and seeded, so every run is reproducible.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │              Simulation               │ ← step budget, algorithm cursor
//! │  ┌─────────────────────────────────┐  │
//! │  │            Network              │  │ ← arena of nodes + edges
//! │  │  ┌───────────┐  ┌────────────┐  │  │
//! │  │  │   Nodes   │  │ Transport  │  │  │ ← mailboxes / delay, loss, order
//! │  │  └───────────┘  └────────────┘  │  │
//! │  │  ┌───────────┐  ┌────────────┐  │  │
//! │  │  │ Algorithms│  │Restrictions│  │  │ ← dispatch + alarms / preconditions
//! │  │  └───────────┘  └────────────┘  │  │
//! │  └─────────────────────────────────┘  │
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use distsim::{AlgorithmBinding, NetworkBuilder, Simulation};
//! use distsim::protocols::Flood;
//!
//! let network = NetworkBuilder::new()
//!     .grid(4, 4, 10.0)
//!     .comm_range(15.0)
//!     .memory(0, "greet", "hello")
//!     .algorithm(AlgorithmBinding::node::<Flood>().param("information_key", "greet"))
//!     .build()
//!     .unwrap();
//!
//! let mut sim = Simulation::new(network);
//! sim.run(0).unwrap();
//! assert!(sim.network().nodes().all(|n| n.memory.contains_key("greet")));
//! ```

pub mod algorithm;
pub mod builder;
pub mod error;
pub mod message;
pub mod network;
pub mod node;
pub mod observer;
pub mod protocols;
pub mod restriction;
pub mod simulation;

// Re-exports for convenience.
pub use algorithm::{
    Action, Algorithm, AlgorithmBinding, CentralizedRunner, DispatchTable, InitContext,
    NetworkAlgorithm, NodeAlgorithm, NodeAlgorithmRunner, NodeContext, StatusValue,
};
pub use builder::NetworkBuilder;
pub use error::{SimError, SimResult};
pub use message::{Destination, Message, MessageId, MetaHeader};
pub use network::{CommunicationModel, Network, NetworkConfig, Position};
pub use node::{Node, NodeId};
pub use observer::{EventRecorder, Observer, SimEvent};
pub use restriction::Restriction;
pub use simulation::{Simulation, SimulationConfig};
