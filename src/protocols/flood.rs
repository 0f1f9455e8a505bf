//! Flooding broadcast of one piece of information.
//!
//! The node holding `information_key` in its memory sends the value to
//! every neighbour. Every other node stores the first copy it receives and
//! forwards it to all neighbours except the one it came from.

use serde_json::Value;

use crate::algorithm::{Action, DispatchTable, InitContext, NodeAlgorithm, NodeContext, ParamSpec, Params};
use crate::error::SimResult;
use crate::message::Message;
use crate::node::NodeId;
use crate::restriction::{
    BidirectionalLinks, Connectivity, Restriction, TotalReliability, UniqueInitiator,
};

crate::status_values! {
    pub enum FloodStatus {
        Initiator => "INITIATOR",
        Idle => "IDLE",
        Done => "DONE",
    }
}

/// Header of the messages carrying the information.
pub const INFORMATION: &str = "Information";

const RESTRICTIONS: &[&dyn Restriction] = &[
    &BidirectionalLinks,
    &TotalReliability,
    &Connectivity,
    &UniqueInitiator,
];

#[derive(Debug, Clone)]
pub struct Flood {
    information_key: String,
}

impl Flood {
    pub const INFORMATION_KEY: &'static str = "information_key";

    pub fn new(information_key: impl Into<String>) -> Self {
        Flood {
            information_key: information_key.into(),
        }
    }

    pub fn information_key(&self) -> &str {
        &self.information_key
    }

    fn spontaneously_initiator(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
        let data = ctx
            .memory()?
            .get(&self.information_key)
            .cloned()
            .unwrap_or(Value::Null);
        let neighbours = ctx.neighbors();
        ctx.send(Message::new(INFORMATION, data).to(neighbours))?;
        ctx.set_status(FloodStatus::Done)
    }

    fn receiving_idle(&mut self, ctx: &mut NodeContext<'_>, msg: Message) -> SimResult<()> {
        if msg.header == INFORMATION {
            ctx.memory_mut()?
                .insert(self.information_key.clone(), msg.data.clone());
            let rest: Vec<NodeId> = ctx
                .neighbors()
                .into_iter()
                .filter(|n| Some(*n) != msg.source)
                .collect();
            if !rest.is_empty() {
                ctx.send(Message::new(INFORMATION, msg.data).to(rest))?;
            }
        }
        ctx.set_status(FloodStatus::Done)
    }

    fn ignore(&mut self, _ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
        Ok(())
    }
}

impl NodeAlgorithm for Flood {
    type Status = FloodStatus;
    const NAME: &'static str = "Flood";

    fn param_spec() -> SimResult<ParamSpec> {
        Ok(ParamSpec::new().required(Self::INFORMATION_KEY))
    }

    fn from_params(params: &Params) -> SimResult<Self> {
        Ok(Flood::new(params.get_as::<String>(Self::NAME, Self::INFORMATION_KEY)?))
    }

    fn handlers() -> DispatchTable<Self> {
        DispatchTable::new()
            .on(FloodStatus::Initiator, Action::Spontaneously, Flood::spontaneously_initiator)
            .on(FloodStatus::Idle, Action::Receiving, Flood::receiving_idle)
            .on(FloodStatus::Done, Action::Default, Flood::ignore)
    }

    fn idle_status() -> FloodStatus {
        FloodStatus::Idle
    }

    fn restrictions(&self) -> &'static [&'static dyn Restriction] {
        RESTRICTIONS
    }

    /// Nodes already holding the information become initiators.
    fn initializer(&mut self, ctx: &mut InitContext<'_>) -> SimResult<()> {
        ctx.apply_restrictions()?;
        for id in ctx.network().node_ids() {
            if ctx.network().node(id)?.memory.contains_key(&self.information_key) {
                ctx.set_status(id, FloodStatus::Initiator)?;
                ctx.push_initialization(id)?;
            } else {
                ctx.set_status(id, FloodStatus::Idle)?;
            }
        }
        Ok(())
    }

    fn s_init() -> &'static [FloodStatus] {
        &[FloodStatus::Initiator, FloodStatus::Idle]
    }

    fn s_term() -> &'static [FloodStatus] {
        &[FloodStatus::Done]
    }
}
