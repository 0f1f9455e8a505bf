//! Minimum-id leader election by wave extinction.
//!
//! Every node starts a wave carrying its own value. A node that hears a
//! smaller wave joins it: it records the sender as parent and forwards the
//! wave. Larger waves are ignored, so only the wave of the smallest value
//! can collect a reply from every node. Replies flow back along the parent
//! links as echoes; the node whose own wave echoes back from all of its
//! neighbours becomes LEADER. Every other node ends PRUNED.

use serde_json::{json, Value};

use crate::algorithm::{Action, DispatchTable, InitContext, NodeAlgorithm, NodeContext, Params};
use crate::error::{SimError, SimResult};
use crate::message::Message;
use crate::node::NodeId;
use crate::restriction::{
    BidirectionalLinks, Connectivity, InitialDistinctValues, Restriction, TotalReliability,
};

crate::status_values! {
    pub enum ElectionStatus {
        Candidate => "CANDIDATE",
        Pruned => "PRUNED",
        Leader => "LEADER",
    }
}

pub const WAVE: &str = "wave";
pub const ECHO: &str = "echo";

// Node memory keys.
const MEM_WAVE: &str = "election_wave";
const MEM_PARENT: &str = "election_parent";
const MEM_PENDING: &str = "election_pending";

const RESTRICTIONS: &[&dyn Restriction] = &[
    &BidirectionalLinks,
    &TotalReliability,
    &Connectivity,
    &InitialDistinctValues,
];

#[derive(Debug, Clone, Default)]
pub struct MinIdElection;

/// Per-node election state, kept in node memory between handler calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WaveState {
    wave: u64,
    parent: Option<NodeId>,
    pending: u64,
}

impl WaveState {
    fn load(ctx: &NodeContext<'_>) -> SimResult<Self> {
        let memory = ctx.memory()?;
        let read = |key: &str| {
            memory.get(key).and_then(Value::as_u64).ok_or_else(|| SimError::InvalidParam {
                algorithm: MinIdElection::NAME.to_string(),
                param: key.to_string(),
                reason: format!("missing from the memory of {}", ctx.id()),
            })
        };
        Ok(WaveState {
            wave: read(MEM_WAVE)?,
            pending: read(MEM_PENDING)?,
            parent: memory.get(MEM_PARENT).and_then(Value::as_u64).map(NodeId::new),
        })
    }

    fn store(self, ctx: &mut NodeContext<'_>) -> SimResult<()> {
        let memory = ctx.memory_mut()?;
        memory.insert(MEM_WAVE.into(), json!(self.wave));
        memory.insert(MEM_PENDING.into(), json!(self.pending));
        memory.insert(MEM_PARENT.into(), json!(self.parent.map(NodeId::raw)));
        Ok(())
    }
}

impl MinIdElection {
    fn spontaneously_candidate(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
        let state = WaveState::load(ctx)?;
        if state.pending == 0 {
            return ctx.set_status(ElectionStatus::Leader);
        }
        ctx.send(Message::new(WAVE, json!(state.wave)))
    }

    fn receiving(&mut self, ctx: &mut NodeContext<'_>, msg: Message) -> SimResult<()> {
        let Some(value) = msg.data.as_u64() else {
            return Ok(());
        };
        let mut state = WaveState::load(ctx)?;

        match msg.header.as_str() {
            WAVE if value < state.wave => {
                let rest: Vec<NodeId> = ctx
                    .neighbors()
                    .into_iter()
                    .filter(|n| Some(*n) != msg.source)
                    .collect();
                state = WaveState {
                    wave: value,
                    parent: msg.source,
                    pending: rest.len() as u64,
                };
                state.store(ctx)?;
                ctx.set_status(ElectionStatus::Pruned)?;
                if rest.is_empty() {
                    self.complete(ctx, state)
                } else {
                    ctx.send(Message::new(WAVE, json!(value)).to(rest))
                }
            }
            WAVE | ECHO if value == state.wave => {
                state.pending = state.pending.saturating_sub(1);
                state.store(ctx)?;
                if state.pending == 0 {
                    self.complete(ctx, state)
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Every neighbour answered the wave this node is part of.
    fn complete(&mut self, ctx: &mut NodeContext<'_>, state: WaveState) -> SimResult<()> {
        match state.parent {
            None => ctx.set_status(ElectionStatus::Leader),
            Some(parent) => ctx.send(Message::new(ECHO, json!(state.wave)).to(parent)),
        }
    }

    fn ignore(&mut self, _ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
        Ok(())
    }
}

impl NodeAlgorithm for MinIdElection {
    type Status = ElectionStatus;
    const NAME: &'static str = "MinIdElection";

    fn from_params(_params: &Params) -> SimResult<Self> {
        Ok(MinIdElection)
    }

    fn handlers() -> DispatchTable<Self> {
        DispatchTable::new()
            .on(
                ElectionStatus::Candidate,
                Action::Spontaneously,
                MinIdElection::spontaneously_candidate,
            )
            .on_each(
                &[ElectionStatus::Candidate, ElectionStatus::Pruned],
                Action::Receiving,
                MinIdElection::receiving,
            )
            .on_each(
                &[ElectionStatus::Pruned, ElectionStatus::Leader],
                Action::Default,
                MinIdElection::ignore,
            )
    }

    fn idle_status() -> ElectionStatus {
        ElectionStatus::Candidate
    }

    fn restrictions(&self) -> &'static [&'static dyn Restriction] {
        RESTRICTIONS
    }

    /// Every node is an initiator with its distinct value as wave.
    fn initializer(&mut self, ctx: &mut InitContext<'_>) -> SimResult<()> {
        ctx.apply_restrictions()?;
        for id in ctx.network().node_ids() {
            let degree = ctx.network().degree(id) as u64;
            let node = ctx.network_mut().node_mut(id)?;
            let own = node
                .memory
                .get(InitialDistinctValues::KEY)
                .and_then(Value::as_u64)
                .unwrap_or_else(|| id.raw());
            node.memory.insert(MEM_WAVE.into(), json!(own));
            node.memory.insert(MEM_PARENT.into(), Value::Null);
            node.memory.insert(MEM_PENDING.into(), json!(degree));
            ctx.set_status(id, ElectionStatus::Candidate)?;
            ctx.push_initialization(id)?;
        }
        Ok(())
    }

    fn s_init() -> &'static [ElectionStatus] {
        &[ElectionStatus::Candidate]
    }

    fn s_term() -> &'static [ElectionStatus] {
        &[ElectionStatus::Leader, ElectionStatus::Pruned]
    }
}
