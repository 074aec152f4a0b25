//! C1 — process-wide (really: run-wide) assignment of innovation numbers.
//!
//! The source keyed this off a singleton counter server; per the scoped-
//! ownership redesign in spec.md §9 this is instead an explicit value owned
//! by whatever drives one NEAT run (`evolution.rs`), passed by `&mut` into
//! every genome operator that introduces structure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node identifier. A thin newtype rather than a bare `u64` so that node
/// ids and innovation ids (both counters, easy to mix up) cannot be swapped
/// at a call site without a type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Maps structural `(source, target)` edges to the innovation number that
/// first minted them, plus the monotonic node-id counter. Never pruned during
/// a run: two genomes that independently mutate in the same structural way
/// must converge on the same innovation number so crossover can match them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationRegistry {
    connection_innovations: HashMap<(NodeId, NodeId), u64>,
    next_innovation: u64,
    next_node: u64,
    first_hidden_id: u64,
}

/// Opaque, serializable snapshot of an [`InnovationRegistry`], for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationSnapshot {
    connection_innovations: HashMap<(NodeId, NodeId), u64>,
    next_innovation: u64,
    next_node: u64,
    first_hidden_id: u64,
}

impl InnovationRegistry {
    /// Creates a registry for a run whose genomes have `first_hidden_id` as
    /// the first node id not already consumed by inputs/bias/outputs.
    pub fn new(first_hidden_id: u64) -> Self {
        InnovationRegistry {
            connection_innovations: HashMap::new(),
            next_innovation: 1,
            next_node: first_hidden_id,
            first_hidden_id,
        }
    }

    /// Returns the innovation number for the structural edge `(from, to)`,
    /// assigning a fresh one on first sight. Structurally identical
    /// mutations occurring anywhere in the same generation (or, since the
    /// map is never pruned, anywhere in the run) receive the same id.
    pub fn innovation_for(&mut self, from: NodeId, to: NodeId) -> u64 {
        if let Some(&id) = self.connection_innovations.get(&(from, to)) {
            return id;
        }
        let id = self.next_innovation;
        self.next_innovation += 1;
        self.connection_innovations.insert((from, to), id);
        id
    }

    /// Allocates a new hidden node id.
    pub fn fresh_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    /// Clears the mapping and resets both counters to their initial values,
    /// as if the registry had just been constructed.
    pub fn reset(&mut self) {
        self.connection_innovations.clear();
        self.next_innovation = 1;
        self.next_node = self.first_hidden_id;
    }

    pub fn snapshot(&self) -> InnovationSnapshot {
        InnovationSnapshot {
            connection_innovations: self.connection_innovations.clone(),
            next_innovation: self.next_innovation,
            next_node: self.next_node,
            first_hidden_id: self.first_hidden_id,
        }
    }

    pub fn restore(snapshot: InnovationSnapshot) -> Self {
        InnovationRegistry {
            connection_innovations: snapshot.connection_innovations,
            next_innovation: snapshot.next_innovation,
            next_node: snapshot.next_node,
            first_hidden_id: snapshot.first_hidden_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_query_returns_same_id() {
        let mut reg = InnovationRegistry::new(3);
        let a = reg.innovation_for(NodeId(4), NodeId(7));
        let b = reg.innovation_for(NodeId(4), NodeId(7));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_pairs_get_distinct_ids() {
        let mut reg = InnovationRegistry::new(3);
        let a = reg.innovation_for(NodeId(0), NodeId(3));
        let b = reg.innovation_for(NodeId(1), NodeId(3));
        assert_ne!(a, b);
    }

    #[test]
    fn reset_restarts_counters() {
        let mut reg = InnovationRegistry::new(3);
        reg.innovation_for(NodeId(0), NodeId(3));
        reg.fresh_node();
        reg.reset();
        assert_eq!(reg.innovation_for(NodeId(1), NodeId(2)), 1);
        assert_eq!(reg.fresh_node(), NodeId(3));
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut reg = InnovationRegistry::new(3);
        reg.innovation_for(NodeId(0), NodeId(3));
        let h = reg.fresh_node();
        let snap = reg.snapshot();
        let restored = InnovationRegistry::restore(snap);
        let mut restored = restored;
        assert_eq!(restored.innovation_for(NodeId(0), NodeId(3)), 1);
        assert_eq!(restored.fresh_node(), NodeId(h.0 + 1));
    }
}
