use serde::{Deserialize, Serialize};

use super::polarity::Polarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Bidirectional,
    OneWay,
    Drop,
    Vent,
    CrumbleFloor,
    Teleporter,
    ConditionalGate,
}

impl ConnectionType {
    /// Whether the edge may be walked from `to` back to `from`.
    pub fn is_reversible(self) -> bool {
        matches!(
            self,
            ConnectionType::Bidirectional | ConnectionType::Teleporter | ConnectionType::ConditionalGate
        )
    }

    /// Edge kinds that carry a polarity requirement when baked.
    pub fn is_gated(self) -> bool {
        matches!(self, ConnectionType::ConditionalGate | ConnectionType::Vent)
    }
}

/// Directed edge record stored in the source node's adjacency buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from_node_id: u32,
    pub to_node_id: u32,
    pub connection_type: ConnectionType,
    pub required_polarity: Polarity,
    /// Always ≥ `MIN_TRAVERSAL_COST`.
    pub traversal_cost: f32,
    pub is_active: bool,
    pub is_discovered: bool,
}

impl Connection {
    pub const MIN_TRAVERSAL_COST: f32 = 0.1;

    pub fn new(
        from_node_id: u32,
        to_node_id: u32,
        connection_type: ConnectionType,
        required_polarity: Polarity,
        traversal_cost: f32,
    ) -> Self {
        Self {
            from_node_id,
            to_node_id,
            connection_type,
            required_polarity,
            traversal_cost: clamp_cost(traversal_cost),
            is_active: true,
            is_discovered: false,
        }
    }

    /// The same edge walked the other way.
    pub fn reversed(&self) -> Self {
        Self {
            from_node_id: self.to_node_id,
            to_node_id: self.from_node_id,
            ..*self
        }
    }

    /// Value identity used for deduplication: endpoints, type and polarity.
    pub fn same_edge(&self, other: &Connection) -> bool {
        self.from_node_id == other.from_node_id
            && self.to_node_id == other.to_node_id
            && self.connection_type == other.connection_type
            && self.required_polarity == other.required_polarity
    }

    /// Whether a traveller at `from` holding `available` polarity may walk to `to`.
    pub fn can_traverse(&self, from: u32, to: u32, available: Polarity) -> bool {
        if !self.is_active {
            return false;
        }
        let forward = from == self.from_node_id && to == self.to_node_id;
        let backward = from == self.to_node_id && to == self.from_node_id;
        let direction_ok = forward || (backward && self.connection_type.is_reversible());
        direction_ok && available.satisfies(self.required_polarity)
    }

    pub fn other_end(&self, node: u32) -> Option<u32> {
        if node == self.from_node_id {
            Some(self.to_node_id)
        } else if node == self.to_node_id {
            Some(self.from_node_id)
        } else {
            None
        }
    }
}

/// Non-finite costs collapse to the floor.
fn clamp_cost(cost: f32) -> f32 {
    if cost.is_finite() {
        cost.max(Connection::MIN_TRAVERSAL_COST)
    } else {
        Connection::MIN_TRAVERSAL_COST
    }
}

/// Authored/baked edge awaiting conversion into adjacency buffers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakedEdge {
    pub from: u32,
    pub to: u32,
    pub connection_type: ConnectionType,
    pub required_polarity: Polarity,
    pub traversal_cost: f32,
}
