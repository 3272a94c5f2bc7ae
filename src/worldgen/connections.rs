use crate::error::GenError;
use crate::model::{BakedEdge, Connection, ConnectionType, GenStage, StageReport, WorldGraph};

/// Convert the baked edge list into per-node adjacency buffers.
///
/// Each edge lands in its source's buffer; bidirectional edges are mirrored into the
/// destination's buffer. Value-equal duplicates are dropped, and edges with an unknown
/// endpoint are skipped. Runs once per world.
pub fn build_connections(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::ConnectionGraph)? {
        return Ok(None);
    }

    let edges = std::mem::take(&mut graph.baked_edges);
    let mut skipped = 0usize;
    for edge in &edges {
        if !graph.nodes.contains_key(&edge.from) || !graph.nodes.contains_key(&edge.to) {
            tracing::warn!(
                from = edge.from,
                to = edge.to,
                "skipping baked edge with a missing endpoint"
            );
            skipped += 1;
            continue;
        }
        add_edge(graph, edge);
    }
    graph.baked_edges = edges;

    if skipped > 0 {
        tracing::debug!(skipped, "baked edges skipped");
    }
    let nodes = graph.adjacency.values().filter(|v| !v.is_empty()).count();
    let edges = graph.connection_count();
    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::ConnectionGraph,
        nodes,
        edges,
    ))))
}

fn add_edge(graph: &mut WorldGraph, edge: &BakedEdge) {
    let forward = Connection::new(
        edge.from,
        edge.to,
        edge.connection_type,
        edge.required_polarity,
        edge.traversal_cost,
    );
    push_unique(graph, forward);
    if edge.connection_type == ConnectionType::Bidirectional {
        push_unique(graph, forward.reversed());
    }
}

fn push_unique(graph: &mut WorldGraph, connection: Connection) {
    let buffer = graph.adjacency.entry(connection.from_node_id).or_default();
    if !buffer.iter().any(|c| c.same_edge(&connection)) {
        buffer.push(connection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Polarity, WorldConfiguration};

    fn graph_with(edges: Vec<BakedEdge>) -> WorldGraph {
        let mut graph = WorldGraph::empty(WorldConfiguration::default());
        for i in 0..4 {
            graph.add_district(i == 0);
        }
        graph.baked_edges = edges;
        graph.finish_stage(StageReport::new(GenStage::DistrictLayout, 4, 0));
        graph
    }

    fn edge(from: u32, to: u32, connection_type: ConnectionType) -> BakedEdge {
        BakedEdge {
            from,
            to,
            connection_type,
            required_polarity: Polarity::NONE,
            traversal_cost: 1.5,
        }
    }

    #[test]
    fn bidirectional_edges_are_mirrored() {
        let mut graph = graph_with(vec![edge(1, 2, ConnectionType::Bidirectional)]);
        build_connections(&mut graph).unwrap();
        assert_eq!(graph.connections(1).len(), 1);
        let back = graph.connections(2)[0];
        assert_eq!((back.from_node_id, back.to_node_id), (2, 1));
        assert_eq!(back.traversal_cost, 1.5);
    }

    #[test]
    fn one_way_edges_are_not_mirrored() {
        let mut graph = graph_with(vec![edge(1, 3, ConnectionType::OneWay)]);
        build_connections(&mut graph).unwrap();
        assert_eq!(graph.connections(1).len(), 1);
        assert!(graph.connections(3).is_empty());
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut graph = graph_with(vec![
            edge(1, 2, ConnectionType::Bidirectional),
            edge(1, 2, ConnectionType::Bidirectional),
            edge(2, 1, ConnectionType::Bidirectional),
        ]);
        build_connections(&mut graph).unwrap();
        assert_eq!(graph.connections(1).len(), 1);
        assert_eq!(graph.connections(2).len(), 1);
    }

    #[test]
    fn missing_endpoints_are_skipped() {
        let mut graph = graph_with(vec![
            edge(1, 99, ConnectionType::Bidirectional),
            edge(3, 4, ConnectionType::Bidirectional),
        ]);
        let report = build_connections(&mut graph).unwrap().unwrap();
        assert!(graph.connections(1).is_empty());
        assert_eq!(report.edges, 2);
    }

    #[test]
    fn zero_edges_is_fine() {
        let mut graph = graph_with(Vec::new());
        let report = build_connections(&mut graph).unwrap().unwrap();
        assert_eq!(report.edges, 0);
        assert!(graph.is_complete(GenStage::ConnectionGraph));
    }

    #[test]
    fn rerun_is_a_no_op() {
        let mut graph = graph_with(vec![edge(1, 2, ConnectionType::Bidirectional)]);
        build_connections(&mut graph).unwrap();
        assert_eq!(build_connections(&mut graph).unwrap(), None);
        assert_eq!(graph.connection_count(), 2);
    }

    #[test]
    fn requires_layout() {
        let mut graph = WorldGraph::empty(WorldConfiguration::default());
        assert!(matches!(
            build_connections(&mut graph),
            Err(GenError::StageOutOfOrder { .. })
        ));
    }
}
