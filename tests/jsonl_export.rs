mod common;

use metvan_gen::model::*;
use metvan_gen::{flush_to_jsonl, generate_world};

use common::{config, read_lines};

#[test]
fn export_writes_every_table() {
    let graph = generate_world(config(42, 5)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    flush_to_jsonl(&graph, dir.path()).unwrap();

    let nodes = read_lines(&dir.path().join("nodes.jsonl"));
    assert_eq!(nodes.len(), graph.nodes.len());
    let first: NodeId = serde_json::from_str(&nodes[0]).unwrap();
    assert_eq!(first, graph.nodes[&first.value]);

    let connections = read_lines(&dir.path().join("connections.jsonl"));
    for line in &connections {
        let c: Connection = serde_json::from_str(line).unwrap();
        assert!(graph.connections(c.from_node_id).iter().any(|e| e.same_edge(&c)));
    }

    let stages: Vec<StageReport> = read_lines(&dir.path().join("stages.jsonl"))
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let order: Vec<GenStage> = stages.iter().map(|s| s.stage).collect();
    assert_eq!(order, GenStage::ALL.to_vec());
}

#[test]
fn export_is_byte_identical_for_the_same_seed() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    flush_to_jsonl(&generate_world(config(77, 6)).unwrap(), a.path()).unwrap();
    flush_to_jsonl(&generate_world(config(77, 6)).unwrap(), b.path()).unwrap();
    for file in ["nodes", "biomes", "connections", "rooms", "stages"] {
        let name = format!("{file}.jsonl");
        assert_eq!(
            std::fs::read(a.path().join(&name)).unwrap(),
            std::fs::read(b.path().join(&name)).unwrap(),
            "{name} differs"
        );
    }
}
