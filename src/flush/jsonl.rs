use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::{Biome, RoomData, RoomLayout, WorldGraph};

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[derive(Serialize)]
struct BiomeRow<'a> {
    node_id: u32,
    #[serde(flatten)]
    biome: &'a Biome,
}

#[derive(Serialize)]
struct RoomRow<'a> {
    #[serde(flatten)]
    room: &'a RoomData,
    layout: Option<&'a RoomLayout>,
}

/// Flush the generated world to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 5 files:
/// - `nodes.jsonl` — one NodeId per line, in id order
/// - `biomes.jsonl` — district id plus its resolved biome
/// - `connections.jsonl` — every adjacency-buffer entry, grouped by source node
/// - `rooms.jsonl` — room bounds and type with the generated layout inline
/// - `stages.jsonl` — completed stage reports in pipeline order
pub fn flush_to_jsonl(graph: &WorldGraph, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("nodes.jsonl"), graph.nodes.values())?;
    write_jsonl(
        &output_dir.join("biomes.jsonl"),
        graph
            .biomes
            .iter()
            .map(|(node_id, biome)| BiomeRow {
                node_id: *node_id,
                biome,
            }),
    )?;
    write_jsonl(
        &output_dir.join("connections.jsonl"),
        graph.adjacency.values().flatten(),
    )?;
    write_jsonl(
        &output_dir.join("rooms.jsonl"),
        graph.rooms.values().map(|room| RoomRow {
            room,
            layout: graph.room_layouts.get(&room.node_id),
        }),
    )?;
    write_jsonl(&output_dir.join("stages.jsonl"), graph.completed.values())?;

    Ok(())
}
