#![allow(dead_code)]

use metvan_gen::model::*;

pub fn config(seed: u32, districts: u32) -> WorldConfiguration {
    WorldConfiguration::new(seed, WorldSize::new(50, 50), districts)
}

pub fn district_coords(graph: &WorldGraph) -> Vec<GridCoord> {
    graph
        .districts
        .keys()
        .filter_map(|id| graph.coordinates(*id))
        .collect()
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
